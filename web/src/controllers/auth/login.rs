use axum::{
    Form, Router,
    extract::Query,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use snippetbox_db::{Validate, entities::user::UserCredentials};
use snippetbox_ui::view_engine::{View, ViewEngine};

use crate::{
    error::Error,
    middlewares::auth::AuthSession,
    state::AppState,
    views::{FieldErrors, Layout, auth::login::LoginView},
};

/// Where to go after logging in when the form does not say.
pub const DEFAULT_REDIRECT: &str = "/snippets/new";

// This allows us to extract the "next" field from the query string. We use this
// to redirect after log in.
#[derive(Debug, Deserialize)]
pub struct NextUrl {
    next: Option<String>,
}

pub struct LoginController;

impl LoginController {
    pub fn router() -> Router<AppState> {
        Router::new().route(
            "/auth/login",
            get(LoginController::index).post(LoginController::login),
        )
    }

    pub async fn index(
        v: ViewEngine<View>,
        layout: Layout,
        Query(NextUrl { next }): Query<NextUrl>,
    ) -> LoginView {
        let creds = UserCredentials {
            next: next.filter(|next| is_local_path(next)),
            ..Default::default()
        };

        LoginView::Form(v, layout, creds, FieldErrors::new())
    }

    pub async fn login(
        v: ViewEngine<View>,
        layout: Layout,
        mut auth_session: AuthSession,
        Form(creds): Form<UserCredentials>,
    ) -> Result<Response, Error> {
        if let Err(errors) = creds.validate() {
            return Ok(LoginView::Form(v, layout, creds, FieldErrors::from(&errors)).into_response());
        }

        let user = match auth_session.authenticate(creds.clone()).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::debug!("rejected login attempt");
                let mut errors = FieldErrors::new();
                errors.add_non_field("Email or password is incorrect");

                return Ok(LoginView::Form(v, layout, creds, errors).into_response());
            }
            Err(e) => return Err(Error::Unexpected(e.into())),
        };

        // Cycles the session token before storing the user id.
        auth_session
            .login(&user)
            .await
            .map_err(|e| Error::Unexpected(e.into()))?;

        let next = creds
            .next
            .as_deref()
            .filter(|next| is_local_path(next))
            .unwrap_or(DEFAULT_REDIRECT);

        Ok(Redirect::to(next).into_response())
    }
}

/// Whether `next` is a path on this site. Scheme-relative `//host` and
/// `/\host` are not.
fn is_local_path(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\")
}
