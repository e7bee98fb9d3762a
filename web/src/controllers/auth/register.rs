use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use snippetbox_db::entities::user::{RegisterUser, User};
use snippetbox_ui::view_engine::{View, ViewEngine};

use crate::{
    error::Error,
    middlewares::flash::Flash,
    state::AppState,
    views::{FieldErrors, Layout, auth::register::RegisterView},
};

pub struct RegisterController;

impl RegisterController {
    pub fn router() -> Router<AppState> {
        Router::new().route(
            "/auth/register",
            get(RegisterController::index).post(RegisterController::register),
        )
    }

    pub async fn index(v: ViewEngine<View>, layout: Layout) -> RegisterView {
        RegisterView::Form(v, layout, RegisterUser::default(), FieldErrors::new())
    }

    pub async fn register(
        v: ViewEngine<View>,
        layout: Layout,
        flash: Flash,
        State(app_state): State<AppState>,
        Form(form): Form<RegisterUser>,
    ) -> Result<Response, Error> {
        let errors = match User::create(form.clone(), &app_state.db_pool).await {
            Ok(user) => {
                tracing::info!("registered user {}", user.id);
                flash
                    .success("Your signup was successful. Please log in.")
                    .await?;

                return Ok(Redirect::to("/auth/login").into_response());
            }
            Err(snippetbox_db::Error::ValidationError(errors)) => FieldErrors::from(&errors),
            Err(err) if err.is_unique_violation_on("email") => {
                let mut errors = FieldErrors::new();
                errors.add("email", "Email address is already in use");
                errors
            }
            Err(err) => return Err(err.into()),
        };

        Ok(RegisterView::Form(v, layout, form, errors).into_response())
    }
}
