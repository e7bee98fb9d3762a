use axum::response::{IntoResponse, Response};
use serde_json::json;
use snippetbox_db::entities::user::UserCredentials;
use snippetbox_ui::view_engine::{View, ViewEngine};

use crate::{
    format,
    views::{FieldErrors, Layout, form_context},
};

pub enum LoginView {
    Form(ViewEngine<View>, Layout, UserCredentials, FieldErrors),
}

impl IntoResponse for LoginView {
    fn into_response(self) -> Response {
        match self {
            LoginView::Form(ViewEngine(v), layout, creds, errors) => {
                let status = errors.status();
                // The password is never sent back.
                let mut context = form_context(layout, json!({ "email": creds.email }), errors);
                context["next"] = json!(creds.next);

                format::render()
                    .status(status)
                    .view(&v, "auth/login.html", context)
                    .into_response()
            }
        }
    }
}
