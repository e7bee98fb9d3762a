use axum::response::{IntoResponse, Response};
use serde_json::json;
use snippetbox_db::entities::user::RegisterUser;
use snippetbox_ui::view_engine::{View, ViewEngine};

use crate::{
    format,
    views::{FieldErrors, Layout, form_context},
};

pub enum RegisterView {
    Form(ViewEngine<View>, Layout, RegisterUser, FieldErrors),
}

impl IntoResponse for RegisterView {
    fn into_response(self) -> Response {
        match self {
            RegisterView::Form(ViewEngine(v), layout, form, errors) => format::render()
                .status(errors.status())
                .view(
                    &v,
                    "auth/register.html",
                    form_context(
                        layout,
                        json!({ "name": form.name, "email": form.email }),
                        errors,
                    ),
                )
                .into_response(),
        }
    }
}
