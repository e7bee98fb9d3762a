use std::collections::BTreeMap;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use chrono::{Datelike, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use snippetbox_db::ValidationErrors;

use crate::{
    middlewares::{
        auth::AuthSession,
        flash::{FlashMessage, IncomingFlashes},
    },
    state::AppState,
};

pub mod auth;
pub mod home;
pub mod snippets;

/// Data every page template gets: the base layout shows the app name, the
/// navigation for the current visitor and any pending flash messages.
///
/// Extracting it consumes the flash messages.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub app_name: String,
    pub is_authenticated: bool,
    pub current_year: i32,
    pub flashes: Vec<FlashMessage>,
}

impl Layout {
    /// Merges the page specific `data` into the layout context.
    pub fn with(self, data: Value) -> Value {
        let mut context = json!({
            "app_name": self.app_name,
            "is_authenticated": self.is_authenticated,
            "current_year": self.current_year,
            "flashes": self.flashes,
        });

        if let (Value::Object(context), Value::Object(data)) = (&mut context, data) {
            context.extend(data);
        }

        context
    }
}

impl<S> FromRequestParts<S> for Layout
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let auth_session = AuthSession::from_request_parts(parts, state).await?;
        let IncomingFlashes { flashes } = IncomingFlashes::from_request_parts(parts, state).await?;

        Ok(Self {
            app_name: app_state.config.app.name,
            is_authenticated: auth_session.user.is_some(),
            current_year: Utc::now().year(),
            flashes,
        })
    }
}

/// Messages to show next to form fields, keyed by field name.
///
/// Messages that belong to no field in particular (e.g. a failed login) are
/// kept apart in `non_field`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// The status a form page is rendered with.
    pub fn status(&self) -> StatusCode {
        if self.is_empty() {
            StatusCode::OK
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }

    fn into_context(self) -> Value {
        json!({ "errors": self.fields, "non_field_errors": self.non_field })
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut field_errors = Self::new();

        for (field, errors) in errors.field_errors() {
            for error in errors {
                let message = error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string);
                field_errors.add(&field, message);
            }
        }

        field_errors
    }
}

/// Builds the context of a form page from the submitted `form` values.
pub(crate) fn form_context(layout: Layout, form: Value, errors: FieldErrors) -> Value {
    let mut data = errors.into_context();
    if let Value::Object(ref mut data) = data {
        data.insert("form".to_string(), form);
    }

    layout.with(data)
}
