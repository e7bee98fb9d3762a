//! Response builders shared by the views.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use snippetbox_ui::view_engine::ViewRenderer;

use crate::error::Error;

pub struct RenderBuilder {
    status: StatusCode,
}

/// Starts a `200 OK` HTML response.
pub fn render() -> RenderBuilder {
    RenderBuilder {
        status: StatusCode::OK,
    }
}

impl RenderBuilder {
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Renders the template `key` with `data`.
    ///
    /// # Errors
    ///
    /// Fails when the template is missing or cannot be rendered.
    pub fn view<V, S>(self, v: &V, key: &str, data: S) -> Result<Response, Error>
    where
        V: ViewRenderer,
        S: Serialize,
    {
        let html = v.render(key, data)?;

        Ok((self.status, Html(html)).into_response())
    }
}
