use axum::response::{IntoResponse, Response};
use serde_json::json;
use snippetbox_db::entities::snippet::{Snippet, SnippetChangeset};
use snippetbox_ui::view_engine::{View, ViewEngine};

use crate::{
    format,
    views::{FieldErrors, Layout, form_context},
};

pub enum SnippetView {
    Show(ViewEngine<View>, Layout, Snippet),
    New(ViewEngine<View>, Layout, SnippetChangeset, FieldErrors),
}

impl IntoResponse for SnippetView {
    fn into_response(self) -> Response {
        match self {
            SnippetView::Show(ViewEngine(v), layout, snippet) => format::render()
                .view(
                    &v,
                    "snippets/show.html",
                    layout.with(json!({ "snippet": snippet })),
                )
                .into_response(),
            SnippetView::New(ViewEngine(v), layout, form, errors) => format::render()
                .status(errors.status())
                .view(
                    &v,
                    "snippets/new.html",
                    form_context(layout, json!(form), errors),
                )
                .into_response(),
        }
    }
}
