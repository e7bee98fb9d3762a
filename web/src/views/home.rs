use axum::response::{IntoResponse, Response};
use serde_json::json;
use snippetbox_db::entities::snippet::Snippet;
use snippetbox_ui::view_engine::{View, ViewEngine};

use crate::{format, views::Layout};

pub enum HomeView {
    Index(ViewEngine<View>, Layout, Vec<Snippet>),
}

impl IntoResponse for HomeView {
    fn into_response(self) -> Response {
        match self {
            HomeView::Index(ViewEngine(v), layout, snippets) => format::render()
                .view(&v, "home.html", layout.with(json!({ "snippets": snippets })))
                .into_response(),
        }
    }
}
