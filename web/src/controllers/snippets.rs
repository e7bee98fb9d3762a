use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use snippetbox_db::entities::snippet::{Snippet, SnippetChangeset};
use snippetbox_ui::view_engine::{View, ViewEngine};

use crate::{
    error::Error,
    middlewares::flash::{Flash, Level},
    state::AppState,
    views::{FieldErrors, Layout, snippets::SnippetView},
};

pub struct SnippetController;

impl SnippetController {
    /// Routes anyone may visit.
    pub fn router() -> Router<AppState> {
        Router::new().route("/snippets/{id}", get(SnippetController::show))
    }

    /// Routes that need a signed in user.
    pub fn protected_router() -> Router<AppState> {
        Router::new()
            .route("/snippets/new", get(SnippetController::new))
            .route("/snippets", post(SnippetController::create))
    }

    pub async fn show(
        v: ViewEngine<View>,
        layout: Layout,
        Path(id): Path<String>,
        State(app_state): State<AppState>,
    ) -> Result<SnippetView, Error> {
        // Anything that is not a positive integer cannot name a snippet.
        let id = id
            .parse::<i64>()
            .ok()
            .filter(|id| *id >= 1)
            .ok_or(snippetbox_db::Error::NoRecordFound)?;

        let snippet = Snippet::load(id, &app_state.db_pool).await?;

        Ok(SnippetView::Show(v, layout, snippet))
    }

    pub async fn new(v: ViewEngine<View>, layout: Layout) -> SnippetView {
        SnippetView::New(v, layout, SnippetChangeset::default(), FieldErrors::new())
    }

    pub async fn create(
        v: ViewEngine<View>,
        layout: Layout,
        flash: Flash,
        State(app_state): State<AppState>,
        Form(form): Form<SnippetChangeset>,
    ) -> Result<Response, Error> {
        match Snippet::create(form.clone(), &app_state.db_pool).await {
            Ok(snippet) => {
                tracing::info!("created snippet {}", snippet.id);
                flash
                    .push_or_log(Level::Success, "Snippet successfully created!")
                    .await;

                Ok(Redirect::to(&format!("/snippets/{}", snippet.id)).into_response())
            }
            Err(snippetbox_db::Error::ValidationError(errors)) => Ok(SnippetView::New(
                v,
                layout,
                form,
                FieldErrors::from(&errors),
            )
            .into_response()),
            Err(err) => Err(err.into()),
        }
    }
}
