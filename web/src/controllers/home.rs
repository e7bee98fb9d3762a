use axum::{Router, extract::State, routing::get};
use snippetbox_db::entities::snippet::Snippet;
use snippetbox_ui::view_engine::{View, ViewEngine};

use crate::{error::Result, state::AppState, views::{Layout, home::HomeView}};

pub struct HomeController;

impl HomeController {
    pub fn router() -> Router<AppState> {
        Router::new().route("/", get(HomeController::index))
    }

    pub async fn index(
        v: ViewEngine<View>,
        layout: Layout,
        State(app_state): State<AppState>,
    ) -> Result<HomeView> {
        let snippets = Snippet::latest(&app_state.db_pool).await?;

        Ok(HomeView::Index(v, layout, snippets))
    }
}
