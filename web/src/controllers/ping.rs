use axum::{Router, routing::get};

use crate::state::AppState;

pub struct PingController;

impl PingController {
    pub fn router() -> Router<AppState> {
        Router::new().route("/ping", get(PingController::ping))
    }

    /// Liveness probe; does not touch the database.
    pub async fn ping() -> &'static str {
        "OK"
    }
}
