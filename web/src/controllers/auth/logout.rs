use axum::{Router, response::Redirect, routing::post};
use tower_sessions::Session;

use crate::{
    error::Error,
    middlewares::{
        auth::{AuthSession, sign_out},
        flash::Flash,
    },
    state::AppState,
};

pub struct LogoutController;

impl LogoutController {
    pub fn router() -> Router<AppState> {
        Router::new().route("/auth/logout", post(LogoutController::logout))
    }

    pub async fn logout(
        mut auth_session: AuthSession,
        session: Session,
        flash: Flash,
    ) -> Result<Redirect, Error> {
        sign_out(&mut auth_session, &session).await?;

        flash.success("You've been logged out successfully!").await?;

        Ok(Redirect::to("/"))
    }
}
