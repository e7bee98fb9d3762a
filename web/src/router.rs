use axum::{Router, http::StatusCode};
use axum_login::login_required;
use snippetbox_config::Config;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    controllers::{
        auth::{login::LoginController, logout::LogoutController, register::RegisterController},
        home::HomeController,
        ping::PingController,
        snippets::SnippetController,
    },
    middlewares::{
        auth::{AuthBackend, AuthLayer},
        headers::{no_store, with_secure_headers},
    },
    state::AppState,
};

/// All routes of the app. Routes merged into `protected` redirect anonymous
/// visitors to the login page.
pub fn init_router(app_state: &AppState) -> Router {
    let protected = Router::new()
        .merge(SnippetController::protected_router())
        .merge(LogoutController::router())
        .route_layer(no_store())
        .route_layer(login_required!(AuthBackend, login_url = "/auth/login"));

    Router::new()
        .merge(protected)
        .merge(HomeController::router())
        .merge(SnippetController::router())
        .merge(LoginController::router())
        .merge(RegisterController::router())
        .merge(PingController::router())
        .with_state(app_state.clone())
}

/// Wraps everything added to `router` so far, static assets included.
pub fn with_middleware(router: Router, config: &Config, auth_layer: AuthLayer) -> Router {
    let router = router.layer(ServiceBuilder::new().layer((
        TraceLayer::new_for_http(),
        CatchPanicLayer::new(),
        // Graceful shutdown will wait for outstanding requests to complete. Add a timeout so
        // requests don't hang forever.
        request_timeout(config),
        auth_layer,
    )));

    with_secure_headers(router)
}

/// Answers `408 Request Timeout` once a request runs past the configured limit.
fn request_timeout(config: &Config) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, config.server.request_timeout())
}
