mod login_test;
mod logout_test;
mod register_test;
mod security_test;
mod snippets_test;

use std::sync::OnceLock;

use axum_test::{TestResponse, TestServer, TestServerBuilder};
use fake::{Fake, Faker};
use snippetbox_config::Environment;
use snippetbox_db::{
    DbPool,
    entities::user::{RegisterUser, User, UserCredentials},
};
use snippetbox_web::{app::App, state::AppState, tracing::Tracing};

fn lazy_tracing(app_state: &AppState) {
    static TRACING: OnceLock<()> = OnceLock::new();
    TRACING.get_or_init(|| {
        let _ = Tracing::init(&app_state.config.tracing);
    });
}

fn lazy_eyre() {
    static EYRE: OnceLock<()> = OnceLock::new();
    EYRE.get_or_init(|| color_eyre::install().expect("failed to initialize Eyre"));
}

/// The session token carried by the signed `id` cookie of `response`.
pub fn session_token(response: &TestResponse) -> String {
    let value = response.cookie("id").value().to_string();
    // Cookie is signed so the actual session id can be extracted after the '=' symbol
    value
        .rsplit('=')
        .next()
        .expect("signed cookie without a value")
        .to_string()
}

pub async fn count_rows(table: &str, pool: &DbPool) -> i64 {
    sqlx::query_scalar(&format!("select count(*) from {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Registers a fake user and logs the test server's cookie jar in as them.
pub async fn mock_logged_in_state(request: &TestServer, pool: &DbPool) -> (User, TestResponse) {
    let user: RegisterUser = Faker.fake();

    let saved_user = User::create(user.clone(), pool).await.unwrap();

    let response = request
        .post("/auth/login")
        .form(&UserCredentials {
            email: user.email,
            password: user.password,
            next: None,
        })
        .await;
    response.assert_status_see_other();

    (saved_user, response)
}

async fn test_server(test_db: DbPool) -> TestServer {
    lazy_eyre();

    let mut app_state = AppState::build(Environment::Test)
        .await
        .expect("failed to build app state");

    // [sqlx::test] sets up a test database when running the test and cleans up afterwards
    // https://docs.rs/sqlx/latest/sqlx/attr.test.html
    app_state.db_pool = test_db;

    if std::env::var("TEST_LOG").is_ok() {
        lazy_tracing(&app_state);
    }

    let app = App::build(app_state)
        .await
        .expect("failed to boot test app");

    let config = TestServerBuilder::new()
        .transport(axum_test::Transport::HttpRandomPort)
        .save_cookies()
        .into_config();

    TestServer::new_with_config(app.router, config)
        .expect("unable to parse axum test server config")
}

pub async fn authenticated_request<F, Fut>(test_db: DbPool, callback: F)
where
    F: FnOnce(TestServer, User) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let server = test_server(test_db.clone()).await;

    let (user, _) = mock_logged_in_state(&server, &test_db).await;

    callback(server, user).await;
}

pub async fn test_request_with_db<F, Fut>(test_db: DbPool, callback: F)
where
    F: FnOnce(TestServer) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let server = test_server(test_db).await;

    callback(server).await;
}
