use std::net::SocketAddr;

use snippetbox_config::{Config, Environment, load_config};
use snippetbox_db::schema;
use snippetbox_ui::{static_assets::StaticAssetsInitializer, view_engine::ViewEngineInitializer};
use tower_sessions::session_store;
use tracing::{debug, info};

use axum::{Router, serve};
use color_eyre::Result;
use tokio::{
    net::TcpListener,
    signal,
    task::{AbortHandle, JoinHandle},
};

use crate::{
    middlewares::auth::{AuthSessionManager, precompute_dummy_hash},
    router::{init_router, with_middleware},
    state::AppState,
    tls,
    tracing::Tracing,
};

/// Command line values that take precedence over the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub addr: Option<SocketAddr>,
    pub dsn: Option<String>,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(addr) = self.addr {
            config.server.ip = addr.ip();
            config.server.port = addr.port();
        }
        if let Some(dsn) = &self.dsn {
            config.database.url = dsn.clone();
        }
    }
}

pub struct App {
    pub router: Router,
    pub app_state: AppState,
    pub deletion_task: JoinHandle<Result<(), session_store::Error>>,
}

impl App {
    // Builds the application without running it
    // this is useful for testing purposes
    // where axum_test will run a
    // random port
    pub async fn build(app_state: AppState) -> Result<Self> {
        // Nothing is served against a database that failed to initialize.
        schema::initialize(&app_state.db_pool).await?;

        let AuthSessionManager {
            deletion_task,
            auth_layer,
        } = AuthSessionManager::new(&app_state);

        // Initialize the static assets handler
        let asset_handler = StaticAssetsInitializer::init(&app_state.config);
        debug!("initializing {}", asset_handler.name());
        asset_handler.before_run()?;

        let view_engine = ViewEngineInitializer;
        debug!("initializing {}", view_engine.name());

        let mut router = init_router(&app_state);
        router = asset_handler.after_routes(router);
        router = view_engine.after_routes(router, &app_state.config);
        router = with_middleware(router, &app_state.config, auth_layer);

        Ok(Self {
            router,
            app_state,
            deletion_task,
        })
    }

    // Serves the application on the configured
    // ip and port, over TLS when certificates are configured.
    async fn serve(app: App) -> Result<()> {
        let App {
            router,
            app_state,
            deletion_task,
        } = app;
        let server = &app_state.config.server;

        let listener = TcpListener::bind(server.addr()).await?;
        let shutdown = shutdown_signal(vec![deletion_task.abort_handle()]);

        match &server.tls {
            Some(tls_config) => {
                let acceptor = tls::acceptor(tls_config)?;
                info!("listening on https://{}", server.addr());

                tls::serve(
                    listener,
                    acceptor,
                    router,
                    server.header_read_timeout(),
                    shutdown,
                )
                .await;
            }
            None => {
                info!("listening on http://{}", server.addr());

                serve(listener, router)
                    .with_graceful_shutdown(shutdown)
                    .await?;
            }
        }

        App::shutdown_with_cleanup(deletion_task).await?;

        Ok(())
    }

    // Boots up the app on the configured binding
    // and port.
    pub async fn boot(env: Environment, overrides: Overrides) -> Result<()> {
        color_eyre::install()?;

        let mut config: Config = load_config(&env)?;
        overrides.apply(&mut config);

        Tracing::init(&config.tracing)?;
        info!("starting in {} environment", env);

        let app_state = AppState::from_config(env, config).await?;
        precompute_dummy_hash();

        let app = App::build(app_state).await?;

        App::serve(app).await?;

        Ok(())
    }

    async fn shutdown_with_cleanup(
        deletion_task: JoinHandle<Result<(), session_store::Error>>,
    ) -> Result<()> {
        match deletion_task.await {
            Ok(Ok(())) => (), // nothing to cleanup
            Ok(Err(err)) => return Err(err.into()),
            Err(err) if err.is_cancelled() => {
                tracing::debug!("session deletion task cleaned up.")
            }
            Err(err) => return Err(err.into()),
        }

        info!("server shutdown successfully");

        Ok(())
    }
}

async fn shutdown_signal(task_handles: Vec<AbortHandle>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    for task_handle in task_handles {
        task_handle.abort();
    }
}
