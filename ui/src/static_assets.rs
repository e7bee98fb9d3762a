use std::path::{Path, PathBuf};

use axum::Router;
use snippetbox_config::Config;
use tower_http::services::ServeDir;

use crate::Error;

pub struct StaticAssetsInitializer {
    path: PathBuf,
}

impl StaticAssetsInitializer {
    pub fn init(config: &Config) -> Self {
        let path =
            Path::new(env!("CARGO_MANIFEST_DIR")).join(Path::new(&config.static_assets.path));

        Self { path }
    }
}

impl StaticAssetsInitializer {
    pub fn name(&self) -> String {
        "static-assets".to_string()
    }

    /// Fails when the configured assets directory cannot be read.
    pub fn before_run(&self) -> Result<(), Error> {
        std::fs::read_dir(&self.path)?;
        tracing::info!("serving static assets from {}", self.path.display());
        Ok(())
    }

    pub fn after_routes(self, router: Router) -> Router {
        router.nest_service("/static", ServeDir::new(self.path.as_path()))
    }
}
