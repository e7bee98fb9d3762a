use snippetbox_config::{Config, Environment, load_config};
use snippetbox_db::{DbPool, connect_pool};

use crate::error::Error;

/// The application's state that is available in [`crate::controllers`] and [`crate::middlewares`].
#[derive(Clone)]
pub struct AppState {
    pub env: Environment,
    pub config: Config,
    pub db_pool: DbPool,
}

impl AppState {
    /// Loads the configuration for `env` and connects to its database.
    pub async fn build(env: Environment) -> Result<Self, Error> {
        let config: Config = load_config(&env)?;

        Self::from_config(env, config).await
    }

    pub async fn from_config(env: Environment, config: Config) -> Result<Self, Error> {
        let db_pool = connect_pool(&config).await?;

        Ok(Self {
            env,
            config,
            db_pool,
        })
    }
}
