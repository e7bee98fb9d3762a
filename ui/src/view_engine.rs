use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{Extension, Router, extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use minijinja::{ErrorKind, path_loader};
use minijinja_autoreload::AutoReloader;
use serde::Serialize;
use snippetbox_config::Config;

use crate::Error;

pub trait ViewRenderer {
    /// Render a view template located by `key`
    ///
    /// # Errors
    ///
    /// This function will return an error if render fails
    fn render<S: Serialize>(&self, key: &str, data: S) -> Result<String, Error>;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ViewEngine<E>(pub E);

impl<E> ViewEngine<E> {
    /// Creates a new [`ViewEngine`] that wraps the given engine
    pub fn new(engine: E) -> Self {
        Self(engine)
    }
}

impl<S, E> FromRequestParts<S> for ViewEngine<E>
where
    S: Send + Sync,
    E: Clone + Send + Sync + 'static,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Extension(tl): Extension<Self> = Extension::from_request_parts(parts, state)
            .await
            .expect("view_engine missing. Is the view_engine initialized?");

        Ok(tl)
    }
}

/// A struct representing an inline Minijinja view renderer.
///
/// This struct provides functionality to render templates using the Minijinja templating engine
/// directly from raw template strings.
pub fn template<S>(template: &str, data: S) -> Result<String, Error>
where
    S: Serialize,
{
    let mut minijinja = minijinja::Environment::new();
    minijinja.add_filter("human_date", human_date);
    Ok(minijinja.render_str(template, minijinja::Value::from_serialize(data))?)
}

impl<E> From<E> for ViewEngine<E> {
    fn from(inner: E) -> Self {
        Self::new(inner)
    }
}

#[derive(Clone)]
pub struct View {
    pub reloader: Arc<AutoReloader>,
}

impl View {
    pub fn build(config: &Config) -> Self {
        let templates_path = get_base_path(&config.view.templates_path);

        let reloader = AutoReloader::new(move |notifier| {
            let templates_path = templates_path.clone();
            let mut env = minijinja::Environment::new();
            // Watch the template directory for changes in debug mode
            if cfg!(debug_assertions) {
                notifier.set_fast_reload(true);
                notifier.watch_path(&templates_path, true);
            }
            // Load in the templates from the specified directory
            env.set_loader(path_loader(templates_path));
            env.add_filter("human_date", human_date);
            Ok(env)
        });

        Self {
            reloader: Arc::new(reloader),
        }
    }
}

impl ViewRenderer for View {
    fn render<S: Serialize>(&self, key: &str, data: S) -> Result<String, Error> {
        let env = self.reloader.acquire_env()?;
        let template = env.get_template(key)?;
        Ok(template.render(minijinja::Value::from_serialize(data))?)
    }
}

/// Formats an RFC 3339 timestamp as e.g. "02 Jan 2024 at 15:04" (UTC).
pub fn human_date(value: &str) -> Result<String, minijinja::Error> {
    let date = DateTime::parse_from_rfc3339(value).map_err(|err| {
        minijinja::Error::new(ErrorKind::InvalidOperation, "not an RFC 3339 date")
            .with_source(err)
    })?;

    Ok(date
        .with_timezone(&Utc)
        .format("%d %b %Y at %H:%M")
        .to_string())
}

/// Attaches the view engine to the router so handlers can extract it.
#[derive(Clone, Default)]
pub struct ViewEngineInitializer;

impl ViewEngineInitializer {
    pub fn name(&self) -> String {
        "view-engine".to_string()
    }

    pub fn after_routes(self, router: Router, config: &Config) -> Router {
        let minijinja_engine = View::build(config);

        tracing::info!(
            "rendering templates from {}",
            get_base_path(&config.view.templates_path).display()
        );

        router.layer(Extension(ViewEngine::from(minijinja_engine)))
    }
}

pub fn get_base_path(path_str: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(Path::new(path_str))
}
