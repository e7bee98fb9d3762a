use snippetbox_config::TracingConfig;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
    util::TryInitError,
};

pub struct Tracing;

impl Tracing {
    /// Installs the global subscriber.
    ///
    /// `RUST_LOG` takes precedence over `tracing.env_filter`. Fails if a
    /// global subscriber was already installed.
    pub fn init(config: &TracingConfig) -> Result<(), TryInitError> {
        let mut layers: Vec<Box<dyn Layer<Registry> + Sync + Send>> = Vec::new();

        if config.enable {
            let stdout_layer = fmt::Layer::default()
                .with_ansi(true)
                .with_writer(std::io::stdout)
                .compact()
                .boxed();
            layers.push(stdout_layer);
        }

        tracing_subscriber::registry()
            .with(layers)
            .with(env_filter(config))
            .with(ErrorLayer::default())
            .try_init()
    }
}

fn env_filter(config: &TracingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| config.env_filter.clone().into())
}
