use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt};

/// This object initialises the log tracer for a component.
/// Log output goes to stderr, leaving stdout free for component output.
pub struct TracerEngine {
    service_name: String,
}

impl TracerEngine {
    /// Initialises the log tracer.
    /// #Arguments
    /// * `service_name` - The name of the component, recorded in the startup message.
    /// * `default_level` - Level used when `RUST_LOG` is not set.
    /// #Returns
    /// An instance of TracerEngine
    pub fn new(service_name: &str, default_level: LevelFilter) -> Self {
        let log_tracer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

        // This filter is applied to the log tracer
        let log_filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();

        let subscriber =
            tracing_subscriber::Registry::default().with(log_tracer.with_filter(log_filter));

        //  This is only called once, so will never panic
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("tracing subscriber was already set: {e}");
        }

        Self {
            service_name: service_name.to_owned(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

/// Should be called at the start of each component.
#[macro_export]
macro_rules! init_tracer {
    ($level:expr) => {{
        let tracer = $crate::tracer::TracerEngine::new(env!("CARGO_BIN_NAME"), $level);
        tracing::info!("{} starting", tracer.service_name());
        tracer
    }};
}
