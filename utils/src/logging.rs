use std::path::PathBuf;
use std::sync::Once;
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// Global initialization guard
static INIT: Once = Once::new();

/// Configuration for logging initialization
pub struct LogConfig {
    /// Component name used for the log file and filter directives
    pub component: &'static str,
    /// Directory where log files will be stored
    pub log_dir: PathBuf,
    /// Maximum log level
    pub max_level: Level,
    /// Whether to also log to stdout
    pub log_to_console: bool,
    /// Optional custom env filter string
    pub env_filter: Option<String>,
    /// List of dependency crates to silence
    pub silent_deps: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            component: "fetchd",
            log_dir: PathBuf::from("logs"),
            max_level: Level::INFO,
            log_to_console: true,
            env_filter: None,
            silent_deps: Vec::new(),
        }
    }
}

/// Initialize logging for the process; later calls are no-ops.
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut result = Ok(());

    INIT.call_once(|| {
        result = initialize_logging_internal(config);
    });

    result
}

fn initialize_logging_internal(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&config.log_dir)?;

    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        &config.log_dir,
        format!("{}.log", config.component),
    );

    let mut layers = Vec::new();
    let file_layer = fmt::Layer::new()
        .with_ansi(false)
        .with_writer(file_appender)
        .with_target(true);

    if config.log_to_console {
        let stdout_layer = fmt::Layer::new()
            .with_ansi(true)
            .with_target(true)
            .compact();

        layers.push(stdout_layer.with_filter(build_filter(&config)?).boxed());
    }

    layers.push(file_layer.with_filter(build_filter(&config)?).boxed());

    tracing_subscriber::registry().with(layers).try_init()?;

    Ok(())
}

fn build_filter(config: &LogConfig) -> Result<EnvFilter, Box<dyn std::error::Error>> {
    let mut filter = if let Some(filter_str) = &config.env_filter {
        EnvFilter::try_new(filter_str)?
    } else {
        EnvFilter::try_new(format!("{}", config.max_level))?
            .add_directive(format!("{}={}", config.component, config.max_level).parse()?)
    };

    for dep in &config.silent_deps {
        filter = filter.add_directive(format!("{}=error", dep).parse()?);
    }

    Ok(filter)
}
