use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Base log level when `RUST_LOG` is unset (e.g. "info").
    pub level: Option<String>,
    /// Extra filter directives appended to the base level
    /// (e.g. "rustacall=debug,flume=warn").
    pub filters: Option<String>,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the config section. Safe to call once per process;
/// embedders with their own subscriber should skip this.
pub fn init(config: Option<&LoggingConfig>) {
    let default_directives = match config {
        Some(cfg) => {
            let level = cfg.level.as_deref().unwrap_or("info");
            match cfg.filters.as_deref() {
                Some(filters) if !filters.is_empty() => format!("{level},{filters}"),
                _ => level.to_string(),
            }
        }
        None => "info".to_string(),
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
