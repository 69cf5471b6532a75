//! Tracing subscriber for the CASI service.
//!
//! Level precedence: `-v` flags, then `RUST_LOG`, then the configured level
//! (`[casi] log_level` or `CASI_LOG_LEVEL`). Outbound HTTP and HTML parsing
//! crates are held at `warn` so routing decisions stay readable at `debug`.
//! A `RUST_LOG` value is used verbatim.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "h2", "reqwest", "html5ever", "selectors"];

/// The level CASI was asked to log at, and who asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// From `-v` flags; `RUST_LOG` is ignored.
    Flag(LevelFilter),
    /// From the config file or `CASI_LOG_LEVEL`; a non-empty `RUST_LOG` wins.
    Configured(LevelFilter),
}

impl LogLevel {
    pub fn level(self) -> LevelFilter {
        match self {
            LogLevel::Flag(level) | LogLevel::Configured(level) => level,
        }
    }

    /// Filter directives given the current `RUST_LOG` value.
    pub fn directives(self, rust_log: Option<&str>) -> String {
        if let (LogLevel::Configured(_), Some(env)) = (self, rust_log.map(str::trim).filter(|d| !d.is_empty())) {
            return env.to_string();
        }
        let level = self.level();
        let mut directives = level.to_string().to_lowercase();
        if level > LevelFilter::WARN {
            for target in QUIET_TARGETS {
                directives.push_str(&format!(",{target}=warn"));
            }
        }
        directives
    }
}

/// Install the global subscriber on stderr. Returns the directives in effect.
pub fn init(level: LogLevel) -> Result<String, AppError> {
    let directives = level.directives(std::env::var("RUST_LOG").ok().as_deref());
    let filter = EnvFilter::try_new(&directives)
        .map_err(|e| AppError::Logger(format!("bad log directives '{directives}': {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("subscriber already installed: {e}")))?;
    Ok(directives)
}

/// Validate a configured level name (`error` … `trace`, or `off`).
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    let level = level.trim();
    if level.is_empty() {
        return Err(AppError::Logger("log_level is empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("log_level '{level}' is not one of off, error, warn, info, debug, trace")))
}
