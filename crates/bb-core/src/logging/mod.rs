//! Structured logging for bb-core.
//!
//! Two output modes on stderr:
//! - Human-readable console output for interactive use
//! - JSONL for automation (`--format json` or `BB_LOG_FORMAT=jsonl`)
//!
//! stdout is reserved for command payloads (markdown or JSON reports).
//!
//! ```ignore
//! use bb_core::logging::{init_logging, LogConfig, LogContext, Stage, event_names};
//!
//! init_logging(&LogConfig::from_env(None, None));
//! let ctx = LogContext::new(generate_run_id(), get_host_id());
//! bb_core::log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "Starting run");
//! ```

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, LogContext, LogEvent, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global subscriber.
///
/// `RUST_LOG` directives win when present; otherwise every target is
/// filtered at `config.level`. Calling this twice is harmless: the second
/// subscriber is ignored.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let result = match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .with_ansi(std::io::stderr().is_terminal());

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(JsonlLayer::stderr())
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
}

/// Initialize logging from the environment only.
pub fn init_default_logging() {
    init_logging(&LogConfig::from_env(None, None));
}

/// Generate a run id (`bb-YYYYMMDD-HHMMSS-xxxx`).
pub fn generate_run_id() -> String {
    bb_common::RunId::new().to_string()
}

/// Host identifier for log correlation.
///
/// First 8 characters of `/etc/machine-id`, else a hash of `HOSTNAME`,
/// else random.
pub fn get_host_id() -> String {
    if let Ok(id) = std::fs::read_to_string("/etc/machine-id") {
        let id = id.trim();
        if id.len() >= 8 && id.is_char_boundary(8) {
            return format!("host-{}", &id[..8]);
        }
    }

    if let Ok(hostname) = std::env::var("HOSTNAME") {
        return format!("host-{}", &hash_string(&hostname)[..8]);
    }

    format!("host-{}", &uuid::Uuid::new_v4().simple().to_string()[..8])
}

fn hash_string(s: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Emit a tracing event carrying the run's correlation fields.
///
/// ```ignore
/// log_event!(ctx, INFO, event_names::STAGE_FINISHED, Stage::Load, "Loaded dataset", rows = 150);
/// log_event!(ctx, WARN, event_names::DRIFT_BACKEND_FAILED, Stage::Drift, "Backend failed",
///     backend = "mmd");
/// ```
#[macro_export]
macro_rules! log_event {
    ($ctx:expr, INFO, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::info!(
            target: $event,
            run_id = %$ctx.run_id,
            host_id = %$ctx.host_id,
            stage = %$stage,
            $($key = $val,)*
            message = %$msg
        )
    };
    ($ctx:expr, DEBUG, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::debug!(
            target: $event,
            run_id = %$ctx.run_id,
            host_id = %$ctx.host_id,
            stage = %$stage,
            $($key = $val,)*
            message = %$msg
        )
    };
    ($ctx:expr, WARN, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::warn!(
            target: $event,
            run_id = %$ctx.run_id,
            host_id = %$ctx.host_id,
            stage = %$stage,
            $($key = $val,)*
            message = %$msg
        )
    };
    ($ctx:expr, ERROR, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::error!(
            target: $event,
            run_id = %$ctx.run_id,
            host_id = %$ctx.host_id,
            stage = %$stage,
            $($key = $val,)*
            message = %$msg
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_run_id() {
        let id1 = generate_run_id();
        let id2 = generate_run_id();
        assert!(bb_common::RunId::parse(&id1).is_some());
        assert!(id1.starts_with("bb-"));
        assert_eq!(id1.len(), 23);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_get_host_id() {
        let host_id = get_host_id();
        assert!(host_id.starts_with("host-"));
        assert_eq!(host_id.len(), 13);
    }

    #[test]
    fn test_stage_serialization() {
        assert_eq!(serde_json::to_string(&Stage::Drift).unwrap(), "\"drift\"");
        assert_eq!(serde_json::to_string(&Stage::Persist).unwrap(), "\"persist\"");
    }

    #[test]
    fn test_level_from_tracing() {
        assert_eq!(Level::from(tracing::Level::INFO), Level::Info);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warn);
    }
}
