//! Process-wide log setup.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{fmt as fmt_layer, prelude::*, EnvFilter};

use crate::error::LeadRelayError;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'text' or 'json', got '{}'", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Installs the global subscriber and bridges `log` records into it.
///
/// The level filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_logging(format: LogFormat) -> Result<(), LeadRelayError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| LeadRelayError::Logging(format!("Failed to create log filter: {}", e)))?;

    let (text, json) = match format {
        LogFormat::Text => (Some(fmt_layer::layer().with_target(true).compact()), None),
        LogFormat::Json => (
            None,
            Some(fmt_layer::layer().json().with_current_span(true)),
        ),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(text)
        .with(json);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| LeadRelayError::Logging(format!("Failed to install subscriber: {}", e)))?;

    tracing_log::LogTracer::init()
        .map_err(|e| LeadRelayError::Logging(format!("Failed to bridge log records: {}", e)))?;

    Ok(())
}
