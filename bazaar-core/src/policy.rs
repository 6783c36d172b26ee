use std::fmt;
use std::str::FromStr;

use anyhow::Result;

use crate::errors::{BazaarError, ErrorKind};
use crate::router::Effect;

/// What a dispatch does with a failed handler.
///
/// `LogOnly` writes the failure to the log and leaves the view as it was;
/// nothing reaches the user. `Surface` hands the error to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    LogOnly,
    Surface,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::LogOnly => "log-only",
            FailurePolicy::Surface => "surface",
        }
    }

    /// Turn a handler failure into the effect the driver sees.
    ///
    /// Swallowed failures become `Effect::Halt`. Cancellation is never
    /// surfaced.
    pub fn handle<V>(&self, route: &str, err: anyhow::Error) -> Result<Effect<V>> {
        let kind = ErrorKind::of(&err);

        if kind == ErrorKind::Cancelled {
            tracing::debug!(route, "navigation superseded");
            return Ok(Effect::Halt);
        }

        match self {
            FailurePolicy::LogOnly => {
                tracing::warn!(
                    route,
                    kind = kind.name(),
                    error = %err,
                    "handler failed"
                );
                Ok(Effect::Halt)
            }
            FailurePolicy::Surface => Err(err),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log-only" | "log_only" | "silent" => Ok(FailurePolicy::LogOnly),
            "surface" => Ok(FailurePolicy::Surface),
            other => Err(BazaarError::bad_request(format!(
                "Unknown failure policy '{other}' (expected 'log-only' or 'surface')"
            ))
            .into_anyhow()),
        }
    }
}
