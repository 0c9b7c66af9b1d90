//! Error types.

use std::io;

use thiserror::Error;

use crate::conformance::ConformanceReport;

/// Errors that prevent a pairing from being bound.
///
/// A failed binding never yields a partial table.
#[derive(Debug, Error)]
pub enum BindError {
    /// The candidate is missing operations or declares incompatible ones.
    /// Displays the full rendered report.
    #[error("{0}")]
    NonConformant(Box<ConformanceReport>),

    #[error("operation table of `{interface}` has no slot `{slot}` for operation `{operation}`")]
    MissingSlot {
        interface: String,
        operation: String,
        slot: String,
    },

    #[error(
        "slot `{slot}` of `{interface}` is declared as `{declared}`, \
         which does not match its operation"
    )]
    SlotType {
        interface: String,
        slot: String,
        declared: String,
    },

    #[error("slot `{slot}` of `{interface}` does not correspond to any required operation")]
    UnboundSlot { interface: String, slot: String },
}

impl BindError {
    /// The conformance report, for `NonConformant` failures.
    pub fn report(&self) -> Option<&ConformanceReport> {
        match self {
            BindError::NonConformant(report) => Some(&**report),
            _ => None,
        }
    }
}

/// Binding result type.
pub type BindResult<T> = Result<T, BindError>;

/// Errors raised while loading a [`BindConfig`](crate::BindConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
