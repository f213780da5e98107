//! Error taxonomy of the engine.
//!
//! Every variant is caught at the boundary of the controller that triggered
//! it and logged there. Only [`CoreError::Load`] is surfaced to the user, as an
//! inline notice.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Example store fetch or parse failure. Previously loaded rows stay untouched.
    Load { preset: String, reason: String },
    /// The document has no container for a known slot or subslot.
    MissingElement { element_id: String },
    /// Persisted visibility storage could not be read or written.
    Storage { key: String, reason: String },
    /// A randomize/toggle arrived while another one was in flight or cooling down.
    ReentrancyRejected { operation: &'static str },
    /// An action arrived while the example store was still loading.
    NotReady { operation: &'static str },
}

impl CoreError {
    /// Whether the user should see this error (as opposed to a log line only).
    pub fn is_user_visible(&self) -> bool {
        matches!(self, CoreError::Load { .. })
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Load { preset, reason } => {
                write!(f, "failed to load examples '{}': {}", preset, reason)
            }
            CoreError::MissingElement { element_id } => {
                write!(f, "no element with id '{}'", element_id)
            }
            CoreError::Storage { key, reason } => {
                write!(f, "storage error for '{}': {}", key, reason)
            }
            CoreError::ReentrancyRejected { operation } => {
                write!(f, "{} already in progress, call dropped", operation)
            }
            CoreError::NotReady { operation } => {
                write!(f, "{} rejected: examples are still loading", operation)
            }
        }
    }
}

impl std::error::Error for CoreError {}
