//! Error types for action resolution and execution.

use crate::action::ActionKind;
use crate::actionlogic::ValidationErrors;
use thiserror::Error;

/// Main error type for the action engine.
#[derive(Error, Debug)]
pub enum ActionError {
    /// The selected logic rejected the action; nothing was executed.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// No registered logic applies to the action in this scope.
    #[error("No logic found for action {action}")]
    NoLogic { action: ActionKind },

    /// Two or more logics share the top priority for the same action and scope.
    #[error("Ambiguous logic for action {action}: {} at priority {priority}", candidates.join(", "))]
    AmbiguousLogic {
        action: ActionKind,
        priority: i32,
        candidates: Vec<String>,
    },

    /// A statement or introspection query failed against the database.
    #[error("{message}: {source}")]
    Execution {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The connection cannot serve this kind of request.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Structurally impossible input; indicates a programming error.
    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ActionError {
    /// Wrap a lower-level failure with a message describing what was attempted.
    pub fn execution<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ActionError::Execution {
            message: message.into(),
            source: Box::new(source),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        ActionError::Unexpected(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        ActionError::Unsupported(message.into())
    }

    /// Only validation failures can be fixed by the caller changing the action.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ActionError::Validation(_))
    }

    /// Validation details, when this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ActionError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ActionError {
    fn from(err: sqlx::Error) -> Self {
        ActionError::execution("Database error", err)
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, ActionError>;
