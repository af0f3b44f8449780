//! Error types for gate construction, hierarchy building and evaluation.
//!
//! This module defines `GateError`, a single error type covering every failure
//! the engine can report. It uses `thiserror` for convenient error construction
//! and implements standard error traits for integration with error handling
//! libraries.
//!
//! Every variant is fatal for the operation that raised it: a gate either
//! produces its full membership vector or the call fails.

use std::error::Error as StdError;
use thiserror::Error;

/// Custom error type for gating operations.
///
/// Variants map onto the phases where they can occur:
/// - construction: [`GateError::Validation`]
/// - hierarchy building: [`GateError::Hierarchy`]
/// - evaluation: [`GateError::MissingColumn`], [`GateError::UncomputedReference`],
///   [`GateError::Numerical`]
#[derive(Debug, Error)]
pub enum GateError {
    /// Malformed gate parameters (dimension counts, ranges, boolean types, ...)
    #[error("Invalid gate definition: {message}")]
    Validation { message: String },

    /// Structural problems in the hierarchy (cycles, unknown references, ...)
    #[error("Hierarchy error: {message}")]
    Hierarchy { message: String },

    /// A dimension resolved to a column the event table does not contain
    #[error("Missing column '{column}' in context: {context}")]
    MissingColumn { column: String, context: String },

    /// A boolean gate read a population that has not been evaluated yet
    #[error("Reference '{reference}' has not been computed")]
    UncomputedReference { reference: String },

    /// Singular covariance or another linear algebra failure
    #[error("Numerical error: {message}")]
    Numerical { message: String },

    /// Event table access errors raised by polars
    #[error("Event table error: {0}")]
    EventTable(#[from] polars::error::PolarsError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error with context (for wrapping other errors)
    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl GateError {
    /// Create a Validation error with a message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a Hierarchy error with a message
    pub fn hierarchy(message: impl Into<String>) -> Self {
        Self::Hierarchy {
            message: message.into(),
        }
    }

    /// Create a MissingColumn error
    pub fn missing_column(column: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            context: context.into(),
        }
    }

    /// Create an UncomputedReference error
    pub fn uncomputed_reference(reference: impl Into<String>) -> Self {
        Self::UncomputedReference {
            reference: reference.into(),
        }
    }

    /// Create a Numerical error with a message
    pub fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical {
            message: message.into(),
        }
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        match self {
            Self::Validation { message } => Self::Validation {
                message: format!("{}: {}", context.into(), message),
            },
            Self::Hierarchy { message } => Self::Hierarchy {
                message: format!("{}: {}", context.into(), message),
            },
            Self::MissingColumn {
                column,
                context: ctx,
            } => Self::MissingColumn {
                column,
                context: format!("{}: {}", context.into(), ctx),
            },
            Self::UncomputedReference { reference } => Self::UncomputedReference { reference },
            Self::Numerical { message } => Self::Numerical {
                message: format!("{}: {}", context.into(), message),
            },
            Self::EventTable(e) => Self::Other {
                message: format!("{}: {}", context.into(), e),
                source: Some(Box::new(e)),
            },
            Self::SerializationError(e) => Self::Other {
                message: format!("{}: {}", context.into(), e),
                source: Some(Box::new(e)),
            },
            Self::Other { message, source } => Self::Other {
                message: format!("{}: {}", context.into(), message),
                source,
            },
        }
    }
}

// Type alias for Result using GateError
pub type Result<T> = std::result::Result<T, GateError>;
