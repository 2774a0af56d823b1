//! Error types for relq.

use std::time::Duration;

use thiserror::Error;

use crate::ast::ValueKind;

/// The main error type for relq operations.
#[derive(Debug, Error)]
pub enum RelqError {
    /// A predicate or projection referenced a member the entity does not declare.
    #[error("Unknown member '{member}' on entity '{entity}'")]
    UnknownMember {
        member: String,
        entity: &'static str,
    },

    /// An expression shape the translator cannot compile.
    #[error("Unsupported expression: {0}")]
    Unsupported(String),

    /// A result column could not be applied to its target member.
    #[error("Cannot map column '{column}' (value {value}) into member '{member}': {reason}")]
    Mapping {
        column: String,
        member: String,
        value: String,
        reason: String,
    },

    /// A raw value could not be coerced into the member's declared kind.
    #[error("Cannot convert {from} into {to:?}")]
    Conversion { from: String, to: ValueKind },

    /// By-entity update/delete requires at least one key column.
    #[error("Entity '{0}' declares no key columns")]
    MissingKey(&'static str),

    /// Aggregate function name did not parse.
    #[error("Unknown aggregate function: '{0}'")]
    UnknownAggregate(String),

    /// Invalid argument or unusable result value.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Connection-level failure (broken socket, closed handle).
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution failure reported by the database.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Command exceeded its timeout.
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),
}

impl RelqError {
    /// Create an unknown-member translation error.
    pub fn unknown_member(member: impl Into<String>, entity: &'static str) -> Self {
        Self::UnknownMember {
            member: member.into(),
            entity,
        }
    }

    /// Create a mapping error carrying full column/member context.
    pub fn mapping(
        column: impl Into<String>,
        member: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Mapping {
            column: column.into(),
            member: member.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }
}

/// Result type alias for relq operations.
pub type RelqResult<T> = Result<T, RelqError>;
