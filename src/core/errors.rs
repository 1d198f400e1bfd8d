/*!
# Query Error System

Единая таксономия отказов для обоих транспортов (CLI и MCP).
Один и тот же отказ адаптера доходит до форматтера без изменения вида.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure kinds shared by every layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Malformed or empty request; caller error, never retried
    InvalidInput,
    /// Well-formed query without a matching symbol
    NotFound,
    /// Backing index failed to load, refresh or answer in time
    IndexUnavailable,
    /// Unexpected failure in formatting or dispatch
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidInput => "InvalidInput",
            FailureKind::NotFound => "NotFound",
            FailureKind::IndexUnavailable => "IndexUnavailable",
            FailureKind::Internal => "Internal",
        }
    }

    /// Можно ли сохранять отказ в кэше запросов
    pub fn is_cacheable(&self) -> bool {
        matches!(self, FailureKind::NotFound)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed query failure carried inside a `QueryResult`
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct QueryError {
    pub kind: FailureKind,
    pub message: String,
    /// Rendered offending query, if one was built
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl QueryError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            query: None,
        }
    }

    pub fn with_query(mut self, query: impl fmt::Display) -> Self {
        self.query = Some(query.to_string());
        self
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, message)
    }

    pub fn index_unavailable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::IndexUnavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Internal, message)
    }
}
