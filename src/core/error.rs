// This module defines the error types of the correlation pass using the thiserror crate.
// Missing debug information is never an error: it degrades to sentinel ranges. The
// variants here cover input that is structurally impossible and must fail fast instead
// of looping or dereferencing nothing: inlining chains that never terminate, references
// to metadata nodes that do not exist, nodes of the wrong kind where the chain walk
// expects a location or a scope, and functions that the adaptor refuses to select.
// CorrelationResult<T> is the convenience alias used throughout the crate.

//! Error types for the correlation pass.

use thiserror::Error;

use super::metadata::MdRef;

/// Main error type of the correlation pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    #[error("corrupt debug info: inlining chain starting at {start} exceeds {limit} links")]
    InliningChainTooDeep { start: MdRef, limit: usize },

    #[error("corrupt debug info: {node} references missing metadata {missing}")]
    DanglingMetadata { node: MdRef, missing: MdRef },

    #[error("corrupt debug info: {node} should be a {expected} but is a {found}")]
    UnexpectedMetadataKind {
        node: MdRef,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Function not found: {name}")]
    FunctionNotFound { name: String },
}

impl CorrelationError {
    /// Whether the error stems from malformed debug metadata, as opposed to a
    /// problem with the IR itself.
    pub fn is_corrupt_debug_info(&self) -> bool {
        matches!(
            self,
            CorrelationError::InliningChainTooDeep { .. }
                | CorrelationError::DanglingMetadata { .. }
                | CorrelationError::UnexpectedMetadataKind { .. }
        )
    }
}

/// Result type alias for correlation operations.
pub type CorrelationResult<T> = Result<T, CorrelationError>;
