//! Error types for fixsom.

use thiserror::Error;

use crate::model::NodeRef;

/// Primary error type for the few fallible entry points.
///
/// Reconstruction itself never fails: malformed primitives are skipped.
/// Errors only come from caller-supplied parameters and node lookups.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SomError {
    #[error("invalid parameter {name}: {value}")]
    InvalidParam { name: &'static str, value: f64 },

    #[error("node not found in page snapshot: {0}")]
    UnknownNode(NodeRef),

    #[error("container stack underflow: end_container without begin_container")]
    ContainerUnderflow,
}

/// Convenience Result type alias for SomError.
pub type Result<T> = std::result::Result<T, SomError>;
