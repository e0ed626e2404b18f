//! Module containing the [`GraphError`] type returned by graph construction, layout inference
//! and instance creation.

use std::fmt::Display;

use crate::primitives::PrimitiveKind;

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Two values that a primitive requires to be equal differ. Raised when an instance is
    /// created for a node whose derived layout is inconsistent with its inputs.
    #[error("{node_id}: {label_a} ({value_a}) is not equal to {label_b} ({value_b}){}", suffix(.message))]
    NotEqual {
        node_id: String,
        label_a: &'static str,
        value_a: String,
        label_b: &'static str,
        value_b: String,
        message: String,
    },

    #[error("primitive id {0:?} is used more than once")]
    DuplicateId(String),

    #[error("primitive {node:?} depends on unknown primitive {dependency:?}")]
    UnknownDependency { node: String, dependency: String },

    #[error("graph contains a cycle through {0:?}")]
    Cycle(Vec<String>),

    /// A primitive type was handed a node of a different kind.
    #[error("node {node:?} is a {found} primitive, expected {expected}")]
    KindMismatch {
        node: String,
        expected: PrimitiveKind,
        found: PrimitiveKind,
    },

    #[error("invalid graph description: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unable to read graph description: {0}")]
    Io(#[from] std::io::Error),
}

fn suffix(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(": {message}")
    }
}

/// Fails with [`GraphError::NotEqual`] when `value_a` and `value_b` differ.
///
/// The labels name the compared quantities from the point of view of node `node_id`.
pub fn ensure_equal<T: PartialEq + Display>(
    node_id: &str,
    label_a: &'static str,
    value_a: T,
    label_b: &'static str,
    value_b: T,
    message: &str,
) -> Result<()> {
    if value_a == value_b {
        return Ok(());
    }
    Err(GraphError::NotEqual {
        node_id: node_id.to_string(),
        label_a,
        value_a: value_a.to_string(),
        label_b,
        value_b: value_b.to_string(),
        message: message.to_string(),
    })
}
