//! Error type shared by every designer operation.

use thiserror::Error;

use crate::engine::Lifecycle;
use crate::types::NodeId;

/// Everything that can go wrong while editing a form.
///
/// Reactive reads of undeclared fields and structural edits that would break
/// the document tree are reported here instead of being silently ignored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("field `{0}` is not declared on this reactive object")]
    UnknownField(String),

    #[error("field `{field}` holds {found}, expected {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("a reactive record must be built from a JSON object, got {0}")]
    NotARecord(&'static str),

    #[error("no field type is registered under tag `{0}`")]
    UnknownFieldType(String),

    #[error("element id `{0}` is already in use")]
    DuplicateId(String),

    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("invalid drop target: {0}")]
    InvalidDropTarget(String),

    #[error("node {0} cannot be dropped onto itself")]
    SelfDrop(NodeId),

    #[error("node {0} is not attached to the document")]
    NodeNotLive(NodeId),

    #[error("node {node} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        node: NodeId,
        from: Lifecycle,
        to: Lifecycle,
    },

    #[error("no {0} widget is installed in the host document")]
    MissingHostWidget(&'static str),

    #[error("invalid designer configuration: {0}")]
    Config(String),
}

impl From<toml::de::Error> for FormError {
    fn from(err: toml::de::Error) -> Self {
        FormError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FormError>;
