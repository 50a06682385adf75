use crate::graph::ids::NodeId;
use crate::graph::node::Pin;

/// Convenience result type used across pixgraph.
pub type PixResult<T> = Result<T, PixError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum PixError {
    /// A pixel format name is not in the format registry.
    #[error("unknown pixel format: {0}")]
    UnknownFormat(String),

    /// Raw pixel payload length disagrees with `rectangle x format`.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// `width * height * bytes_per_pixel`.
        expected: usize,
        /// Length of the supplied payload.
        actual: usize,
    },

    /// Malformed path text.
    #[error("path parse error: {0}")]
    PathParse(String),

    /// Malformed color text.
    #[error("color parse error: {0}")]
    ColorParse(String),

    /// The target pin already has an incoming edge.
    #[error("duplicate edge: pin '{pin}' of {node} is already connected")]
    DuplicateEdge {
        /// Node owning the pin.
        node: NodeId,
        /// Occupied pin.
        pin: Pin,
    },

    /// The requested edge would close a cycle.
    #[error("cycle detected: connecting {from} to {to} would create a cycle")]
    CycleDetected {
        /// Producer side of the rejected edge.
        from: NodeId,
        /// Consumer side of the rejected edge.
        to: NodeId,
    },

    /// Compose ordinal outside the closed six-way enumeration.
    #[error("unknown compose operation index: {0}")]
    UnknownComposeOp(i64),

    /// Operation identifier is not registered (or has nothing to introspect).
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// Pin name is not one of `input`, `aux`, `output`, or cannot be used in this position.
    #[error("unknown pin: {0}")]
    UnknownPin(String),

    /// Node handle refers to a node that has been destroyed.
    #[error("stale node handle: {0}")]
    StaleNode(NodeId),

    /// Node handle belongs to a different graph.
    #[error("node {0} belongs to a different graph")]
    ForeignNode(NodeId),

    /// Property failed deferred validation against the operation schema.
    #[error("property error: {operation}.{property}: {message}")]
    Property {
        /// Operation identifier.
        operation: String,
        /// Property name.
        property: String,
        /// Human-readable reason.
        message: String,
    },

    /// Opaque failure reported by an operation implementation during processing.
    #[error("operation error: {operation}: {message}")]
    Operation {
        /// Operation identifier.
        operation: String,
        /// Human-readable reason.
        message: String,
    },

    /// The owning context was shut down.
    #[error("context has been shut down")]
    ContextShutdown,

    /// Invalid user-provided data not covered by a more specific kind.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PixError {
    /// Build a [`PixError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PixError::Operation`] value.
    pub fn operation(operation: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Operation {
            operation: operation.into(),
            message: msg.into(),
        }
    }

    /// Build a [`PixError::Property`] value.
    pub fn property(
        operation: impl Into<String>,
        property: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Property {
            operation: operation.into(),
            property: property.into(),
            message: msg.into(),
        }
    }

    pub(crate) fn poisoned(what: &str) -> Self {
        Self::Other(anyhow::anyhow!("{what} lock poisoned"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
