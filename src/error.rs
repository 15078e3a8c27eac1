//! Errors reported by the diagram manager.

use thiserror::Error;

use crate::arena::Handle;
use crate::node::NodeKind;
use crate::reference::NodeId;

/// Contract violations detected by [`Mdd`][crate::mdd::Mdd] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MddError {
    /// The handle points to a slot that was freed (and possibly reused).
    #[error("stale handle {0}: the slot was freed")]
    StaleHandle(Handle),

    #[error("diagram size is not set")]
    SizeNotSet,

    #[error("invalid diagram size {0}: at least 2 layers are required")]
    InvalidSize(usize),

    #[error("cannot shrink diagram to {0} layers: dropped layers are not empty")]
    ShrinkNonEmpty(usize),

    #[error("layer {layer} is out of range for a diagram of size {size}")]
    LayerOutOfRange { layer: usize, size: usize },

    #[error("path has {found} labels, expected {expected}")]
    PathLength { expected: usize, found: usize },

    #[error("root must be a {expected:?} node, got a {found:?} node")]
    RootKindMismatch { expected: NodeKind, found: NodeKind },

    #[error("node {0} is not a cost node")]
    NotACostNode(NodeId),

    #[error("node {0} is not a property node")]
    NotAPropertyNode(NodeId),

    #[error("diagram sizes differ: {left} vs {right}")]
    SizeMismatch { left: usize, right: usize },

    #[error("property '{name}' holds values of different types")]
    PropertyTypeMismatch { name: String },
}

pub type Result<T> = std::result::Result<T, MddError>;
