//! Output layout inference and validation for the primitives of a static neural-network
//! dataflow graph.
//!
//! Every primitive kind implements [`Primitive`]: it derives its output [`Layout`] from the
//! layouts of its dependencies, checks structural invariants when a [`Network`] instance is
//! created for it, and renders a diagnostic dump. The [`registry`] holds one type object per
//! kind, through which the [`Graph`] dispatches without knowing concrete kinds.

pub mod dump;
pub mod error;
pub mod graph;
pub mod layout;
pub mod network;
pub mod primitives;
pub mod registry;
#[cfg(test)]
mod testing;

pub use error::{GraphError, Result};
pub use graph::{Graph, GraphDescription, NodeId, NodeRef, TypedNode};
pub use layout::{DataType, Extent, Format, Layout};
pub use network::{Network, NetworkId, PrimitiveInst};
pub use primitives::{
    Data, FullyConnected, FullyConnectedGradInput, InputLayout, Primitive, PrimitiveDesc,
    PrimitiveKind,
};
pub use registry::{PrimitiveType, PrimitiveTypeId, type_id};
