//! Module defining the [`Node`] stored in the [`Graph`] arena, and the borrowed views used to
//! navigate it.

use std::{fmt, ops::Deref, sync::Arc};

use once_cell::sync::OnceCell;
use tracing::trace;

use super::{Graph, NodeId};
use crate::{
    GraphError, Result,
    layout::Layout,
    primitives::{Primitive, PrimitiveDesc, PrimitiveKind},
    registry::{self, PrimitiveTypeId},
};

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) handle: NodeId,
    pub(crate) desc: Arc<PrimitiveDesc>,
    /// Handles of the dependencies, in the order given by the descriptor.
    pub(crate) dependencies: Vec<NodeId>,
    pub(crate) output_layout: OnceCell<Layout>,
}

impl Node {
    pub(crate) fn new(handle: NodeId, desc: Arc<PrimitiveDesc>, dependencies: Vec<NodeId>) -> Self {
        Self {
            handle,
            desc,
            dependencies,
            output_layout: OnceCell::new(),
        }
    }
}

/// Borrowed view of a node, able to reach its dependencies through the graph.
#[derive(Clone, Copy)]
pub struct NodeRef<'g> {
    graph: &'g Graph,
    node: &'g Node,
}

impl<'g> NodeRef<'g> {
    pub(crate) fn new(graph: &'g Graph, node: &'g Node) -> Self {
        Self { graph, node }
    }

    /// Id of the primitive this node was built from.
    pub fn id(&self) -> &'g str {
        self.node.desc.id()
    }

    pub fn handle(&self) -> NodeId {
        self.node.handle
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.node.desc.kind()
    }

    pub fn primitive(&self) -> &'g PrimitiveDesc {
        &self.node.desc
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn type_id(&self) -> PrimitiveTypeId {
        registry::type_id(self.kind())
    }

    /// The `idx`-th dependency of the node.
    ///
    /// Panics if the node has fewer than `idx + 1` dependencies.
    pub fn dependency(&self, idx: usize) -> NodeRef<'g> {
        self.graph.node_at(self.node.dependencies[idx])
    }

    pub fn dependencies(&self) -> impl Iterator<Item = NodeRef<'g>> + '_ {
        self.node
            .dependencies
            .iter()
            .map(|handle| self.graph.node_at(*handle))
    }

    /// Output layout of the node, computed on first request (after the layouts of all its
    /// dependencies) and cached afterwards.
    pub fn get_output_layout(&self) -> Result<Layout> {
        self.node
            .output_layout
            .get_or_try_init(|| {
                self.calc_output_layout().inspect(|layout| {
                    trace!(node = self.id(), %layout, "output layout computed");
                })
            })
            .copied()
    }

    /// Output layout if it has already been computed.
    pub fn cached_output_layout(&self) -> Option<Layout> {
        self.node.output_layout.get().copied()
    }

    /// Derives the output layout again through the primitive type, bypassing the cache.
    pub fn calc_output_layout(&self) -> Result<Layout> {
        self.type_id().calc_output_layout(*self)
    }
}

/// Renders the diagnostic dump of the node.
impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_id().to_string(*self))
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id())
            .field("handle", &self.handle())
            .field("kind", &self.kind())
            .finish()
    }
}

/// View of a node whose primitive is known to be a `P`.
pub struct TypedNode<'g, P> {
    node: NodeRef<'g>,
    primitive: &'g P,
}

impl<'g, P: Primitive> TypedNode<'g, P> {
    pub fn new(node: NodeRef<'g>) -> Result<Self> {
        let primitive = P::from_desc(node.primitive()).ok_or_else(|| GraphError::KindMismatch {
            node: node.id().to_string(),
            expected: P::KIND,
            found: node.kind(),
        })?;
        Ok(Self { node, primitive })
    }

    pub fn get_primitive(&self) -> &'g P {
        self.primitive
    }

    pub fn node(&self) -> NodeRef<'g> {
        self.node
    }
}

impl<'g, P> Deref for TypedNode<'g, P> {
    type Target = NodeRef<'g>;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}
