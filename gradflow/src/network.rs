//! Binding of a [`Graph`] to an execution context.
//!
//! Building a [`Network`] creates one [`PrimitiveInst`] per node. Each instance certifies,
//! once and for all, that the layout derived for its node is consistent with its inputs.

use std::sync::atomic::{AtomicU32, Ordering};

use derive_more::Display;
use tracing::{debug, instrument};

use crate::{
    Result,
    graph::{Graph, NodeId, NodeRef},
    layout::Layout,
    primitives::PrimitiveKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("network#{_0}")]
pub struct NetworkId(u32);

static NEXT_NETWORK_ID: AtomicU32 = AtomicU32::new(0);

impl NetworkId {
    fn next() -> Self {
        Self(NEXT_NETWORK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A node bound to a network, holding the layout validated at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveInst {
    network: NetworkId,
    node: NodeId,
    kind: PrimitiveKind,
    output_layout: Layout,
}

impl PrimitiveInst {
    pub(crate) fn new(
        network: NetworkId,
        node: NodeId,
        kind: PrimitiveKind,
        output_layout: Layout,
    ) -> Self {
        Self {
            network,
            node,
            kind,
            output_layout,
        }
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn output_layout(&self) -> &Layout {
        &self.output_layout
    }
}

#[derive(Debug)]
pub struct Network<'g> {
    id: NetworkId,
    graph: &'g Graph,
    /// Instances in the topological order of the graph
    instances: Vec<PrimitiveInst>,
}

impl<'g> Network<'g> {
    /// An empty network over `graph`, with a fresh id.
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            id: NetworkId::next(),
            graph,
            instances: Vec::new(),
        }
    }

    /// Creates a network and an instance for every node of `graph`, dependencies first.
    /// Stops at the first node whose instance cannot be created.
    #[instrument(skip_all, level = "debug")]
    pub fn build(graph: &'g Graph) -> Result<Self> {
        let mut network = Self::new(graph);
        for node in graph.topological_order() {
            let inst = network.create_instance(node)?;
            network.instances.push(inst);
        }
        debug!(network = %network.id, instances = network.instances.len(), "network built");
        Ok(network)
    }

    /// Creates the instance of `node` for this network, through the type of the node.
    pub fn create_instance(&self, node: NodeRef<'_>) -> Result<PrimitiveInst> {
        node.type_id().create_instance(self, node)
    }

    pub fn id(&self) -> NetworkId {
        self.id
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn instances(&self) -> &[PrimitiveInst] {
        &self.instances
    }

    /// The instance of the node built from primitive `id`.
    pub fn instance(&self, id: &str) -> Option<&PrimitiveInst> {
        let handle = self.graph.node(id)?.handle();
        self.instances.iter().find(|inst| inst.node == handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        GraphError,
        layout::{DataType, Extent, Format},
        testing::fc_grad_input_graph,
    };

    fn f32_bfyx(extent: Extent) -> Layout {
        Layout::new(DataType::F32, Format::Bfyx, extent)
    }

    #[test]
    fn test_build_creates_instance_per_node() {
        let graph = fc_grad_input_graph(
            f32_bfyx(Extent::new(4, 3, 7, 7)),
            f32_bfyx(Extent::new(3, 10, 1, 1)),
        );
        let network = Network::build(&graph).unwrap();
        assert_eq!(network.instances().len(), graph.len());
        assert!(network.instances().iter().all(|i| i.network() == network.id()));

        let inst = network.instance("fc_grad").unwrap();
        assert_eq!(inst.kind(), PrimitiveKind::FullyConnectedGradInput);
        assert_eq!(inst.node(), graph.node("fc_grad").unwrap().handle());
        assert_eq!(inst.output_layout(), &f32_bfyx(Extent::new(4, 10, 1, 1)));
        assert!(network.instance("nope").is_none());
    }

    #[test]
    fn test_networks_get_distinct_ids() {
        let graph = fc_grad_input_graph(
            f32_bfyx(Extent::new(1, 1, 1, 1)),
            f32_bfyx(Extent::new(1, 1, 1, 1)),
        );
        let a = Network::build(&graph).unwrap();
        let b = Network::build(&graph).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(
            a.instance("fc_grad").unwrap().output_layout(),
            b.instance("fc_grad").unwrap().output_layout()
        );
    }

    #[test]
    fn test_instance_rederives_layout() {
        let graph = fc_grad_input_graph(
            f32_bfyx(Extent::new(4, 3, 7, 7)),
            f32_bfyx(Extent::new(3, 10, 1, 1)),
        );
        let node = graph.node("fc_grad").unwrap();
        let network = Network::new(&graph);
        // nothing was cached before the instance was created
        assert!(node.cached_output_layout().is_none());
        let inst = network.create_instance(node).unwrap();
        assert_eq!(inst.output_layout(), &node.get_output_layout().unwrap());
    }

    #[test]
    fn test_build_stops_on_invalid_node() {
        let graph = fc_grad_input_graph(
            f32_bfyx(Extent::new(4, 3, 7, 7)),
            f32_bfyx(Extent::from_axes(None, Some(10), [None, None])),
        );
        let err = Network::build(&graph).unwrap_err();
        assert!(matches!(err, GraphError::NotEqual { ref node_id, .. } if node_id == "fc_grad"));
        assert_eq!(
            err.to_string(),
            "fc_grad: Input size (4) is not equal to output size (2)"
        );
    }
}
