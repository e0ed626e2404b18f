//! The [`Graph`]: an arena of nodes built from primitive descriptors, where edges are
//! [`NodeId`] handles into the arena.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use derive_more::{Display, From};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::{GraphError, Result, primitives::PrimitiveDesc};

pub use description::GraphDescription;
pub(crate) use node::Node;
pub use node::{NodeRef, TypedNode};

mod description;
mod node;

/// Position of a node in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
pub struct NodeId(usize);

#[derive(Debug)]
pub struct Graph {
    /// Nodes, in the order their primitives were given
    nodes: Vec<Node>,
    ids: HashMap<String, NodeId>,
    /// Every node appears after all of its dependencies
    order: Vec<NodeId>,
}

impl Graph {
    /// Builds the graph, resolving the dependencies of every primitive by id.
    ///
    /// Fails if two primitives share an id, if a dependency names no primitive of the
    /// graph, or if the dependencies form a cycle.
    #[instrument(skip_all, level = "debug")]
    pub fn build(primitives: impl IntoIterator<Item = PrimitiveDesc>) -> Result<Self> {
        let descs = primitives.into_iter().map(Arc::new).collect_vec();

        let mut ids = HashMap::with_capacity(descs.len());
        for (i, desc) in descs.iter().enumerate() {
            if ids.insert(desc.id().to_string(), NodeId(i)).is_some() {
                return Err(GraphError::DuplicateId(desc.id().to_string()));
            }
        }

        let nodes = descs
            .into_iter()
            .enumerate()
            .map(|(i, desc)| {
                let dependencies = desc
                    .dependencies()
                    .into_iter()
                    .map(|dep| {
                        ids.get(dep).copied().ok_or_else(|| GraphError::UnknownDependency {
                            node: desc.id().to_string(),
                            dependency: dep.to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Node::new(NodeId(i), desc, dependencies))
            })
            .collect::<Result<Vec<_>>>()?;

        let order = topological_order(&nodes)?;
        debug!(nodes = nodes.len(), "graph built");
        Ok(Self { nodes, ids, order })
    }

    pub fn from_description(description: GraphDescription) -> Result<Self> {
        Self::build(description.primitives)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node by primitive id.
    pub fn node(&self, id: &str) -> Option<NodeRef<'_>> {
        self.ids.get(id).map(|handle| self.node_at(*handle))
    }

    pub(crate) fn node_at(&self, handle: NodeId) -> NodeRef<'_> {
        NodeRef::new(self, &self.nodes[handle.0])
    }

    /// Nodes in the order their primitives were given.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.nodes.iter().map(|node| NodeRef::new(self, node))
    }

    /// Nodes ordered so that each comes after all of its dependencies.
    pub fn topological_order(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.order.iter().map(|handle| self.node_at(*handle))
    }

    /// Computes the output layout of every node, dependencies first.
    #[instrument(skip_all, level = "debug")]
    pub fn finalize_layouts(&self) -> Result<()> {
        for node in self.topological_order() {
            let layout = node.get_output_layout()?;
            debug!(node = node.id(), %layout, "layout finalized");
        }
        Ok(())
    }

    /// Diagnostic dumps of all nodes in topological order, one after the other.
    pub fn dump_all(&self) -> String {
        self.topological_order()
            .map(|node| node.to_string())
            .join("\n")
    }
}

/// Kahn's algorithm. Ties are broken by insertion order, so the result is deterministic.
fn topological_order(nodes: &[Node]) -> Result<Vec<NodeId>> {
    let mut in_degree = nodes.iter().map(|n| n.dependencies.len()).collect_vec();
    let mut users = vec![vec![]; nodes.len()];
    for node in nodes {
        for dep in &node.dependencies {
            users[dep.0].push(node.handle);
        }
    }

    let mut ready: VecDeque<NodeId> = nodes
        .iter()
        .filter(|n| n.dependencies.is_empty())
        .map(|n| n.handle)
        .collect();
    let mut order = Vec::with_capacity(nodes.len());
    while let Some(handle) = ready.pop_front() {
        order.push(handle);
        for user in &users[handle.0] {
            in_degree[user.0] -= 1;
            if in_degree[user.0] == 0 {
                ready.push_back(*user);
            }
        }
    }

    if order.len() < nodes.len() {
        let stuck = nodes
            .iter()
            .filter(|n| in_degree[n.handle.0] > 0)
            .map(|n| n.desc.id().to_string())
            .collect();
        return Err(GraphError::Cycle(stuck));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        layout::{DataType, Extent, Format, Layout},
        primitives::{Data, FullyConnected, FullyConnectedGradInput, InputLayout},
        testing::fc_grad_input_graph,
    };

    fn layout() -> Layout {
        Layout::new(DataType::F32, Format::Bfyx, Extent::new(1, 2, 3, 4))
    }

    #[test]
    fn test_duplicate_id() {
        let err = Graph::build(vec![
            PrimitiveDesc::Data(Data::new("w", layout())),
            PrimitiveDesc::InputLayout(InputLayout::new("w", layout())),
        ])
        .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateId(id) if id == "w"));
    }

    #[test]
    fn test_unknown_dependency() {
        let err = Graph::build(vec![
            PrimitiveDesc::InputLayout(InputLayout::new("x", layout())),
            PrimitiveDesc::FullyConnectedGradInput(FullyConnectedGradInput::new(
                "fc_grad", "x", "missing",
            )),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnknownDependency { node, dependency } if node == "fc_grad" && dependency == "missing"
        ));
    }

    #[test]
    fn test_cycle() {
        let err = Graph::build(vec![
            PrimitiveDesc::Data(Data::new("w", layout())),
            PrimitiveDesc::FullyConnected(FullyConnected::new("a", "b", "w")),
            PrimitiveDesc::FullyConnected(FullyConnected::new("b", "a", "w")),
        ])
        .unwrap_err();
        assert!(matches!(err, GraphError::Cycle(ids) if ids == vec!["a", "b"]));
    }

    #[test]
    fn test_dependencies_come_first_in_order() {
        // declared out of order on purpose
        let graph = Graph::build(vec![
            PrimitiveDesc::FullyConnectedGradInput(FullyConnectedGradInput::new(
                "fc_grad", "x", "w",
            )),
            PrimitiveDesc::Data(Data::new("w", layout())),
            PrimitiveDesc::InputLayout(InputLayout::new("x", layout())),
        ])
        .unwrap();
        let order = graph.topological_order().map(|n| n.id()).collect_vec();
        assert_eq!(order, vec!["w", "x", "fc_grad"]);
        let declared = graph.nodes().map(|n| n.id()).collect_vec();
        assert_eq!(declared, vec!["fc_grad", "w", "x"]);
    }

    #[test]
    fn test_same_node_as_input_and_weights() {
        let graph = Graph::build(vec![
            PrimitiveDesc::InputLayout(InputLayout::new("x", layout())),
            PrimitiveDesc::FullyConnectedGradInput(FullyConnectedGradInput::new(
                "fc_grad", "x", "x",
            )),
        ])
        .unwrap();
        assert_eq!(graph.topological_order().count(), 2);
        let node = graph.node("fc_grad").unwrap();
        assert_eq!(node.dependencies().map(|n| n.id()).collect_vec(), vec!["x", "x"]);
    }

    #[test]
    fn test_layout_is_computed_lazily_through_dependencies() {
        let graph = fc_grad_input_graph(layout(), layout());
        let node = graph.node("fc_grad").unwrap();
        assert!(node.cached_output_layout().is_none());
        assert!(graph.node("grad").unwrap().cached_output_layout().is_none());

        let output = node.get_output_layout().unwrap();
        assert_eq!(node.cached_output_layout(), Some(output));
        assert_eq!(
            graph.node("grad").unwrap().cached_output_layout(),
            Some(layout())
        );
    }

    #[test]
    fn test_finalize_layouts_fills_every_node() {
        let graph = fc_grad_input_graph(layout(), layout());
        graph.finalize_layouts().unwrap();
        assert!(graph.nodes().all(|n| n.cached_output_layout().is_some()));
    }

    #[test]
    fn test_empty_graph() {
        let graph = Graph::build(vec![]).unwrap();
        assert!(graph.is_empty());
        assert!(graph.finalize_layouts().is_ok());
        assert_eq!(graph.dump_all(), "");
    }
}
