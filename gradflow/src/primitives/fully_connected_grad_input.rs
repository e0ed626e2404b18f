//! The backward-input operator of a fully connected layer: it propagates the error signal
//! from the layer output back to the layer input.

use serde::{Deserialize, Serialize};
use serde_json::{Map, json};

use super::{Primitive, PrimitiveDesc, PrimitiveKind};
use crate::{
    Result, dump,
    error::ensure_equal,
    graph::{NodeRef, TypedNode},
    layout::{Extent, Layout},
};

/// Gradient of a fully connected layer with respect to its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullyConnectedGradInput {
    pub id: String,
    /// Id of the gradient flowing back from the layer output.
    pub input: String,
    /// Id of the weights of the forward layer.
    pub weights: String,
}

impl FullyConnectedGradInput {
    pub fn new(
        id: impl Into<String>,
        input: impl Into<String>,
        weights: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            input: input.into(),
            weights: weights.into(),
        }
    }

    /// Output layout of the operator given its input and weights layouts.
    ///
    /// Storage convention (data type and format) and batch come from the input, while the
    /// feature and spatial axes come from the weights, which encode the shape of the forward
    /// layer's input. This never fails, even for degenerate extents.
    pub fn infer_layout(input: &Layout, weights: &Layout) -> Layout {
        Layout::new(
            input.data_type,
            input.format,
            Extent::from_axes(input.extent.batch, weights.extent.feature, weights.extent.spatial),
        )
    }
}

impl<'g> TypedNode<'g, FullyConnectedGradInput> {
    pub fn input(&self) -> NodeRef<'g> {
        self.dependency(0)
    }

    pub fn weights(&self) -> NodeRef<'g> {
        self.dependency(1)
    }
}

impl Primitive for FullyConnectedGradInput {
    const KIND: PrimitiveKind = PrimitiveKind::FullyConnectedGradInput;

    fn id(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> Vec<&str> {
        vec![&self.input, &self.weights]
    }

    fn from_desc(desc: &PrimitiveDesc) -> Option<&Self> {
        match desc {
            PrimitiveDesc::FullyConnectedGradInput(p) => Some(p),
            _ => None,
        }
    }

    fn calc_output_layout(node: &TypedNode<'_, Self>) -> Result<Layout> {
        let input_layout = node.input().get_output_layout()?;
        let weights_layout = node.weights().get_output_layout()?;
        Ok(Self::infer_layout(&input_layout, &weights_layout))
    }

    fn to_string(node: &TypedNode<'_, Self>) -> String {
        let mut fc_info = Map::new();
        fc_info.insert(
            "weights id".to_string(),
            json!(node.get_primitive().weights),
        );
        dump::render_with_section(node, "fully connected grad input info", fc_info)
    }

    /// Only the ranks are compared, not the individual axes.
    fn validate_instance(node: &TypedNode<'_, Self>, output: &Layout) -> Result<()> {
        let input_layout = node.input().get_output_layout()?;
        ensure_equal(
            node.id(),
            "Input size",
            input_layout.extent.rank(),
            "output size",
            output.extent.rank(),
            "",
        )
    }
}
