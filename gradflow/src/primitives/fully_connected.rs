use serde::{Deserialize, Serialize};
use serde_json::{Map, json};

use super::{Primitive, PrimitiveDesc, PrimitiveKind};
use crate::{
    Result, dump,
    error::ensure_equal,
    graph::{NodeRef, TypedNode},
    layout::{Extent, Layout},
};

/// Forward fully connected layer. Each output feature is a dot product between the flattened
/// input and one slice of the weights, so the weights batch axis counts output features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullyConnected {
    pub id: String,
    pub input: String,
    pub weights: String,
}

impl FullyConnected {
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

    pub fn infer_layout(input: &Layout, weights: &Layout) -> Layout {
        Layout::new(
            input.data_type,
            input.format,
            Extent::from_axes(input.extent.batch, weights.extent.batch, [Some(1), Some(1)]),
        )
    }
}

impl<'g> TypedNode<'g, FullyConnected> {
    pub fn input(&self) -> NodeRef<'g> {
        self.dependency(0)
    }

    pub fn weights(&self) -> NodeRef<'g> {
        self.dependency(1)
    }
}

impl Primitive for FullyConnected {
    const KIND: PrimitiveKind = PrimitiveKind::FullyConnected;

    fn id(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> Vec<&str> {
        vec![&self.input, &self.weights]
    }

    fn from_desc(desc: &PrimitiveDesc) -> Option<&Self> {
        match desc {
            PrimitiveDesc::FullyConnected(p) => Some(p),
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
        dump::render_with_section(node, "fully connected info", fc_info)
    }

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        FullyConnectedGradInput, Graph, Network,
        layout::{DataType, Format},
        primitives::{Data, InputLayout},
    };

    #[test]
    fn test_weights_batch_becomes_output_feature() {
        let input = Layout::new(DataType::F32, Format::Bfyx, Extent::new(4, 3, 7, 7));
        let weights = Layout::new(DataType::F32, Format::Bfyx, Extent::new(10, 3, 7, 7));
        let output = FullyConnected::infer_layout(&input, &weights);
        assert_eq!(
            output,
            Layout::new(DataType::F32, Format::Bfyx, Extent::new(4, 10, 1, 1))
        );
    }

    #[test]
    fn test_forward_and_backward_share_weights() {
        let activation = Layout::new(DataType::F32, Format::Bfyx, Extent::new(4, 3, 7, 7));
        let weights = Layout::new(DataType::F32, Format::Bfyx, Extent::new(10, 3, 7, 7));
        let graph = Graph::build(vec![
            PrimitiveDesc::InputLayout(InputLayout::new("x", activation)),
            PrimitiveDesc::Data(Data::new("w", weights)),
            PrimitiveDesc::FullyConnected(FullyConnected::new("fc", "x", "w")),
            PrimitiveDesc::FullyConnectedGradInput(FullyConnectedGradInput::new(
                "fc_grad", "fc", "w",
            )),
        ])
        .unwrap();
        graph.finalize_layouts().unwrap();

        let grad = graph.node("fc_grad").unwrap().get_output_layout().unwrap();
        // the gradient has the shape of the forward input
        assert_eq!(grad, activation);
        assert!(Network::build(&graph).is_ok());
    }
}
