use crate::{
    Graph,
    layout::Layout,
    primitives::{Data, FullyConnectedGradInput, InputLayout, PrimitiveDesc},
};

/// Graph feeding `grad` and `weights` into a `fc_grad` backward-input node.
pub fn fc_grad_input_graph(input: Layout, weights: Layout) -> Graph {
    Graph::build(vec![
        PrimitiveDesc::InputLayout(InputLayout::new("grad", input)),
        PrimitiveDesc::Data(Data::new("weights", weights)),
        PrimitiveDesc::FullyConnectedGradInput(FullyConnectedGradInput::new(
            "fc_grad", "grad", "weights",
        )),
    ])
    .expect("valid test graph")
}
