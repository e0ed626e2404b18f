use serde::{Deserialize, Serialize};
use serde_json::{Map, json};

use super::{Primitive, PrimitiveDesc, PrimitiveKind};
use crate::{Result, dump, graph::TypedNode, layout::Layout};

/// Tensor fed into the graph from outside. Its layout is fixed by the descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputLayout {
    pub id: String,
    pub layout: Layout,
}

impl InputLayout {
    pub fn new(id: impl Into<String>, layout: Layout) -> Self {
        Self {
            id: id.into(),
            layout,
        }
    }
}

impl Primitive for InputLayout {
    const KIND: PrimitiveKind = PrimitiveKind::InputLayout;

    fn id(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> Vec<&str> {
        vec![]
    }

    fn from_desc(desc: &PrimitiveDesc) -> Option<&Self> {
        match desc {
            PrimitiveDesc::InputLayout(p) => Some(p),
            _ => None,
        }
    }

    fn calc_output_layout(node: &TypedNode<'_, Self>) -> Result<Layout> {
        Ok(node.get_primitive().layout)
    }

    fn to_string(node: &TypedNode<'_, Self>) -> String {
        let mut info = Map::new();
        info.insert("layout".to_string(), json!(node.get_primitive().layout.to_string()));
        dump::render_with_section(node, "input layout info", info)
    }
}
