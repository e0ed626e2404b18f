use serde::{Deserialize, Serialize};
use serde_json::{Map, json};

use super::{Primitive, PrimitiveDesc, PrimitiveKind};
use crate::{Result, dump, graph::TypedNode, layout::Layout};

/// Constant memory owned by the graph, e.g. the weights of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data {
    pub id: String,
    pub layout: Layout,
}

impl Data {
    pub fn new(id: impl Into<String>, layout: Layout) -> Self {
        Self {
            id: id.into(),
            layout,
        }
    }
}

impl Primitive for Data {
    const KIND: PrimitiveKind = PrimitiveKind::Data;

    fn id(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> Vec<&str> {
        vec![]
    }

    fn from_desc(desc: &PrimitiveDesc) -> Option<&Self> {
        match desc {
            PrimitiveDesc::Data(p) => Some(p),
            _ => None,
        }
    }

    fn calc_output_layout(node: &TypedNode<'_, Self>) -> Result<Layout> {
        Ok(node.get_primitive().layout)
    }

    fn to_string(node: &TypedNode<'_, Self>) -> String {
        let layout = node.get_primitive().layout;
        let mut info = Map::new();
        info.insert("layout".to_string(), json!(layout.to_string()));
        info.insert("bytes".to_string(), json!(layout.bytes_count()));
        dump::render_with_section(node, "data info", info)
    }
}
