//! Diagnostic dumps of graph nodes, used by graph inspection tooling.
//!
//! A dump is a JSON object holding the identity of the node (id, type, dependencies and
//! output layout, `null` until computed) plus one section of kind-specific parameters.

use serde_json::{Map, Value, json};

use crate::graph::NodeRef;

/// Identity document of `node`, common to all primitive kinds.
pub fn desc_to_json(node: &NodeRef<'_>) -> Map<String, Value> {
    let mut doc = Map::new();
    doc.insert("id".to_string(), json!(node.id()));
    doc.insert("type".to_string(), json!(node.kind().name()));
    doc.insert(
        "dependencies".to_string(),
        Value::Array(node.dependencies().map(|dep| json!(dep.id())).collect()),
    );
    doc.insert(
        "output layout".to_string(),
        json!(node.cached_output_layout().map(|layout| layout.to_string())),
    );
    doc
}

/// Renders a document as indented text.
pub fn render(doc: Map<String, Value>) -> String {
    format!("{:#}", Value::Object(doc))
}

/// Renders the identity document of `node` extended with the section `name`.
pub fn render_with_section(node: &NodeRef<'_>, name: &str, section: Map<String, Value>) -> String {
    let mut doc = desc_to_json(node);
    doc.insert(name.to_string(), Value::Object(section));
    render(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        layout::{DataType, Extent, Format, Layout},
        testing::fc_grad_input_graph,
    };

    fn graph() -> crate::Graph {
        fc_grad_input_graph(
            Layout::new(DataType::F32, Format::Bfyx, Extent::new(4, 3, 7, 7)),
            Layout::new(DataType::F32, Format::Bfyx, Extent::new(3, 10, 1, 1)),
        )
    }

    #[test]
    fn test_identity_document() {
        let graph = graph();
        let doc = desc_to_json(&graph.node("fc_grad").unwrap());
        assert_eq!(doc["id"], "fc_grad");
        assert_eq!(doc["type"], "fully_connected_grad_input");
        assert_eq!(doc["dependencies"], json!(["grad", "weights"]));
        assert_eq!(doc["output layout"], Value::Null);
    }

    #[test]
    fn test_layout_appears_once_computed() {
        let graph = graph();
        graph.finalize_layouts().unwrap();
        let doc = desc_to_json(&graph.node("fc_grad").unwrap());
        assert_eq!(doc["output layout"], "f32 bfyx 4x10x1x1");
    }

    #[test]
    fn test_keys_are_stable_across_finalization() {
        let graph = graph();
        let keys = |graph: &crate::Graph| -> Vec<String> {
            desc_to_json(&graph.node("fc_grad").unwrap())
                .keys()
                .cloned()
                .collect()
        };
        let before = keys(&graph);
        graph.finalize_layouts().unwrap();
        assert_eq!(before, keys(&graph));
        assert_eq!(before, ["id", "type", "dependencies", "output layout"]);
    }

    #[test]
    fn test_sections_keep_insertion_order() {
        let graph = graph();
        let text = graph.node("fc_grad").unwrap().to_string();
        let id = text.find("\"id\"").unwrap();
        let section = text.find("\"fully connected grad input info\"").unwrap();
        assert!(id < section);
        assert!(text.contains("\"weights id\": \"weights\""));
    }

    #[test]
    fn test_dump_all_covers_every_node() {
        let graph = graph();
        let text = graph.dump_all();
        assert!(text.contains("\"input layout info\""));
        assert!(text.contains("\"data info\""));
        assert!(text.contains("\"fully connected grad input info\""));
    }

    #[test]
    fn test_dump_of_oversized_data_reports_null_bytes() {
        let huge = Extent::new(65536, 65536, 65536, 65536);
        let graph = fc_grad_input_graph(
            Layout::new(DataType::F32, Format::Bfyx, huge),
            Layout::new(DataType::F32, Format::Bfyx, huge),
        );
        graph.finalize_layouts().unwrap();
        assert!(graph.dump_all().contains("\"data info\""));

        let text = graph.node("weights").unwrap().to_string();
        let doc: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["data info"]["bytes"], Value::Null);
        assert_eq!(
            doc["data info"]["layout"],
            "f32 bfyx 65536x65536x65536x65536"
        );
    }

    #[test]
    fn test_dump_of_data_reports_bytes() {
        let graph = graph();
        let text = graph.node("weights").unwrap().to_string();
        let doc: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["data info"]["bytes"], 3 * 10 * 4);
    }
}
