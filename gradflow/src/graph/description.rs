//! JSON description of a graph, as authored by users or by an upstream graph builder.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Result, primitives::PrimitiveDesc};

/// List of primitives making up a graph. Each primitive is tagged by its `"type"`:
///
/// ```json
/// {
///   "primitives": [
///     { "type": "input_layout", "id": "grad", "layout": { "data_type": "f32", "format": "bfyx",
///       "extent": { "batch": 4, "feature": 3, "spatial": [7, 7] } } },
///     { "type": "data", "id": "weights", "layout": { "data_type": "f32", "format": "bfyx",
///       "extent": { "feature": 10, "spatial": [1, 1] } } },
///     { "type": "fully_connected_grad_input", "id": "fc_grad", "input": "grad", "weights": "weights" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
    pub primitives: Vec<PrimitiveDesc>,
}

impl GraphDescription {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading graph description");
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
