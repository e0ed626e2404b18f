//! Module contains the descriptors of every primitive kind the graph knows about, and the
//! [`Primitive`] trait each of them implements.

use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    graph::TypedNode,
    layout::Layout,
    registry::{self, PrimitiveTypeId},
};

pub use data::Data;
pub use fully_connected::FullyConnected;
pub use fully_connected_grad_input::FullyConnectedGradInput;
pub use input_layout::InputLayout;

mod data;
mod fully_connected;
mod fully_connected_grad_input;
mod input_layout;

/// Tag identifying the kind of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    InputLayout,
    Data,
    FullyConnected,
    FullyConnectedGradInput,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 4] = [
        PrimitiveKind::InputLayout,
        PrimitiveKind::Data,
        PrimitiveKind::FullyConnected,
        PrimitiveKind::FullyConnectedGradInput,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::InputLayout => "input_layout",
            PrimitiveKind::Data => "data",
            PrimitiveKind::FullyConnected => "fully_connected",
            PrimitiveKind::FullyConnectedGradInput => "fully_connected_grad_input",
        }
    }

    /// Position of the kind in [`PrimitiveKind::ALL`].
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Behaviour shared by all primitive descriptors.
///
/// The associated functions taking a [`TypedNode`] form the kind-specific part of the
/// primitive type: they are reached through [`registry::type_id`] by code that does not know
/// the concrete kind.
pub trait Primitive: Debug + Send + Sync + Sized + 'static {
    const KIND: PrimitiveKind;

    /// Id of the primitive, unique within a graph.
    fn id(&self) -> &str;

    /// Ids of the primitives whose outputs this one reads, in input order.
    fn dependencies(&self) -> Vec<&str>;

    /// Returns the descriptor if `desc` is of this kind.
    fn from_desc(desc: &PrimitiveDesc) -> Option<&Self>;

    /// Derives the output layout of `node` from the layouts of its dependencies.
    fn calc_output_layout(node: &TypedNode<'_, Self>) -> Result<Layout>;

    /// Renders the diagnostic dump of `node`.
    fn to_string(node: &TypedNode<'_, Self>) -> String;

    /// Structural checks run when an instance is created for `node`, given the freshly
    /// derived `output` layout.
    fn validate_instance(_node: &TypedNode<'_, Self>, _output: &Layout) -> Result<()> {
        Ok(())
    }

    /// The process-wide type object of this kind.
    fn type_id() -> PrimitiveTypeId {
        registry::type_id(Self::KIND)
    }
}

/// A primitive descriptor of any kind, as authored in a graph description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrimitiveDesc {
    InputLayout(InputLayout),
    Data(Data),
    FullyConnected(FullyConnected),
    FullyConnectedGradInput(FullyConnectedGradInput),
}

impl PrimitiveDesc {
    pub fn id(&self) -> &str {
        match self {
            PrimitiveDesc::InputLayout(p) => p.id(),
            PrimitiveDesc::Data(p) => p.id(),
            PrimitiveDesc::FullyConnected(p) => p.id(),
            PrimitiveDesc::FullyConnectedGradInput(p) => p.id(),
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveDesc::InputLayout(_) => InputLayout::KIND,
            PrimitiveDesc::Data(_) => Data::KIND,
            PrimitiveDesc::FullyConnected(_) => FullyConnected::KIND,
            PrimitiveDesc::FullyConnectedGradInput(_) => FullyConnectedGradInput::KIND,
        }
    }

    pub fn dependencies(&self) -> Vec<&str> {
        match self {
            PrimitiveDesc::InputLayout(p) => p.dependencies(),
            PrimitiveDesc::Data(p) => p.dependencies(),
            PrimitiveDesc::FullyConnected(p) => p.dependencies(),
            PrimitiveDesc::FullyConnectedGradInput(p) => p.dependencies(),
        }
    }
}
