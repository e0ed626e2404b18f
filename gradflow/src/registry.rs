//! Process-wide registry holding exactly one type object per [`PrimitiveKind`].
//!
//! The type object is the entry point for everything kind-specific: layout inference,
//! instance creation and diagnostics. [`type_id`] hands out a [`PrimitiveTypeId`] token
//! referring to it, so graph code can dispatch on a node without knowing its concrete kind.

use std::{fmt, hash::Hash, marker::PhantomData, ops::Deref};

use once_cell::sync::{Lazy, OnceCell};
use tracing::{debug, warn};

use crate::{
    Result, dump,
    graph::{NodeRef, TypedNode},
    layout::Layout,
    network::{Network, PrimitiveInst},
    primitives::{
        Data, FullyConnected, FullyConnectedGradInput, InputLayout, Primitive, PrimitiveKind,
    },
};

/// Kind-specific behaviour of a primitive, behind a trait object.
pub trait PrimitiveType: Send + Sync {
    fn kind(&self) -> PrimitiveKind;

    /// Derives the output layout of `node` from its dependencies. Calling it repeatedly on
    /// an unchanged graph always yields the same layout.
    fn calc_output_layout(&self, node: NodeRef<'_>) -> Result<Layout>;

    /// Creates the instance of `node` bound to `network`, re-deriving and validating its
    /// output layout.
    fn create_instance(&self, network: &Network<'_>, node: NodeRef<'_>) -> Result<PrimitiveInst>;

    /// Renders the diagnostic dump of `node`.
    fn to_string(&self, node: NodeRef<'_>) -> String;
}

/// Adapter implementing [`PrimitiveType`] on top of the typed functions of a [`Primitive`].
pub struct PrimitiveTypeBase<P>(PhantomData<fn() -> P>);

impl<P> PrimitiveTypeBase<P> {
    fn new() -> Self {
        Self(PhantomData)
    }
}

impl<P: Primitive> PrimitiveType for PrimitiveTypeBase<P> {
    fn kind(&self) -> PrimitiveKind {
        P::KIND
    }

    fn calc_output_layout(&self, node: NodeRef<'_>) -> Result<Layout> {
        let node = TypedNode::<P>::new(node)?;
        P::calc_output_layout(&node)
    }

    fn create_instance(&self, network: &Network<'_>, node: NodeRef<'_>) -> Result<PrimitiveInst> {
        let node = TypedNode::<P>::new(node)?;
        let output_layout = P::calc_output_layout(&node)?;
        P::validate_instance(&node, &output_layout)?;
        Ok(PrimitiveInst::new(
            network.id(),
            node.handle(),
            P::KIND,
            output_layout,
        ))
    }

    fn to_string(&self, node: NodeRef<'_>) -> String {
        match TypedNode::<P>::new(node) {
            Ok(node) => P::to_string(&node),
            Err(err) => {
                warn!(%err, "dumping node through a foreign primitive type");
                dump::render(dump::desc_to_json(&node))
            }
        }
    }
}

/// Identity token of a primitive kind. Tokens compare equal iff they name the same kind, and
/// every token of a kind refers to the same type object for the lifetime of the process.
#[derive(Clone, Copy)]
pub struct PrimitiveTypeId(&'static dyn PrimitiveType);

impl PrimitiveTypeId {
    /// Whether both tokens refer to the very same type object.
    pub fn same_object(&self, other: &PrimitiveTypeId) -> bool {
        std::ptr::addr_eq(self.0, other.0)
    }
}

impl Deref for PrimitiveTypeId {
    type Target = dyn PrimitiveType;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl PartialEq for PrimitiveTypeId {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl Eq for PrimitiveTypeId {}

impl Hash for PrimitiveTypeId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.kind().hash(state);
    }
}

impl fmt::Debug for PrimitiveTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrimitiveTypeId")
            .field(&self.0.kind())
            .finish()
    }
}

/// Table of lazily created type objects, one slot per kind.
struct TypeRegistry {
    slots: [OnceCell<Box<dyn PrimitiveType>>; PrimitiveKind::ALL.len()],
}

impl TypeRegistry {
    fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| OnceCell::new()),
        }
    }

    /// Type object of `kind`, created by the first caller. Concurrent first callers block
    /// until it is published and all get the same object.
    fn get(&self, kind: PrimitiveKind) -> &dyn PrimitiveType {
        &**self.slots[kind.index()].get_or_init(|| create_type(kind))
    }
}

static REGISTRY: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::new);

fn create_type(kind: PrimitiveKind) -> Box<dyn PrimitiveType> {
    debug!(%kind, "creating primitive type");
    match kind {
        PrimitiveKind::InputLayout => Box::new(PrimitiveTypeBase::<InputLayout>::new()),
        PrimitiveKind::Data => Box::new(PrimitiveTypeBase::<Data>::new()),
        PrimitiveKind::FullyConnected => Box::new(PrimitiveTypeBase::<FullyConnected>::new()),
        PrimitiveKind::FullyConnectedGradInput => {
            Box::new(PrimitiveTypeBase::<FullyConnectedGradInput>::new())
        }
    }
}

/// Returns the token of `kind`, creating its type object on first use.
///
/// Safe to call concurrently: racing first callers all observe the same object.
pub fn type_id(kind: PrimitiveKind) -> PrimitiveTypeId {
    PrimitiveTypeId(REGISTRY.get(kind))
}
