//! Component definitions and their physical output formulas.
//!
//! Components are grouped in categories. A category with several subtypes (branch,
//! load/generator, sensors) stores all its instances in one arena; the subtype is
//! carried by the instance and determines the storage order through [`Subtype::ALL`].

mod appliance;
mod branch;
mod branch3;
mod fault;
mod line;
mod link;
mod load;
mod node;
mod sensor;
mod shunt;
mod source;
mod trans;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

pub use appliance::*;
pub use branch::*;
pub use branch3::*;
pub use fault::*;
pub use line::*;
pub use link::*;
pub use load::*;
pub use node::*;
pub use sensor::*;
pub use shunt::*;
pub use source::*;
pub use trans::*;

/// External component id.
pub type ID = i32;

/// Output record of a component that is not part of any solved group.
pub trait NullOutput {
    /// `energized = false`, every quantity zero.
    fn null_output(id: ID) -> Self;
}

/// Subtype of a component category.
pub trait Subtype: Copy + Eq + Debug + Send + Sync + 'static {
    /// All subtypes of the category in storage order.
    const ALL: &'static [Self];

    /// Position of the subtype in [`Subtype::ALL`].
    fn index(self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BranchKind {
    Line,
    Link,
    Transformer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branch3Kind {
    ThreeWindingTransformer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadGenKind {
    SymGen,
    AsymGen,
    SymLoad,
    AsymLoad,
}

/// Symmetric or asymmetric measurement, shared by voltage and power sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    Sym,
    Asym,
}

impl Subtype for BranchKind {
    const ALL: &'static [Self] = &[BranchKind::Line, BranchKind::Link, BranchKind::Transformer];
    fn index(self) -> usize {
        self as usize
    }
}

impl Subtype for Branch3Kind {
    const ALL: &'static [Self] = &[Branch3Kind::ThreeWindingTransformer];
    fn index(self) -> usize {
        self as usize
    }
}

impl Subtype for LoadGenKind {
    const ALL: &'static [Self] = &[
        LoadGenKind::SymGen,
        LoadGenKind::AsymGen,
        LoadGenKind::SymLoad,
        LoadGenKind::AsymLoad,
    ];
    fn index(self) -> usize {
        self as usize
    }
}

impl Subtype for SensorKind {
    const ALL: &'static [Self] = &[SensorKind::Sym, SensorKind::Asym];
    fn index(self) -> usize {
        self as usize
    }
}

/// Every concrete component type, by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Node,
    Branch(BranchKind),
    Branch3(Branch3Kind),
    Source,
    LoadGen(LoadGenKind),
    Shunt,
    VoltageSensor(SensorKind),
    PowerSensor(SensorKind),
    Fault,
}

/// Terminal side of a two-terminal branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchSide {
    #[default]
    From,
    To,
}
