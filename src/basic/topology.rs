//! Coupling between physical components and the solved mathematical model.
//!
//! These tables are produced by topology construction. Every table is indexed by the
//! canonical position of the component inside its category, which is the order of the
//! component arenas in [`ComponentContainer`](crate::basic::container::ComponentContainer).

use serde::{Deserialize, Serialize};

/// Group index of a component that is not in any solved sub-network.
pub const DISCONNECTED: i64 = -1;

/// Position of a component in the math output: sub-network group and position inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Idx2D {
    pub group: i64,
    pub pos: i64,
}

impl Idx2D {
    pub const DISCONNECTED: Idx2D = Idx2D {
        group: DISCONNECTED,
        pos: DISCONNECTED,
    };

    pub const fn new(group: i64, pos: i64) -> Self {
        Self { group, pos }
    }

    pub fn is_connected(&self) -> bool {
        self.group != DISCONNECTED
    }
}

impl Default for Idx2D {
    fn default() -> Self {
        Self::DISCONNECTED
    }
}

/// Position of a three-winding transformer: one group, one math branch per leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Idx2DBranch3 {
    pub group: i64,
    pub pos: [i64; 3],
}

impl Idx2DBranch3 {
    pub const DISCONNECTED: Idx2DBranch3 = Idx2DBranch3 {
        group: DISCONNECTED,
        pos: [DISCONNECTED; 3],
    };

    pub const fn new(group: i64, pos: [i64; 3]) -> Self {
        Self { group, pos }
    }

    pub fn is_connected(&self) -> bool {
        self.group != DISCONNECTED
    }

    /// Coupling entry of one leg.
    pub fn leg(&self, leg: usize) -> Idx2D {
        Idx2D::new(self.group, self.pos[leg])
    }
}

impl Default for Idx2DBranch3 {
    fn default() -> Self {
        Self::DISCONNECTED
    }
}

/// Coupling table per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentToMathCoupling {
    pub node: Vec<Idx2D>,
    pub branch: Vec<Idx2D>,
    pub branch3: Vec<Idx2DBranch3>,
    pub source: Vec<Idx2D>,
    pub shunt: Vec<Idx2D>,
    pub load_gen: Vec<Idx2D>,
    pub fault: Vec<Idx2D>,
}

/// Auxiliary topology arrays of the sensors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentTopology {
    /// Node index observed by each voltage sensor.
    pub voltage_sensor_node_idx: Vec<usize>,
    /// Index of the measured object inside the category of its terminal type.
    pub power_sensor_object_idx: Vec<usize>,
}
