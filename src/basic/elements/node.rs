use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::basic::phase::{Asymmetric, PhaseMode, SQRT3};

use super::{ID, NullOutput};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeInput {
    pub id: ID,
    /// Rated line-to-line voltage (V).
    pub u_rated: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    id: ID,
    u_rated: f64,
}

impl From<&NodeInput> for Node {
    fn from(input: &NodeInput) -> Self {
        Self {
            id: input.id,
            u_rated: input.u_rated,
        }
    }
}

/// Node voltage and injected power. Voltages are line-to-line in symmetric mode and
/// line-to-neutral per phase in asymmetric mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeOutput<S: PhaseMode> {
    pub id: ID,
    pub energized: bool,
    pub u_pu: S::Real,
    pub u: S::Real,
    pub u_angle: S::Real,
    pub p: S::Real,
    pub q: S::Real,
}

impl<S: PhaseMode> NullOutput for NodeOutput<S> {
    fn null_output(id: ID) -> Self {
        Self {
            id,
            energized: false,
            u_pu: S::real_zero(),
            u: S::real_zero(),
            u_angle: S::real_zero(),
            p: S::real_zero(),
            q: S::real_zero(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeShortCircuitOutput {
    pub id: ID,
    pub energized: bool,
    pub u_pu: Vector3<f64>,
    pub u: Vector3<f64>,
    pub u_angle: Vector3<f64>,
}

impl NullOutput for NodeShortCircuitOutput {
    fn null_output(id: ID) -> Self {
        Self {
            id,
            energized: false,
            u_pu: Vector3::zeros(),
            u: Vector3::zeros(),
            u_angle: Vector3::zeros(),
        }
    }
}

impl Node {
    pub fn id(&self) -> ID {
        self.id
    }

    pub fn u_rated(&self) -> f64 {
        self.u_rated
    }

    pub fn output<S: PhaseMode>(&self, u_pu: &S::Complex, bus_injection: &S::Complex) -> NodeOutput<S> {
        let u_abs = S::cabs(u_pu);
        NodeOutput {
            id: self.id,
            energized: true,
            u_pu: u_abs,
            u: u_abs * S::voltage_base(self.u_rated),
            u_angle: S::arg(u_pu),
            p: S::real(bus_injection) * S::BASE_POWER,
            q: S::imag(bus_injection) * S::BASE_POWER,
        }
    }

    pub fn sc_output<S: PhaseMode>(&self, u_pu: &S::Complex) -> NodeShortCircuitOutput {
        let u = S::to_three_phase(u_pu);
        let u_abs = Asymmetric::cabs(&u);
        NodeShortCircuitOutput {
            id: self.id,
            energized: true,
            u_pu: u_abs,
            u: u_abs * (self.u_rated / SQRT3),
            u_angle: Asymmetric::arg(&u),
        }
    }
}
