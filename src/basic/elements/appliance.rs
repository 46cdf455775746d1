use nalgebra::Vector3;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::basic::math_output::ApplianceMathOutput;
use crate::basic::phase::{Asymmetric, NUMERICAL_TOLERANCE, PhaseMode, base_i};

use super::{ID, NullOutput};

/// Reference direction of the reported appliance power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerDirection {
    /// Positive when injecting into the node (sources, generators).
    Generator,
    /// Positive when consuming from the node (loads, shunts).
    Load,
}

impl PowerDirection {
    pub fn sign(self) -> f64 {
        match self {
            PowerDirection::Generator => 1.0,
            PowerDirection::Load => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApplianceOutput<S: PhaseMode> {
    pub id: ID,
    pub energized: bool,
    pub p: S::Real,
    pub q: S::Real,
    pub i: S::Real,
    pub s: S::Real,
    pub pf: S::Real,
}

impl<S: PhaseMode> NullOutput for ApplianceOutput<S> {
    fn null_output(id: ID) -> Self {
        Self {
            id,
            energized: false,
            p: S::real_zero(),
            q: S::real_zero(),
            i: S::real_zero(),
            s: S::real_zero(),
            pf: S::real_zero(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApplianceShortCircuitOutput {
    pub id: ID,
    pub energized: bool,
    pub i: Vector3<f64>,
    pub i_angle: Vector3<f64>,
}

impl NullOutput for ApplianceShortCircuitOutput {
    fn null_output(id: ID) -> Self {
        Self {
            id,
            energized: false,
            i: Vector3::zeros(),
            i_angle: Vector3::zeros(),
        }
    }
}

/// Fields shared by every appliance: the connection point and its current base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplianceBase {
    id: ID,
    node: ID,
    status: bool,
    u_rated: f64,
    base_i: f64,
}

impl ApplianceBase {
    pub fn new(id: ID, node: ID, status: bool, u_rated: f64) -> Self {
        Self {
            id,
            node,
            status,
            u_rated,
            base_i: base_i(u_rated),
        }
    }

    pub fn id(&self) -> ID {
        self.id
    }

    pub fn node(&self) -> ID {
        self.node
    }

    pub fn status(&self) -> bool {
        self.status
    }

    pub fn u_rated(&self) -> f64 {
        self.u_rated
    }

    pub fn base_i(&self) -> f64 {
        self.base_i
    }

    /// Converts a per-unit injection into physical output in the given reference direction.
    pub fn output<S: PhaseMode>(
        &self,
        direction: PowerDirection,
        math_output: &ApplianceMathOutput<S>,
    ) -> ApplianceOutput<S> {
        let sign = direction.sign();
        let p = S::real(&math_output.s) * (S::BASE_POWER * sign);
        let s = S::cabs(&math_output.s) * S::BASE_POWER;
        ApplianceOutput {
            id: self.id,
            energized: self.status,
            p,
            q: S::imag(&math_output.s) * (S::BASE_POWER * sign),
            i: S::cabs(&math_output.i) * self.base_i,
            s,
            pf: S::zip_real(&p, &s, |p, s| if s < NUMERICAL_TOLERANCE { 0.0 } else { p / s }),
        }
    }

    pub fn sc_output<S: PhaseMode>(&self, direction: PowerDirection, i: &S::Complex) -> ApplianceShortCircuitOutput {
        let i = S::to_three_phase(i) * Complex64::new(direction.sign(), 0.0);
        ApplianceShortCircuitOutput {
            id: self.id,
            energized: self.status,
            i: Asymmetric::cabs(&i) * self.base_i,
            i_angle: Asymmetric::arg(&i),
        }
    }
}
