use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::basic::math_output::ApplianceMathOutput;
use crate::basic::phase::{PhaseMode, base_y};

use super::{ApplianceBase, ApplianceOutput, ApplianceShortCircuitOutput, ID, PowerDirection};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShuntInput {
    pub id: ID,
    pub node: ID,
    pub status: bool,
    /// Positive-sequence conductance and susceptance (S).
    pub g1: f64,
    pub b1: f64,
    #[serde(default)]
    pub g0: f64,
    #[serde(default)]
    pub b0: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shunt {
    base: ApplianceBase,
    y1: Complex64,
    y0: Complex64,
}

impl Shunt {
    pub fn new(input: &ShuntInput, u_rated: f64) -> Self {
        let base_y = base_y(u_rated);
        Self {
            base: ApplianceBase::new(input.id, input.node, input.status, u_rated),
            y1: Complex64::new(input.g1, input.b1) / base_y,
            y0: Complex64::new(input.g0, input.b0) / base_y,
        }
    }

    pub fn id(&self) -> ID {
        self.base.id()
    }

    pub fn base(&self) -> &ApplianceBase {
        &self.base
    }

    /// Per-unit admittance, zero when switched off.
    pub fn calc_param<S: PhaseMode>(&self) -> S::Tensor {
        if !self.base.status() {
            return S::tensor_zero();
        }
        S::from_sequence(self.y0, self.y1, self.y1)
    }

    pub fn output<S: PhaseMode>(&self, math_output: &ApplianceMathOutput<S>) -> ApplianceOutput<S> {
        self.base.output(PowerDirection::Load, math_output)
    }

    /// Output computed directly from the per-unit node voltage.
    pub fn output_from_voltage<S: PhaseMode>(&self, u: &S::Complex) -> ApplianceOutput<S> {
        let i = -(self.calc_param::<S>() * *u);
        let math_output = ApplianceMathOutput {
            s: S::mul_conj(u, &i),
            i,
        };
        self.output(&math_output)
    }

    pub fn sc_output<S: PhaseMode>(&self, i: &S::Complex) -> ApplianceShortCircuitOutput {
        self.base.sc_output::<S>(PowerDirection::Load, i)
    }
}
