use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::basic::math_output::ApplianceMathOutput;
use crate::basic::phase::{BASE_POWER_3P, PhaseMode};

use super::{ApplianceBase, ApplianceOutput, ApplianceShortCircuitOutput, ID, PowerDirection};

fn default_sk() -> f64 {
    1e10
}
fn default_rx_ratio() -> f64 {
    0.1
}
fn default_z01_ratio() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceInput {
    pub id: ID,
    pub node: ID,
    pub status: bool,
    /// Reference voltage (p.u.).
    pub u_ref: f64,
    #[serde(default)]
    pub u_ref_angle: f64,
    /// Short-circuit power (VA).
    #[serde(default = "default_sk")]
    pub sk: f64,
    #[serde(default = "default_rx_ratio")]
    pub rx_ratio: f64,
    #[serde(default = "default_z01_ratio")]
    pub z01_ratio: f64,
}

/// External grid equivalent: a voltage source behind an impedance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Source {
    base: ApplianceBase,
    u_ref: f64,
    u_ref_angle: f64,
    y1_ref: Complex64,
    y0_ref: Complex64,
}

impl Source {
    pub fn new(input: &SourceInput, u_rated: f64) -> Self {
        // the impedance is already per-unit on the node voltage base
        let z_abs = BASE_POWER_3P / input.sk;
        let x1 = z_abs / (1.0 + input.rx_ratio * input.rx_ratio).sqrt();
        let z1 = Complex64::new(x1 * input.rx_ratio, x1);
        let z0 = z1 * input.z01_ratio;
        Self {
            base: ApplianceBase::new(input.id, input.node, input.status, u_rated),
            u_ref: input.u_ref,
            u_ref_angle: input.u_ref_angle,
            y1_ref: 1.0 / z1,
            y0_ref: 1.0 / z0,
        }
    }

    pub fn id(&self) -> ID {
        self.base.id()
    }

    pub fn base(&self) -> &ApplianceBase {
        &self.base
    }

    /// Reference admittance seen by the solver, zero when switched off.
    pub fn calc_param<S: PhaseMode>(&self) -> S::Tensor {
        if !self.base.status() {
            return S::tensor_zero();
        }
        S::from_sequence(self.y0_ref, self.y1_ref, self.y1_ref)
    }

    /// Reference voltage phasor in per-unit.
    pub fn u_ref<S: PhaseMode>(&self) -> S::Complex {
        S::balanced(Complex64::from_polar(self.u_ref, self.u_ref_angle))
    }

    pub fn output<S: PhaseMode>(&self, math_output: &ApplianceMathOutput<S>) -> ApplianceOutput<S> {
        self.base.output(PowerDirection::Generator, math_output)
    }

    pub fn sc_output<S: PhaseMode>(&self, i: &S::Complex) -> ApplianceShortCircuitOutput {
        self.base.sc_output::<S>(PowerDirection::Generator, i)
    }
}
