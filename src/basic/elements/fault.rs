use nalgebra::Vector3;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::basic::error::{ConstructionError, ConstructionResult};
use crate::basic::phase::{Asymmetric, PhaseMode, base_i, base_y};

use super::{ID, NullOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultType {
    ThreePhase,
    SinglePhaseToGround,
    TwoPhase,
    TwoPhaseToGround,
}

/// Faulted phases; `Default` resolves to the natural phases of the fault type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPhase {
    Abc,
    A,
    B,
    C,
    Ab,
    Ac,
    Bc,
    #[default]
    Default,
}

impl FaultType {
    pub fn accepts(self, phase: FaultPhase) -> bool {
        use FaultPhase::*;
        match self {
            FaultType::ThreePhase => matches!(phase, Abc | Default),
            FaultType::SinglePhaseToGround => matches!(phase, A | B | C | Default),
            FaultType::TwoPhase | FaultType::TwoPhaseToGround => matches!(phase, Ab | Ac | Bc | Default),
        }
    }

    pub fn default_phase(self) -> FaultPhase {
        match self {
            FaultType::ThreePhase => FaultPhase::Abc,
            FaultType::SinglePhaseToGround => FaultPhase::A,
            FaultType::TwoPhase | FaultType::TwoPhaseToGround => FaultPhase::Bc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaultInput {
    pub id: ID,
    pub status: bool,
    pub fault_type: FaultType,
    #[serde(default)]
    pub fault_phase: FaultPhase,
    /// Faulted node.
    pub fault_object: ID,
    /// Fault impedance (ohm).
    #[serde(default)]
    pub r_f: f64,
    #[serde(default)]
    pub x_f: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fault {
    id: ID,
    status: bool,
    fault_type: FaultType,
    fault_phase: FaultPhase,
    fault_object: ID,
    r_f: f64,
    x_f: f64,
    u_rated: f64,
    base_i: f64,
}

/// A fault has no power-flow result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaultOutput {
    pub id: ID,
    pub energized: bool,
}

impl NullOutput for FaultOutput {
    fn null_output(id: ID) -> Self {
        Self { id, energized: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaultShortCircuitOutput {
    pub id: ID,
    pub energized: bool,
    pub i_f: Vector3<f64>,
    pub i_f_angle: Vector3<f64>,
}

impl NullOutput for FaultShortCircuitOutput {
    fn null_output(id: ID) -> Self {
        Self {
            id,
            energized: false,
            i_f: Vector3::zeros(),
            i_f_angle: Vector3::zeros(),
        }
    }
}

impl Fault {
    /// `u_rated` is the rated voltage of the faulted node.
    pub fn new(input: &FaultInput, u_rated: f64) -> ConstructionResult<Self> {
        if !input.fault_type.accepts(input.fault_phase) {
            return Err(ConstructionError::InvalidShortCircuitPhases {
                id: input.id,
                fault_type: input.fault_type,
                fault_phase: input.fault_phase,
            });
        }
        Ok(Self {
            id: input.id,
            status: input.status,
            fault_type: input.fault_type,
            fault_phase: input.fault_phase,
            fault_object: input.fault_object,
            r_f: if input.r_f.is_nan() { 0.0 } else { input.r_f },
            x_f: if input.x_f.is_nan() { 0.0 } else { input.x_f },
            u_rated,
            base_i: base_i(u_rated),
        })
    }

    pub fn id(&self) -> ID {
        self.id
    }

    pub fn status(&self) -> bool {
        self.status
    }

    pub fn fault_object(&self) -> ID {
        self.fault_object
    }

    pub fn fault_type(&self) -> FaultType {
        self.fault_type
    }

    pub fn fault_phase(&self) -> FaultPhase {
        match self.fault_phase {
            FaultPhase::Default => self.fault_type.default_phase(),
            phase => phase,
        }
    }

    /// Fault impedance in per-unit on the faulted node.
    pub fn impedance(&self) -> Complex64 {
        Complex64::new(self.r_f, self.x_f) * base_y(self.u_rated)
    }

    pub fn output(&self) -> FaultOutput {
        FaultOutput::null_output(self.id)
    }

    pub fn sc_output<S: PhaseMode>(&self, i_fault: &S::Complex) -> FaultShortCircuitOutput {
        let i = S::to_three_phase(i_fault);
        FaultShortCircuitOutput {
            id: self.id,
            energized: self.status,
            i_f: Asymmetric::cabs(&i) * self.base_i,
            i_f_angle: Asymmetric::arg(&i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::phase::{DEG_120, Symmetric};
    use approx::assert_relative_eq;

    fn input(fault_type: FaultType, fault_phase: FaultPhase) -> FaultInput {
        FaultInput {
            id: 1,
            status: true,
            fault_type,
            fault_phase,
            fault_object: 4,
            r_f: 3.0,
            x_f: 4.0,
        }
    }

    #[test]
    fn phases_must_match_fault_type() {
        let err = Fault::new(&input(FaultType::ThreePhase, FaultPhase::A), 10e3).unwrap_err();
        assert_eq!(
            err,
            ConstructionError::InvalidShortCircuitPhases {
                id: 1,
                fault_type: FaultType::ThreePhase,
                fault_phase: FaultPhase::A,
            }
        );
        assert!(Fault::new(&input(FaultType::SinglePhaseToGround, FaultPhase::Bc), 10e3).is_err());
        assert!(Fault::new(&input(FaultType::TwoPhaseToGround, FaultPhase::Ac), 10e3).is_ok());

        let fault = Fault::new(&input(FaultType::TwoPhase, FaultPhase::Default), 10e3).unwrap();
        assert_eq!(fault.fault_phase(), FaultPhase::Bc);
    }

    #[test]
    fn power_flow_output_is_never_energized() {
        let fault = Fault::new(&input(FaultType::ThreePhase, FaultPhase::Abc), 10e3).unwrap();
        assert_eq!(fault.output(), FaultOutput { id: 1, energized: false });
    }

    #[test]
    fn short_circuit_current() {
        let fault = Fault::new(&input(FaultType::ThreePhase, FaultPhase::Abc), 10e3).unwrap();
        assert_relative_eq!(fault.impedance().norm(), 5.0 * 1e6 / 1e8, max_relative = 1e-12);

        let res = fault.sc_output::<Symmetric>(&Complex64::new(0.0, -2.0));
        assert!(res.energized);
        for phase in 0..3 {
            assert_relative_eq!(res.i_f[phase], 2.0 * base_i(10e3), max_relative = 1e-12);
        }
        assert_relative_eq!(res.i_f_angle[0], -DEG_120 * 0.75, epsilon = 1e-12);

        let res = fault.sc_output::<Asymmetric>(&Vector3::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
        ));
        assert_relative_eq!(res.i_f[0], base_i(10e3), max_relative = 1e-12);
        assert_eq!(res.i_f[1], 0.0);
    }
}
