use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::basic::error::{ConstructionError, ConstructionResult};
use crate::basic::phase::base_y;

use super::{ID, SequenceAdmittance};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineInput {
    pub id: ID,
    pub from_node: ID,
    pub to_node: ID,
    pub from_status: bool,
    pub to_status: bool,
    /// Positive-sequence series resistance and reactance (ohm).
    pub r1: f64,
    pub x1: f64,
    /// Positive-sequence shunt capacitance (F) and loss tangent.
    pub c1: f64,
    pub tan1: f64,
    pub r0: f64,
    pub x0: f64,
    pub c0: f64,
    pub tan0: f64,
    /// Rated current (A).
    pub i_n: f64,
}

/// Overhead line or cable, pi-model per sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    y1_series: Complex64,
    y1_shunt: Complex64,
    y0_series: Complex64,
    y0_shunt: Complex64,
    i_n: f64,
}

impl Line {
    pub fn new(input: &LineInput, u_rated_from: f64, u_rated_to: f64, system_frequency: f64) -> ConstructionResult<Self> {
        if u_rated_from != u_rated_to {
            return Err(ConstructionError::ConflictVoltage {
                id: input.id,
                from_node: input.from_node,
                to_node: input.to_node,
                u_from: u_rated_from,
                u_to: u_rated_to,
            });
        }
        let base_y = base_y(u_rated_from);
        let omega = 2.0 * PI * system_frequency;
        Ok(Self {
            y1_series: 1.0 / Complex64::new(input.r1, input.x1) / base_y,
            y1_shunt: Complex64::new(input.tan1, 1.0) * (omega * input.c1 / base_y),
            y0_series: 1.0 / Complex64::new(input.r0, input.x0) / base_y,
            y0_shunt: Complex64::new(input.tan0, 1.0) * (omega * input.c0 / base_y),
            i_n: input.i_n,
        })
    }

    /// Zero, positive and negative sequence pi-models.
    pub fn sequence_admittance(&self, from_status: bool, to_status: bool) -> [SequenceAdmittance; 3] {
        let one = Complex64::new(1.0, 0.0);
        let positive = SequenceAdmittance::pi_model(self.y1_series, self.y1_shunt, one, from_status, to_status);
        let zero = SequenceAdmittance::pi_model(self.y0_series, self.y0_shunt, one, from_status, to_status);
        [zero, positive, positive]
    }

    /// Ratio of the largest terminal current to the rated current.
    pub fn loading(&self, max_current: f64) -> f64 {
        max_current / self.i_n
    }
}
