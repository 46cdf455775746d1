use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::basic::error::{ConstructionError, ConstructionResult};
use crate::basic::math_output::BranchMathOutput;
use crate::basic::phase::{Asymmetric, PhaseMode, base_i};

use super::{Branch3Kind, ID, NullOutput};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreeWindingTransformerInput {
    pub id: ID,
    pub node_1: ID,
    pub node_2: ID,
    pub node_3: ID,
    pub status_1: bool,
    pub status_2: bool,
    pub status_3: bool,
    /// Rated winding voltages (V).
    pub u1: f64,
    pub u2: f64,
    pub u3: f64,
    /// Rated winding powers (VA).
    pub sn_1: f64,
    pub sn_2: f64,
    pub sn_3: f64,
}

/// Three-terminal branch, solved as three legs joined at an internal star point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branch3 {
    id: ID,
    node: [ID; 3],
    status: [bool; 3],
    sn: [f64; 3],
    base_i: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Branch3Output<S: PhaseMode> {
    pub id: ID,
    pub energized: bool,
    pub loading: f64,
    pub p_1: S::Real,
    pub q_1: S::Real,
    pub i_1: S::Real,
    pub s_1: S::Real,
    pub p_2: S::Real,
    pub q_2: S::Real,
    pub i_2: S::Real,
    pub s_2: S::Real,
    pub p_3: S::Real,
    pub q_3: S::Real,
    pub i_3: S::Real,
    pub s_3: S::Real,
}

impl<S: PhaseMode> NullOutput for Branch3Output<S> {
    fn null_output(id: ID) -> Self {
        let zero = S::real_zero();
        Self {
            id,
            energized: false,
            loading: 0.0,
            p_1: zero,
            q_1: zero,
            i_1: zero,
            s_1: zero,
            p_2: zero,
            q_2: zero,
            i_2: zero,
            s_2: zero,
            p_3: zero,
            q_3: zero,
            i_3: zero,
            s_3: zero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Branch3ShortCircuitOutput {
    pub id: ID,
    pub energized: bool,
    pub i_1: Vector3<f64>,
    pub i_1_angle: Vector3<f64>,
    pub i_2: Vector3<f64>,
    pub i_2_angle: Vector3<f64>,
    pub i_3: Vector3<f64>,
    pub i_3_angle: Vector3<f64>,
}

impl NullOutput for Branch3ShortCircuitOutput {
    fn null_output(id: ID) -> Self {
        Self {
            id,
            energized: false,
            i_1: Vector3::zeros(),
            i_1_angle: Vector3::zeros(),
            i_2: Vector3::zeros(),
            i_2_angle: Vector3::zeros(),
            i_3: Vector3::zeros(),
            i_3_angle: Vector3::zeros(),
        }
    }
}

/// Physical quantities of one winding.
struct Side<S: PhaseMode> {
    p: S::Real,
    q: S::Real,
    i: S::Real,
    s: S::Real,
}

impl Branch3 {
    pub fn new(input: &ThreeWindingTransformerInput, u_rated: [f64; 3]) -> ConstructionResult<Self> {
        let node = [input.node_1, input.node_2, input.node_3];
        for (a, b) in [(0, 1), (0, 2), (1, 2)] {
            if node[a] == node[b] {
                return Err(ConstructionError::InvalidBranch3 {
                    id: input.id,
                    node: node[a],
                });
            }
        }
        Ok(Self {
            id: input.id,
            node,
            status: [input.status_1, input.status_2, input.status_3],
            sn: [input.sn_1, input.sn_2, input.sn_3],
            base_i: u_rated.map(base_i),
        })
    }

    pub fn id(&self) -> ID {
        self.id
    }

    pub fn nodes(&self) -> [ID; 3] {
        self.node
    }

    pub fn status(&self) -> [bool; 3] {
        self.status
    }

    pub fn kind(&self) -> Branch3Kind {
        Branch3Kind::ThreeWindingTransformer
    }

    pub fn energized(&self, is_connected_to_source: bool) -> bool {
        is_connected_to_source && self.status.iter().any(|s| *s)
    }

    fn side<S: PhaseMode>(&self, n: usize, leg: &BranchMathOutput<S>) -> Side<S> {
        Side {
            p: S::real(&leg.s_f) * S::BASE_POWER,
            q: S::imag(&leg.s_f) * S::BASE_POWER,
            i: S::cabs(&leg.i_f) * self.base_i[n],
            s: S::cabs(&leg.s_f) * S::BASE_POWER,
        }
    }

    /// Output from the from-side flows of the three legs, winding 1 to 3.
    pub fn output<S: PhaseMode>(&self, legs: [&BranchMathOutput<S>; 3]) -> Branch3Output<S> {
        let [s1, s2, s3] = [0, 1, 2].map(|n| self.side(n, legs[n]));
        let loading = [&s1.s, &s2.s, &s3.s]
            .into_iter()
            .zip(self.sn)
            .map(|(s, sn)| S::sum_val(s) / sn)
            .fold(0.0, f64::max);
        Branch3Output {
            id: self.id,
            energized: self.energized(true),
            loading,
            p_1: s1.p,
            q_1: s1.q,
            i_1: s1.i,
            s_1: s1.s,
            p_2: s2.p,
            q_2: s2.q,
            i_2: s2.i,
            s_2: s2.s,
            p_3: s3.p,
            q_3: s3.q,
            i_3: s3.i,
            s_3: s3.s,
        }
    }

    pub fn sc_output<S: PhaseMode>(&self, i: [&S::Complex; 3]) -> Branch3ShortCircuitOutput {
        let [i1, i2, i3] = i.map(S::to_three_phase);
        Branch3ShortCircuitOutput {
            id: self.id,
            energized: self.energized(true),
            i_1: Asymmetric::cabs(&i1) * self.base_i[0],
            i_1_angle: Asymmetric::arg(&i1),
            i_2: Asymmetric::cabs(&i2) * self.base_i[1],
            i_2_angle: Asymmetric::arg(&i2),
            i_3: Asymmetric::cabs(&i3) * self.base_i[2],
            i_3_angle: Asymmetric::arg(&i3),
        }
    }
}
