//! Two-terminal branches: lines, links and transformers.
//!
//! Every branch is reduced to a pi-model per sequence ([`SequenceAdmittance`]) which is
//! then turned into the admittance tensors of the calculation mode ([`BranchCalcParam`]).
//! Flows and output quantities are computed from those tensors in one place for all
//! branch types; only the loading definition differs.

use nalgebra::Vector3;
use num_complex::Complex64;
use num_traits::Zero;
use serde::Serialize;

use crate::basic::error::{ConstructionError, ConstructionResult};
use crate::basic::math_output::BranchMathOutput;
use crate::basic::phase::{Asymmetric, PhaseMode, base_i};

use super::{BranchKind, ID, Line, LineInput, Link, LinkInput, NullOutput, Transformer, TransformerInput};

/// Pi-model admittances of one sequence, in per-unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceAdmittance {
    pub ff: Complex64,
    pub ft: Complex64,
    pub tf: Complex64,
    pub tt: Complex64,
}

impl SequenceAdmittance {
    pub const ZERO: SequenceAdmittance = SequenceAdmittance {
        ff: Complex64::new(0.0, 0.0),
        ft: Complex64::new(0.0, 0.0),
        tf: Complex64::new(0.0, 0.0),
        tt: Complex64::new(0.0, 0.0),
    };

    /// Pi-model with the off-nominal complex ratio `tap_ratio` on the from-side.
    ///
    /// With only one side connected the series element and the far shunt half are in
    /// series and appear as a single shunt on the connected side.
    pub fn pi_model(
        y_series: Complex64,
        y_shunt: Complex64,
        tap_ratio: Complex64,
        from_status: bool,
        to_status: bool,
    ) -> Self {
        let ratio_sqr = tap_ratio.norm_sqr();
        match (from_status, to_status) {
            (true, true) => Self {
                ff: (y_series + y_shunt * 0.5) / ratio_sqr,
                ft: -y_series / tap_ratio.conj(),
                tf: -y_series / tap_ratio,
                tt: y_series + y_shunt * 0.5,
            },
            (true, false) => Self {
                ff: open_end_admittance(y_series, y_shunt) / ratio_sqr,
                ..Self::ZERO
            },
            (false, true) => Self {
                tt: open_end_admittance(y_series, y_shunt),
                ..Self::ZERO
            },
            (false, false) => Self::ZERO,
        }
    }
}

fn open_end_admittance(y_series: Complex64, y_shunt: Complex64) -> Complex64 {
    if y_series.is_zero() || y_shunt.is_zero() {
        return y_shunt * 0.5;
    }
    y_shunt * 0.5 + 1.0 / (1.0 / y_series + 2.0 / y_shunt)
}

/// Admittance tensors of a branch in the calculation mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchCalcParam<S: PhaseMode> {
    pub yff: S::Tensor,
    pub yft: S::Tensor,
    pub ytf: S::Tensor,
    pub ytt: S::Tensor,
}

impl<S: PhaseMode> BranchCalcParam<S> {
    pub fn zero() -> Self {
        Self {
            yff: S::tensor_zero(),
            yft: S::tensor_zero(),
            ytf: S::tensor_zero(),
            ytt: S::tensor_zero(),
        }
    }

    pub fn from_sequences(zero: &SequenceAdmittance, positive: &SequenceAdmittance, negative: &SequenceAdmittance) -> Self {
        Self {
            yff: S::from_sequence(zero.ff, positive.ff, negative.ff),
            yft: S::from_sequence(zero.ft, positive.ft, negative.ft),
            ytf: S::from_sequence(zero.tf, positive.tf, negative.tf),
            ytt: S::from_sequence(zero.tt, positive.tt, negative.tt),
        }
    }

    /// Currents and powers flowing into the branch at both terminals.
    pub fn math_output(&self, u_f: &S::Complex, u_t: &S::Complex) -> BranchMathOutput<S> {
        let i_f = self.yff * *u_f + self.yft * *u_t;
        let i_t = self.ytf * *u_f + self.ytt * *u_t;
        BranchMathOutput {
            s_f: S::mul_conj(u_f, &i_f),
            s_t: S::mul_conj(u_t, &i_t),
            i_f,
            i_t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BranchOutput<S: PhaseMode> {
    pub id: ID,
    pub energized: bool,
    pub loading: f64,
    pub p_from: S::Real,
    pub q_from: S::Real,
    pub i_from: S::Real,
    pub s_from: S::Real,
    pub p_to: S::Real,
    pub q_to: S::Real,
    pub i_to: S::Real,
    pub s_to: S::Real,
}

impl<S: PhaseMode> NullOutput for BranchOutput<S> {
    fn null_output(id: ID) -> Self {
        Self {
            id,
            energized: false,
            loading: 0.0,
            p_from: S::real_zero(),
            q_from: S::real_zero(),
            i_from: S::real_zero(),
            s_from: S::real_zero(),
            p_to: S::real_zero(),
            q_to: S::real_zero(),
            i_to: S::real_zero(),
            s_to: S::real_zero(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BranchShortCircuitOutput {
    pub id: ID,
    pub energized: bool,
    pub i_from: Vector3<f64>,
    pub i_from_angle: Vector3<f64>,
    pub i_to: Vector3<f64>,
    pub i_to_angle: Vector3<f64>,
}

impl NullOutput for BranchShortCircuitOutput {
    fn null_output(id: ID) -> Self {
        Self {
            id,
            energized: false,
            i_from: Vector3::zeros(),
            i_from_angle: Vector3::zeros(),
            i_to: Vector3::zeros(),
            i_to_angle: Vector3::zeros(),
        }
    }
}

/// Electrical model of a branch subtype.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BranchModel {
    Line(Line),
    Link(Link),
    Transformer(Transformer),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branch {
    id: ID,
    from_node: ID,
    to_node: ID,
    from_status: bool,
    to_status: bool,
    base_i_from: f64,
    base_i_to: f64,
    model: BranchModel,
}

fn check_terminals(id: ID, from_node: ID, to_node: ID) -> ConstructionResult<()> {
    if from_node == to_node {
        return Err(ConstructionError::InvalidBranch { id, node: from_node });
    }
    Ok(())
}

impl Branch {
    fn new(
        id: ID,
        (from_node, to_node): (ID, ID),
        (from_status, to_status): (bool, bool),
        (u_rated_from, u_rated_to): (f64, f64),
        model: BranchModel,
    ) -> ConstructionResult<Self> {
        check_terminals(id, from_node, to_node)?;
        Ok(Self {
            id,
            from_node,
            to_node,
            from_status,
            to_status,
            base_i_from: base_i(u_rated_from),
            base_i_to: base_i(u_rated_to),
            model,
        })
    }

    pub fn line(input: &LineInput, u_rated_from: f64, u_rated_to: f64, system_frequency: f64) -> ConstructionResult<Self> {
        check_terminals(input.id, input.from_node, input.to_node)?;
        let line = Line::new(input, u_rated_from, u_rated_to, system_frequency)?;
        Self::new(
            input.id,
            (input.from_node, input.to_node),
            (input.from_status, input.to_status),
            (u_rated_from, u_rated_to),
            BranchModel::Line(line),
        )
    }

    pub fn link(input: &LinkInput, u_rated_from: f64, u_rated_to: f64) -> ConstructionResult<Self> {
        Self::new(
            input.id,
            (input.from_node, input.to_node),
            (input.from_status, input.to_status),
            (u_rated_from, u_rated_to),
            BranchModel::Link(Link),
        )
    }

    pub fn transformer(input: &TransformerInput, u_rated_from: f64, u_rated_to: f64) -> ConstructionResult<Self> {
        check_terminals(input.id, input.from_node, input.to_node)?;
        let transformer = Transformer::new(input, u_rated_from, u_rated_to)?;
        Self::new(
            input.id,
            (input.from_node, input.to_node),
            (input.from_status, input.to_status),
            (u_rated_from, u_rated_to),
            BranchModel::Transformer(transformer),
        )
    }

    pub fn id(&self) -> ID {
        self.id
    }

    pub fn from_node(&self) -> ID {
        self.from_node
    }

    pub fn to_node(&self) -> ID {
        self.to_node
    }

    pub fn from_status(&self) -> bool {
        self.from_status
    }

    pub fn to_status(&self) -> bool {
        self.to_status
    }

    pub fn base_i_from(&self) -> f64 {
        self.base_i_from
    }

    pub fn base_i_to(&self) -> f64 {
        self.base_i_to
    }

    pub fn model(&self) -> &BranchModel {
        &self.model
    }

    pub fn kind(&self) -> BranchKind {
        match self.model {
            BranchModel::Line(_) => BranchKind::Line,
            BranchModel::Link(_) => BranchKind::Link,
            BranchModel::Transformer(_) => BranchKind::Transformer,
        }
    }

    /// Whether the branch carries current when its group is energized.
    pub fn energized(&self, is_connected_to_source: bool) -> bool {
        is_connected_to_source && (self.from_status || self.to_status)
    }

    pub fn calc_param<S: PhaseMode>(&self) -> BranchCalcParam<S> {
        if !self.energized(true) {
            return BranchCalcParam::zero();
        }
        let [zero, positive, negative] = match &self.model {
            BranchModel::Line(line) => line.sequence_admittance(self.from_status, self.to_status),
            BranchModel::Link(link) => link.sequence_admittance(self.from_status, self.to_status),
            BranchModel::Transformer(transformer) => transformer.sequence_admittance(self.from_status, self.to_status),
        };
        BranchCalcParam::from_sequences(&zero, &positive, &negative)
    }

    fn loading<S: PhaseMode>(&self, s_from: &S::Real, s_to: &S::Real, i_from: &S::Real, i_to: &S::Real) -> f64 {
        match &self.model {
            BranchModel::Line(line) => line.loading(S::max_val(i_from).max(S::max_val(i_to))),
            BranchModel::Link(_) => 0.0,
            BranchModel::Transformer(transformer) => transformer.loading(S::sum_val(s_from).max(S::sum_val(s_to))),
        }
    }

    pub fn output<S: PhaseMode>(&self, math_output: &BranchMathOutput<S>) -> BranchOutput<S> {
        let s_from = S::cabs(&math_output.s_f) * S::BASE_POWER;
        let s_to = S::cabs(&math_output.s_t) * S::BASE_POWER;
        let i_from = S::cabs(&math_output.i_f) * self.base_i_from;
        let i_to = S::cabs(&math_output.i_t) * self.base_i_to;
        BranchOutput {
            id: self.id,
            energized: self.energized(true),
            loading: self.loading::<S>(&s_from, &s_to, &i_from, &i_to),
            p_from: S::real(&math_output.s_f) * S::BASE_POWER,
            q_from: S::imag(&math_output.s_f) * S::BASE_POWER,
            i_from,
            s_from,
            p_to: S::real(&math_output.s_t) * S::BASE_POWER,
            q_to: S::imag(&math_output.s_t) * S::BASE_POWER,
            i_to,
            s_to,
        }
    }

    /// Output computed directly from the per-unit terminal voltages.
    pub fn output_from_voltage<S: PhaseMode>(&self, u_f: &S::Complex, u_t: &S::Complex) -> BranchOutput<S> {
        self.output(&self.calc_param::<S>().math_output(u_f, u_t))
    }

    pub fn sc_output<S: PhaseMode>(&self, i_f: &S::Complex, i_t: &S::Complex) -> BranchShortCircuitOutput {
        let i_f = S::to_three_phase(i_f);
        let i_t = S::to_three_phase(i_t);
        BranchShortCircuitOutput {
            id: self.id,
            energized: self.energized(true),
            i_from: Asymmetric::cabs(&i_f) * self.base_i_from,
            i_from_angle: Asymmetric::arg(&i_f),
            i_to: Asymmetric::cabs(&i_t) * self.base_i_to,
            i_to_angle: Asymmetric::arg(&i_t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::phase::Symmetric;
    use approx::assert_relative_eq;

    #[test]
    fn same_terminal_nodes_are_rejected() {
        let input = LinkInput {
            id: 4,
            from_node: 2,
            to_node: 2,
            from_status: true,
            to_status: true,
        };
        assert_eq!(
            Branch::link(&input, 10e3, 10e3),
            Err(ConstructionError::InvalidBranch { id: 4, node: 2 })
        );
    }

    #[test]
    fn pi_model_with_open_end() {
        let ys = Complex64::new(1.0, -10.0);
        let ysh = Complex64::new(0.0, 0.2);
        let both = SequenceAdmittance::pi_model(ys, ysh, Complex64::new(1.0, 0.0), true, true);
        assert_eq!(both.ft, -ys);
        assert_eq!(both.tt, ys + ysh * 0.5);

        let from_only = SequenceAdmittance::pi_model(ys, ysh, Complex64::new(1.0, 0.0), true, false);
        let expected = ysh * 0.5 + 1.0 / (1.0 / ys + 2.0 / ysh);
        assert_relative_eq!(from_only.ff.re, expected.re, epsilon = 1e-12);
        assert_relative_eq!(from_only.ff.im, expected.im, epsilon = 1e-12);
        assert_eq!(from_only.tt, Complex64::zero());
        assert_eq!(from_only.ft, Complex64::zero());

        let no_shunt = SequenceAdmittance::pi_model(ys, Complex64::zero(), Complex64::new(1.0, 0.0), false, true);
        assert_eq!(no_shunt, SequenceAdmittance::ZERO);
    }

    #[test]
    fn tap_ratio_scales_from_side() {
        let ys = Complex64::new(0.0, -10.0);
        let k = Complex64::from_polar(1.1, 0.5);
        let y = SequenceAdmittance::pi_model(ys, Complex64::zero(), k, true, true);
        assert_relative_eq!((y.ff * k.norm_sqr() - ys).norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!((y.tf * k + ys).norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!((y.ft * k.conj() + ys).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn fully_disconnected_branch_has_zero_parameters() {
        let input = LinkInput {
            id: 4,
            from_node: 1,
            to_node: 2,
            from_status: false,
            to_status: false,
        };
        let link = Branch::link(&input, 10e3, 10e3).unwrap();
        assert!(!link.energized(true));
        assert_eq!(link.calc_param::<Symmetric>(), BranchCalcParam::zero());
        let res = link.output_from_voltage::<Symmetric>(&Complex64::new(1.0, 0.0), &Complex64::new(0.9, 0.0));
        assert_eq!(res.i_from, 0.0);
        assert!(!res.energized);
    }
}
