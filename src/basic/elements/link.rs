use num_complex::Complex64;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use super::{ID, SequenceAdmittance};

/// Series admittance of a link (p.u.).
pub const LINK_ADMITTANCE: f64 = 1e6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkInput {
    pub id: ID,
    pub from_node: ID,
    pub to_node: ID,
    pub from_status: bool,
    pub to_status: bool,
}

/// Near-ideal connection between two nodes, possibly of different rated voltage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Link;

impl Link {
    pub fn sequence_admittance(&self, from_status: bool, to_status: bool) -> [SequenceAdmittance; 3] {
        let y = SequenceAdmittance::pi_model(
            Complex64::new(LINK_ADMITTANCE, 0.0),
            Complex64::zero(),
            Complex64::new(1.0, 0.0),
            from_status,
            to_status,
        );
        [y; 3]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::elements::{Branch, BranchKind, BranchOutput, NullOutput};
    use crate::basic::phase::{Asymmetric, PhaseMode, SQRT3, Symmetric};
    use approx::assert_relative_eq;

    const U_FROM: f64 = 10e3;
    const U_TO: f64 = 50e3;

    fn input(from_status: bool, to_status: bool) -> LinkInput {
        LinkInput {
            id: 1,
            from_node: 2,
            to_node: 3,
            from_status,
            to_status,
        }
    }

    #[test]
    fn parameters() {
        let link = Branch::link(&input(true, true), U_FROM, U_TO).unwrap();
        assert_eq!(link.kind(), BranchKind::Link);
        let param = link.calc_param::<Symmetric>();
        assert_eq!(param.yff, Complex64::new(1e6, 0.0));
        assert_eq!(param.ytt, Complex64::new(1e6, 0.0));
        assert_eq!(param.yft, Complex64::new(-1e6, 0.0));
        assert_eq!(param.ytf, Complex64::new(-1e6, 0.0));

        let param = Branch::link(&input(true, false), U_FROM, U_TO).unwrap().calc_param::<Symmetric>();
        assert_eq!(param.yff, Complex64::zero());
        assert_eq!(param.ytt, Complex64::zero());
        assert_eq!(param.yft, Complex64::zero());
    }

    #[test]
    fn output_between_voltage_levels() {
        let link = Branch::link(&input(true, true), U_FROM, U_TO).unwrap();
        let u_f = Complex64::new(1.0, 0.0);
        let u_t = Complex64::new(0.9, 0.0);
        let res: BranchOutput<Symmetric> = link.output_from_voltage(&u_f, &u_t);

        let base_i_from = 1e6 / U_FROM / SQRT3;
        let base_i_to = 1e6 / U_TO / SQRT3;
        let i_f = (u_f - u_t) * 1e6 * base_i_from;
        let i_t = (u_t - u_f) * 1e6 * base_i_to;
        let s_f = i_f.conj() * u_f * U_FROM * SQRT3;
        let s_t = i_t.conj() * u_t * U_TO * SQRT3;

        assert!(res.energized);
        assert_relative_eq!(res.i_from, i_f.norm(), max_relative = 1e-9);
        assert_relative_eq!(res.i_to, i_t.norm(), max_relative = 1e-9);
        assert_relative_eq!(res.s_from, s_f.norm(), max_relative = 1e-9);
        assert_relative_eq!(res.s_to, s_t.norm(), max_relative = 1e-9);
        assert_relative_eq!(res.p_from, s_f.re, max_relative = 1e-9);
        assert_relative_eq!(res.q_from, s_f.im, epsilon = 1e-3);
        assert_relative_eq!(res.p_to, s_t.re, max_relative = 1e-9);
        assert_eq!(res.loading, 0.0);

        let asym: BranchOutput<Asymmetric> =
            link.output_from_voltage(&Asymmetric::balanced(u_f), &Asymmetric::balanced(u_t));
        assert_relative_eq!(asym.i_from[0], res.i_from, max_relative = 1e-9);
        assert_relative_eq!(asym.s_from[1], res.s_from / 3.0, max_relative = 1e-9);
        assert_relative_eq!(Asymmetric::sum_val(&asym.p_from), res.p_from, max_relative = 1e-9);
        assert_relative_eq!(Asymmetric::sum_val(&asym.p_to), res.p_to, max_relative = 1e-9);
        assert_eq!(asym.loading, 0.0);
    }

    #[test]
    fn null_output() {
        let res = BranchOutput::<Symmetric>::null_output(1);
        assert!(!res.energized);
        assert_eq!(res.p_from, 0.0);
        assert_eq!(res.loading, 0.0);
    }
}
