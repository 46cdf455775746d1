use nalgebra::Vector3;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::basic::math_output::ApplianceMathOutput;
use crate::basic::phase::{Asymmetric, BASE_POWER_1P, BASE_POWER_3P, PhaseMode};

use super::{ApplianceBase, ApplianceOutput, ApplianceShortCircuitOutput, ID, LoadGenKind, PowerDirection};

/// Voltage dependency of the specified power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadGenType {
    #[default]
    ConstPq,
    ConstY,
    ConstI,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymLoadGenInput {
    pub id: ID,
    pub node: ID,
    pub status: bool,
    #[serde(rename = "type", default)]
    pub load_gen_type: LoadGenType,
    /// Total active power (W).
    pub p_specified: f64,
    /// Total reactive power (var).
    pub q_specified: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AsymLoadGenInput {
    pub id: ID,
    pub node: ID,
    pub status: bool,
    #[serde(rename = "type", default)]
    pub load_gen_type: LoadGenType,
    /// Active power per phase (W).
    pub p_specified: [f64; 3],
    /// Reactive power per phase (var).
    pub q_specified: [f64; 3],
}

/// Specified power, total or per phase, in the reference direction of the appliance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerSpecified {
    Sym { p: f64, q: f64 },
    Asym { p: [f64; 3], q: [f64; 3] },
}

/// Load or generator, symmetric or asymmetric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadGen {
    base: ApplianceBase,
    direction: PowerDirection,
    load_gen_type: LoadGenType,
    specified: PowerSpecified,
}

impl LoadGen {
    pub fn sym(input: &SymLoadGenInput, direction: PowerDirection, u_rated: f64) -> Self {
        Self {
            base: ApplianceBase::new(input.id, input.node, input.status, u_rated),
            direction,
            load_gen_type: input.load_gen_type,
            specified: PowerSpecified::Sym {
                p: input.p_specified,
                q: input.q_specified,
            },
        }
    }

    pub fn asym(input: &AsymLoadGenInput, direction: PowerDirection, u_rated: f64) -> Self {
        Self {
            base: ApplianceBase::new(input.id, input.node, input.status, u_rated),
            direction,
            load_gen_type: input.load_gen_type,
            specified: PowerSpecified::Asym {
                p: input.p_specified,
                q: input.q_specified,
            },
        }
    }

    pub fn id(&self) -> ID {
        self.base.id()
    }

    pub fn base(&self) -> &ApplianceBase {
        &self.base
    }

    pub fn direction(&self) -> PowerDirection {
        self.direction
    }

    pub fn load_gen_type(&self) -> LoadGenType {
        self.load_gen_type
    }

    pub fn kind(&self) -> LoadGenKind {
        match (self.direction, &self.specified) {
            (PowerDirection::Generator, PowerSpecified::Sym { .. }) => LoadGenKind::SymGen,
            (PowerDirection::Generator, PowerSpecified::Asym { .. }) => LoadGenKind::AsymGen,
            (PowerDirection::Load, PowerSpecified::Sym { .. }) => LoadGenKind::SymLoad,
            (PowerDirection::Load, PowerSpecified::Asym { .. }) => LoadGenKind::AsymLoad,
        }
    }

    /// Specified bus injection in per-unit, zero when switched off.
    pub fn calc_param<S: PhaseMode>(&self) -> S::Complex {
        if !self.base.status() {
            return S::complex_zero();
        }
        let s = match self.specified {
            // a total power is the same per-unit value in every phase
            PowerSpecified::Sym { p, q } => S::piecewise(Complex64::new(p, q) / BASE_POWER_3P),
            PowerSpecified::Asym { p, q } => S::complex_from_phases([
                Complex64::new(p[0], q[0]) / BASE_POWER_1P,
                Complex64::new(p[1], q[1]) / BASE_POWER_1P,
                Complex64::new(p[2], q[2]) / BASE_POWER_1P,
            ]),
        };
        s * Complex64::new(self.direction.sign(), 0.0)
    }

    pub fn output<S: PhaseMode>(&self, math_output: &ApplianceMathOutput<S>) -> ApplianceOutput<S> {
        self.base.output(self.direction, math_output)
    }

    /// Loads and generators carry no current in a short-circuit calculation.
    pub fn sc_output(&self) -> ApplianceShortCircuitOutput {
        self.base.sc_output::<Asymmetric>(self.direction, &Vector3::zeros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::phase::{Asymmetric, Symmetric};
    use approx::assert_relative_eq;

    fn sym_load() -> LoadGen {
        let input: SymLoadGenInput = serde_json::from_str(
            r#"{"id": 7, "node": 1, "status": true, "type": "const_y", "p_specified": 3e6, "q_specified": 1e6}"#,
        )
        .unwrap();
        LoadGen::sym(&input, PowerDirection::Load, 10e3)
    }

    #[test]
    fn kind_from_direction_and_input() {
        assert_eq!(sym_load().kind(), LoadGenKind::SymLoad);
        assert_eq!(sym_load().load_gen_type(), LoadGenType::ConstY);
        let input = AsymLoadGenInput {
            id: 8,
            node: 1,
            status: true,
            load_gen_type: LoadGenType::ConstPq,
            p_specified: [1e6, 2e6, 3e6],
            q_specified: [0.0; 3],
        };
        assert_eq!(LoadGen::asym(&input, PowerDirection::Generator, 10e3).kind(), LoadGenKind::AsymGen);
    }

    #[test]
    fn specified_injection() {
        let s = sym_load().calc_param::<Symmetric>();
        assert_relative_eq!(s.re, -3.0, epsilon = 1e-12);
        assert_relative_eq!(s.im, -1.0, epsilon = 1e-12);
        let s = sym_load().calc_param::<Asymmetric>();
        assert_relative_eq!(s[2].re, -3.0, epsilon = 1e-12);

        let input = AsymLoadGenInput {
            id: 8,
            node: 1,
            status: true,
            load_gen_type: LoadGenType::ConstPq,
            p_specified: [1e6, 2e6, 3e6],
            q_specified: [0.0; 3],
        };
        let generator = LoadGen::asym(&input, PowerDirection::Generator, 10e3);
        assert_relative_eq!(generator.calc_param::<Symmetric>().re, 6.0, epsilon = 1e-12);
        assert_relative_eq!(generator.calc_param::<Asymmetric>()[1].re, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn output_reports_consumed_power() {
        let load = sym_load();
        let s = load.calc_param::<Symmetric>();
        let res = load.output(&ApplianceMathOutput::<Symmetric> {
            s,
            i: Complex64::new(1.0, 0.0),
        });
        assert_relative_eq!(res.p, 3e6, epsilon = 1e-6);
        assert_relative_eq!(res.q, 1e6, epsilon = 1e-6);

        let sc = load.sc_output();
        assert!(sc.energized);
        assert_eq!(sc.i, Vector3::zeros());
    }
}
