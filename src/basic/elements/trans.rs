//! Two-winding transformer with tap changer.

use num_complex::Complex64;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::basic::error::{ConstructionError, ConstructionResult};
use crate::basic::phase::{DEG_30, base_y};

use super::{BranchSide, ID, SequenceAdmittance};

/// Winding connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindingType {
    Wye,
    WyeN,
    Delta,
    Zigzag,
    ZigzagN,
}

impl WindingType {
    fn is_wye(self) -> bool {
        matches!(self, WindingType::Wye | WindingType::WyeN)
    }
}

/// Whether the clock number is possible for the winding pair: wye-wye and
/// delta/zigzag-delta/zigzag pairs shift by an even clock, mixed pairs by an odd one.
pub fn is_valid_clock(clock: i8, winding_from: WindingType, winding_to: WindingType) -> bool {
    if !(0..=12).contains(&clock) {
        return false;
    }
    (winding_from.is_wye() == winding_to.is_wye()) == (clock % 2 == 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformerInput {
    pub id: ID,
    pub from_node: ID,
    pub to_node: ID,
    pub from_status: bool,
    pub to_status: bool,
    /// Rated winding voltages (V).
    pub u1: f64,
    pub u2: f64,
    /// Rated power (VA).
    pub sn: f64,
    /// Relative short-circuit voltage.
    pub uk: f64,
    /// Short-circuit (copper) loss (W).
    pub pk: f64,
    /// Relative no-load current.
    pub i0: f64,
    /// No-load (iron) loss (W).
    pub p0: f64,
    pub winding_from: WindingType,
    pub winding_to: WindingType,
    pub clock: i8,
    pub tap_side: BranchSide,
    pub tap_pos: i8,
    pub tap_min: i8,
    pub tap_max: i8,
    pub tap_nom: i8,
    /// Voltage step per tap (V).
    pub tap_size: f64,
    #[serde(default)]
    pub uk_min: Option<f64>,
    #[serde(default)]
    pub uk_max: Option<f64>,
    #[serde(default)]
    pub pk_min: Option<f64>,
    #[serde(default)]
    pub pk_max: Option<f64>,
    #[serde(default)]
    pub r_grounding_from: Option<f64>,
    #[serde(default)]
    pub x_grounding_from: Option<f64>,
    #[serde(default)]
    pub r_grounding_to: Option<f64>,
    #[serde(default)]
    pub x_grounding_to: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformer {
    u1: f64,
    u2: f64,
    u1_rated: f64,
    u2_rated: f64,
    sn: f64,
    uk: f64,
    pk: f64,
    i0: f64,
    p0: f64,
    winding_from: WindingType,
    winding_to: WindingType,
    clock: i8,
    tap_side: BranchSide,
    tap_pos: i8,
    tap_min: i8,
    tap_max: i8,
    tap_nom: i8,
    tap_size: f64,
    uk_min: Option<f64>,
    uk_max: Option<f64>,
    pk_min: Option<f64>,
    pk_max: Option<f64>,
    /// Grounding impedances in per-unit on their own side.
    z_grounding_from: Complex64,
    z_grounding_to: Complex64,
}

fn grounding_impedance(r: Option<f64>, x: Option<f64>, u_rated: f64) -> Complex64 {
    Complex64::new(r.unwrap_or(0.0), x.unwrap_or(0.0)) * base_y(u_rated)
}

/// Linear interpolation of a tap-dependent quantity between the nominal and an end position.
fn tap_dependent(value_nom: f64, value_end: Option<f64>, tap_pos: i8, tap_nom: i8, tap_end: i8) -> f64 {
    match value_end {
        Some(value_end) if tap_end != tap_nom => {
            value_nom + (value_end - value_nom) * f64::from(tap_pos - tap_nom) / f64::from(tap_end - tap_nom)
        }
        _ => value_nom,
    }
}

impl Transformer {
    pub fn new(input: &TransformerInput, u1_rated: f64, u2_rated: f64) -> ConstructionResult<Self> {
        if !is_valid_clock(input.clock, input.winding_from, input.winding_to) {
            return Err(ConstructionError::InvalidTransformerClock {
                id: input.id,
                clock: input.clock,
                winding_from: input.winding_from,
                winding_to: input.winding_to,
            });
        }
        let mut transformer = Self {
            u1: input.u1,
            u2: input.u2,
            u1_rated,
            u2_rated,
            sn: input.sn,
            uk: input.uk,
            pk: input.pk,
            i0: input.i0,
            p0: input.p0,
            winding_from: input.winding_from,
            winding_to: input.winding_to,
            clock: input.clock,
            tap_side: input.tap_side,
            tap_pos: input.tap_pos,
            tap_min: input.tap_min,
            tap_max: input.tap_max,
            tap_nom: input.tap_nom,
            tap_size: input.tap_size,
            uk_min: input.uk_min,
            uk_max: input.uk_max,
            pk_min: input.pk_min,
            pk_max: input.pk_max,
            z_grounding_from: grounding_impedance(input.r_grounding_from, input.x_grounding_from, u1_rated),
            z_grounding_to: grounding_impedance(input.r_grounding_to, input.x_grounding_to, u2_rated),
        };
        transformer.set_tap(input.tap_pos);
        Ok(transformer)
    }

    pub fn tap_pos(&self) -> i8 {
        self.tap_pos
    }

    /// Moves the tap, clamped to the tap range. Returns whether the position changed.
    pub fn set_tap(&mut self, tap_pos: i8) -> bool {
        let low = self.tap_min.min(self.tap_max);
        let high = self.tap_min.max(self.tap_max);
        let clamped = tap_pos.clamp(low, high);
        let changed = clamped != self.tap_pos;
        self.tap_pos = clamped;
        changed
    }

    /// Phase shift of the positive sequence from the from-side to the to-side.
    pub fn phase_shift(&self) -> f64 {
        f64::from(self.clock) * DEG_30
    }

    /// Loading relative to the rated power, from the larger total side power.
    pub fn loading(&self, max_power: f64) -> f64 {
        max_power / self.sn
    }

    fn tap_direction(&self) -> f64 {
        if self.tap_max >= self.tap_min { 1.0 } else { -1.0 }
    }

    /// Winding voltages at the current tap position.
    fn tapped_voltages(&self) -> (f64, f64) {
        let delta = self.tap_direction() * f64::from(self.tap_pos - self.tap_nom) * self.tap_size;
        match self.tap_side {
            BranchSide::From => (self.u1 + delta, self.u2),
            BranchSide::To => (self.u1, self.u2 + delta),
        }
    }

    /// Short-circuit voltage and loss at the current tap position.
    fn tap_adjusted_impedance(&self) -> (f64, f64) {
        let towards_max = if self.tap_max >= self.tap_nom {
            self.tap_pos >= self.tap_nom
        } else {
            self.tap_pos <= self.tap_nom
        };
        let (uk_end, pk_end, tap_end) = if towards_max {
            (self.uk_max, self.pk_max, self.tap_max)
        } else {
            (self.uk_min, self.pk_min, self.tap_min)
        };
        (
            tap_dependent(self.uk, uk_end, self.tap_pos, self.tap_nom, tap_end),
            tap_dependent(self.pk, pk_end, self.tap_pos, self.tap_nom, tap_end),
        )
    }

    /// Off-nominal voltage ratio, without phase shift.
    pub fn ratio(&self) -> f64 {
        let (u1, u2) = self.tapped_voltages();
        (u1 / u2) / (self.u1_rated / self.u2_rated)
    }

    /// Series impedance and magnetizing admittance in per-unit on the to-side.
    fn series_and_shunt(&self) -> (Complex64, Complex64) {
        let (_, u2) = self.tapped_voltages();
        let (uk, pk) = self.tap_adjusted_impedance();
        let base_y_to = base_y(self.u2_rated);

        let z_abs = uk * u2 * u2 / self.sn;
        let z_real = pk * u2 * u2 / self.sn / self.sn;
        let z_imag_sqr = z_abs * z_abs - z_real * z_real;
        let z_imag = if z_imag_sqr > 0.0 { z_imag_sqr.sqrt() } else { 0.0 };
        let z_series = Complex64::new(z_real, z_imag) * base_y_to;

        let y_shunt_abs = self.i0 * self.sn / u2 / u2;
        let y_shunt_real = self.p0 / u2 / u2;
        let y_shunt_imag = if y_shunt_real > y_shunt_abs {
            0.0
        } else {
            -(y_shunt_abs * y_shunt_abs - y_shunt_real * y_shunt_real).sqrt()
        };
        let y_shunt = Complex64::new(y_shunt_real, y_shunt_imag) / base_y_to;
        (z_series, y_shunt)
    }

    /// Zero, positive and negative sequence pi-models.
    pub fn sequence_admittance(&self, from_status: bool, to_status: bool) -> [SequenceAdmittance; 3] {
        let (z_series, y_shunt) = self.series_and_shunt();
        let k = self.ratio();
        let shift = self.phase_shift();
        let y_series = 1.0 / z_series;
        let positive = SequenceAdmittance::pi_model(
            y_series,
            y_shunt,
            Complex64::from_polar(k, shift),
            from_status,
            to_status,
        );
        let negative = SequenceAdmittance::pi_model(
            y_series,
            y_shunt,
            Complex64::from_polar(k, -shift),
            from_status,
            to_status,
        );
        let zero = self.zero_sequence_admittance(z_series, y_shunt, k, from_status, to_status);
        [zero, positive, negative]
    }

    fn zero_sequence_admittance(
        &self,
        z_series: Complex64,
        y_shunt: Complex64,
        k: f64,
        from_status: bool,
        to_status: bool,
    ) -> SequenceAdmittance {
        use WindingType::*;
        let zg_from = self.z_grounding_from / (k * k);
        let zg_to = self.z_grounding_to;

        if self.winding_from == WyeN && self.winding_to == WyeN {
            let z0 = z_series + (zg_to + zg_from) * 3.0;
            // every 60 degrees of shift inverts the zero sequence
            let sign = if (self.clock / 2) % 2 == 1 { -1.0 } else { 1.0 };
            return SequenceAdmittance::pi_model(1.0 / z0, y_shunt, Complex64::new(k * sign, 0.0), from_status, to_status);
        }

        // a grounded winding facing a delta closes the zero-sequence loop on its own side
        let grounded = |winding: WindingType, other: WindingType, zg: Complex64| -> Complex64 {
            match (winding, other) {
                (WyeN, Delta) => 1.0 / (z_series + zg * 3.0) + y_shunt,
                (ZigzagN, _) => 1.0 / (z_series * 0.1 + zg * 3.0),
                _ => Complex64::zero(),
            }
        };
        let mut y0 = SequenceAdmittance::ZERO;
        if from_status {
            y0.ff = grounded(self.winding_from, self.winding_to, zg_from) / (k * k);
        }
        if to_status {
            y0.tt = grounded(self.winding_to, self.winding_from, zg_to);
        }
        y0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::elements::{Branch, BranchCalcParam, BranchKind};
    use crate::basic::phase::{Asymmetric, PhaseMode, SQRT3, Symmetric, base_i};
    use approx::assert_relative_eq;
    use nalgebra::Matrix3;

    const U1_RATED: f64 = 150e3;
    const U2_RATED: f64 = 10e3;

    fn input() -> TransformerInput {
        TransformerInput {
            id: 1,
            from_node: 2,
            to_node: 3,
            from_status: true,
            to_status: true,
            u1: 155e3,
            u2: 10e3,
            sn: 30e6,
            uk: 0.203,
            pk: 100e3,
            i0: 0.0,
            p0: 0.0,
            winding_from: WindingType::WyeN,
            winding_to: WindingType::WyeN,
            clock: 12,
            tap_side: BranchSide::From,
            tap_pos: -2,
            tap_min: -11,
            tap_max: 9,
            tap_nom: 0,
            tap_size: 2.5e3,
            uk_min: None,
            uk_max: None,
            pk_min: None,
            pk_max: None,
            r_grounding_from: None,
            x_grounding_from: None,
            r_grounding_to: None,
            x_grounding_to: None,
        }
    }

    fn with_windings(winding_from: WindingType, winding_to: WindingType, clock: i8) -> TransformerInput {
        TransformerInput {
            winding_from,
            winding_to,
            clock,
            ..input()
        }
    }

    fn series_admittance(uk: f64, pk: f64) -> Complex64 {
        let z_abs = uk * 10e3 * 10e3 / 30e6;
        let z_real = pk * 10e3 * 10e3 / 30e6 / 30e6;
        let z = Complex64::new(z_real, (z_abs * z_abs - z_real * z_real).sqrt());
        1.0 / (z * base_y(U2_RATED))
    }

    fn assert_complex_eq(x: Complex64, y: Complex64) {
        assert!((x - y).norm() < 1e-8, "{x} != {y}");
    }

    fn assert_tensor_eq(x: &Matrix3<Complex64>, y: &Matrix3<Complex64>) {
        for (a, b) in x.iter().zip(y.iter()) {
            assert_complex_eq(*a, *b);
        }
    }

    fn build(input: &TransformerInput) -> Branch {
        Branch::transformer(input, U1_RATED, U2_RATED).unwrap()
    }

    #[test]
    fn current_base() {
        let transformer = build(&input());
        assert_eq!(transformer.kind(), BranchKind::Transformer);
        assert_relative_eq!(transformer.base_i_from(), base_i(150e3));
        assert_relative_eq!(transformer.base_i_to(), 1e6 / 10e3 / SQRT3, max_relative = 1e-12);
    }

    #[test]
    fn invalid_clock() {
        let err = Transformer::new(&with_windings(WindingType::Delta, WindingType::WyeN, 12), U1_RATED, U2_RATED);
        assert!(matches!(err, Err(ConstructionError::InvalidTransformerClock { clock: 12, .. })));
        let err = Transformer::new(&with_windings(WindingType::Wye, WindingType::WyeN, 11), U1_RATED, U2_RATED);
        assert!(matches!(err, Err(ConstructionError::InvalidTransformerClock { clock: 11, .. })));
        let err = Transformer::new(&with_windings(WindingType::Wye, WindingType::Wye, 13), U1_RATED, U2_RATED);
        assert!(err.is_err());
        assert!(Transformer::new(&with_windings(WindingType::Wye, WindingType::ZigzagN, 11), U1_RATED, U2_RATED).is_ok());
    }

    #[test]
    fn tap_is_clamped() {
        let mut transformer = Transformer::new(&input(), U1_RATED, U2_RATED).unwrap();
        assert!(transformer.set_tap(-100));
        assert_eq!(transformer.tap_pos(), -11);
        assert!(transformer.set_tap(100));
        assert_eq!(transformer.tap_pos(), 9);
        assert!(!transformer.set_tap(100));
    }

    #[test]
    fn symmetric_parameters_with_clock() {
        let y = series_admittance(0.203, 100e3);
        let cases = [
            (WindingType::WyeN, WindingType::WyeN, 12, 0.0),
            (WindingType::Delta, WindingType::WyeN, 11, -1.0),
            (WindingType::Wye, WindingType::Delta, 1, 1.0),
            (WindingType::Wye, WindingType::Wye, 12, 0.0),
            (WindingType::WyeN, WindingType::WyeN, 2, 2.0),
        ];
        for (winding_from, winding_to, clock, shift) in cases {
            let param: BranchCalcParam<Symmetric> = build(&with_windings(winding_from, winding_to, clock)).calc_param();
            // tap -2 brings 155 kV back to the 150 kV rating
            assert_complex_eq(param.yff, y);
            assert_complex_eq(param.ytt, y);
            assert_complex_eq(param.yft, -y * Complex64::from_polar(1.0, shift * DEG_30));
            assert_complex_eq(param.ytf, -y * Complex64::from_polar(1.0, -shift * DEG_30));
        }
    }

    #[test]
    fn asymmetric_parameters_by_winding() {
        let y = series_admittance(0.203, 100e3);
        let zero = Complex64::zero();
        let y1 = Matrix3::from_diagonal_element(y);
        let y2 = Matrix3::from_fn(|i, j| if i == j { y * 2.0 / 3.0 } else { -y / 3.0 });
        let y3 = Matrix3::new(-y, y, zero, zero, -y, y, y, zero, -y) / Complex64::new(SQRT3, 0.0);
        let y4 = Matrix3::new(zero, y, zero, zero, zero, y, y, zero, zero);

        let param: BranchCalcParam<Asymmetric> = build(&with_windings(WindingType::WyeN, WindingType::WyeN, 12)).calc_param();
        assert_tensor_eq(&param.yff, &y1);
        assert_tensor_eq(&param.yft, &-y1);

        let param: BranchCalcParam<Asymmetric> = build(&with_windings(WindingType::Delta, WindingType::WyeN, 11)).calc_param();
        assert_tensor_eq(&param.yff, &y2);
        assert_tensor_eq(&param.yft, &y3.transpose());
        assert_tensor_eq(&param.ytf, &y3);
        assert_tensor_eq(&param.ytt, &y1);

        let param: BranchCalcParam<Asymmetric> = build(&with_windings(WindingType::Wye, WindingType::Delta, 1)).calc_param();
        assert_tensor_eq(&param.yft, &y3);
        assert_tensor_eq(&param.ytt, &y2);

        let param: BranchCalcParam<Asymmetric> = build(&with_windings(WindingType::Wye, WindingType::Wye, 12)).calc_param();
        assert_tensor_eq(&param.ytf, &-y2);

        let param: BranchCalcParam<Asymmetric> = build(&with_windings(WindingType::WyeN, WindingType::WyeN, 2)).calc_param();
        assert_tensor_eq(&param.yff, &y1);
        assert_tensor_eq(&param.yft, &y4);
        assert_tensor_eq(&param.ytf, &y4.transpose());
    }

    #[test]
    fn grounded_zero_sequence() {
        let input = TransformerInput {
            i0: 0.015,
            p0: 30.0e4,
            winding_from: WindingType::Delta,
            winding_to: WindingType::WyeN,
            clock: 11,
            r_grounding_to: Some(1.0),
            x_grounding_to: Some(4.0),
            ..input()
        };
        let transformer = Transformer::new(&input, U1_RATED, U2_RATED).unwrap();
        let base_y_to = base_y(U2_RATED);
        let y_shunt_abs = 0.015 * 30e6 / 10e3 / 10e3;
        let y_shunt_real = 30.0e4 / 10e3 / 10e3;
        let y_shunt = Complex64::new(y_shunt_real, -(y_shunt_abs * y_shunt_abs - y_shunt_real * y_shunt_real).sqrt()) / base_y_to;
        let z1 = 1.0 / series_admittance(0.203, 100e3);
        let zg_to = Complex64::new(1.0, 4.0) * base_y_to;

        let [y0, y_pos, _] = transformer.sequence_admittance(true, true);
        assert_complex_eq(y0.tt, 1.0 / (z1 + zg_to * 3.0) + y_shunt);
        assert_complex_eq(y0.ff, Complex64::zero());
        assert_complex_eq(y0.ft, Complex64::zero());
        assert_complex_eq(y_pos.tt, 1.0 / z1 + y_shunt * 0.5);

        let zigzag = TransformerInput {
            winding_from: WindingType::Wye,
            winding_to: WindingType::ZigzagN,
            ..input
        };
        let [y0, _, _] = Transformer::new(&zigzag, U1_RATED, U2_RATED).unwrap().sequence_admittance(true, true);
        assert_complex_eq(y0.tt, 1.0 / (z1 * 0.1 + zg_to * 3.0));
    }

    #[test]
    fn reversed_tap_range() {
        let input = TransformerInput {
            tap_min: 9,
            tap_max: -11,
            ..input()
        };
        let transformer = Transformer::new(&input, U1_RATED, U2_RATED).unwrap();
        // 155 kV + 2 steps of 2.5 kV
        assert_relative_eq!(transformer.ratio(), 160.0 / 150.0, max_relative = 1e-12);
    }

    #[test]
    fn tap_dependent_short_circuit_voltage() {
        let input = TransformerInput {
            winding_from: WindingType::Delta,
            winding_to: WindingType::WyeN,
            clock: 11,
            uk_min: Some(0.1),
            uk_max: Some(0.4),
            pk_min: Some(50e3),
            pk_max: Some(200e3),
            ..input()
        };
        let transformer = Transformer::new(&input, U1_RATED, U2_RATED).unwrap();
        let (uk, pk) = transformer.tap_adjusted_impedance();
        assert_relative_eq!(uk, 0.203 + (-2.0) * (0.1 - 0.203) / (-11.0), max_relative = 1e-12);
        assert_relative_eq!(pk, 100e3 + (-2.0) * (50e3 - 100e3) / (-11.0), max_relative = 1e-12);

        let up = Transformer::new(&TransformerInput { tap_pos: 3, ..input }, U1_RATED, U2_RATED).unwrap();
        let (uk, _) = up.tap_adjusted_impedance();
        assert_relative_eq!(uk, 0.203 + 3.0 * (0.4 - 0.203) / 9.0, max_relative = 1e-12);

        let y = series_admittance(0.203 + (-2.0) * (0.1 - 0.203) / (-11.0), 100e3 + (-2.0) * (50e3 - 100e3) / (-11.0));
        let param: BranchCalcParam<Symmetric> = build(&input).calc_param();
        assert_complex_eq(param.ytt, y);
    }

    #[test]
    fn loading_from_rated_power() {
        let transformer = Transformer::new(&input(), U1_RATED, U2_RATED).unwrap();
        assert_relative_eq!(transformer.loading(60e6), 2.0);
        assert_relative_eq!(transformer.phase_shift(), 12.0 * DEG_30);

        let branch = build(&input());
        let res = branch.output_from_voltage::<Asymmetric>(
            &Asymmetric::balanced(Complex64::new(1.0, 0.0)),
            &Asymmetric::balanced(Complex64::new(0.95, 0.0)),
        );
        let expected = Asymmetric::sum_val(&res.s_from).max(Asymmetric::sum_val(&res.s_to)) / 30e6;
        assert_relative_eq!(res.loading, expected, max_relative = 1e-12);
    }
}
