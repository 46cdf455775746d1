//! Symmetric and asymmetric three-phase quantities.
//!
//! A calculation runs either in symmetric mode, where every electrical quantity is the
//! positive-sequence equivalent held in one scalar, or in asymmetric mode, where every
//! quantity is a per-phase vector and admittances are 3x3 phase tensors.
//! [`PhaseMode`] is implemented by the two marker types [`Symmetric`] and [`Asymmetric`]
//! and carries the representation as associated types, so the output formulas are
//! written once and instantiated for both modes.

use std::f64::consts::PI;
use std::fmt::Debug;
use std::ops::{Add, Mul, Neg, Sub};

use nalgebra::{Matrix3, Vector3};
use num_complex::Complex64;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

pub const SQRT3: f64 = 1.732_050_807_568_877_2;
/// Three-phase power base (VA).
pub const BASE_POWER_3P: f64 = 1e6;
/// Single-phase power base (VA).
pub const BASE_POWER_1P: f64 = BASE_POWER_3P / 3.0;
pub const DEG_30: f64 = PI / 6.0;
pub const DEG_120: f64 = 2.0 * PI / 3.0;
pub const NUMERICAL_TOLERANCE: f64 = 1e-8;

/// Rotation operator `a = e^{j120°}`.
pub const A: Complex64 = Complex64::new(-0.5, SQRT3 / 2.0);
/// `a² = e^{j240°}`.
pub const A2: Complex64 = Complex64::new(-0.5, -SQRT3 / 2.0);

/// Base current of a terminal with rated line voltage `u_rated`.
pub fn base_i(u_rated: f64) -> f64 {
    BASE_POWER_3P / u_rated / SQRT3
}

/// Base admittance of a terminal with rated line voltage `u_rated`.
pub fn base_y(u_rated: f64) -> f64 {
    BASE_POWER_3P / (u_rated * u_rated)
}

/// Wraps an angle into `[-π, π)`.
pub fn wrap_angle(theta: f64) -> f64 {
    (theta + PI).rem_euclid(2.0 * PI) - PI
}

/// Sequence (0, 1, 2) to phase (a, b, c) transformation.
fn sequence_to_phase() -> Matrix3<Complex64> {
    let one = Complex64::new(1.0, 0.0);
    Matrix3::new(one, one, one, one, A2, A, one, A, A2)
}

/// Phase (a, b, c) to sequence (0, 1, 2) transformation.
fn phase_to_sequence() -> Matrix3<Complex64> {
    let one = Complex64::new(1.0, 0.0);
    Matrix3::new(one, one, one, one, A, A2, one, A2, A) * Complex64::new(1.0 / 3.0, 0.0)
}

/// Representation of electrical quantities in one calculation mode.
pub trait PhaseMode:
    Copy + Clone + Default + Debug + PartialEq + Serialize + Send + Sync + 'static
{
    const IS_SYMMETRIC: bool;
    /// Power base of one output quantity: three-phase in symmetric mode, per phase otherwise.
    const BASE_POWER: f64;

    type Real: Copy
        + Debug
        + PartialEq
        + Serialize
        + Send
        + Sync
        + 'static
        + Add<Output = Self::Real>
        + Sub<Output = Self::Real>
        + Mul<f64, Output = Self::Real>;
    type Complex: Copy
        + Debug
        + PartialEq
        + Send
        + Sync
        + 'static
        + Add<Output = Self::Complex>
        + Sub<Output = Self::Complex>
        + Neg<Output = Self::Complex>
        + Mul<Complex64, Output = Self::Complex>;
    type Tensor: Copy
        + Debug
        + PartialEq
        + Send
        + Sync
        + 'static
        + Add<Output = Self::Tensor>
        + Mul<Self::Complex, Output = Self::Complex>
        + Mul<Complex64, Output = Self::Tensor>;

    fn real_zero() -> Self::Real;
    fn complex_zero() -> Self::Complex;
    fn tensor_zero() -> Self::Tensor;

    /// Same real value in every phase.
    fn splat(x: f64) -> Self::Real;
    /// Same complex value in every phase, without rotation.
    fn piecewise(x: Complex64) -> Self::Complex;
    /// Positive-sequence phasor spread over the phases as `(x, x·a², x·a)`.
    fn balanced(x: Complex64) -> Self::Complex;
    /// Per-phase real values; the symmetric representation keeps their average.
    fn real_from_phases(x: [f64; 3]) -> Self::Real;
    /// Per-phase complex values; the symmetric representation keeps their average.
    fn complex_from_phases(x: [Complex64; 3]) -> Self::Complex;
    /// Per-phase angles; the symmetric representation keeps phase a.
    fn angle_from_phases(x: [f64; 3]) -> Self::Real;
    /// Angle of phase a spread over the phases with their nominal displacement.
    fn phase_angles(theta: f64) -> Self::Real;

    /// Tensor of an admittance that is decoupled in the sequence domain.
    fn from_sequence(y0: Complex64, y1: Complex64, y2: Complex64) -> Self::Tensor;

    fn cabs(x: &Self::Complex) -> Self::Real;
    fn arg(x: &Self::Complex) -> Self::Real;
    fn real(x: &Self::Complex) -> Self::Real;
    fn imag(x: &Self::Complex) -> Self::Real;
    /// Element-wise `x · conj(y)`.
    fn mul_conj(x: &Self::Complex, y: &Self::Complex) -> Self::Complex;

    fn map_real(x: &Self::Real, f: impl Fn(f64) -> f64) -> Self::Real;
    fn zip_real(x: &Self::Real, y: &Self::Real, f: impl Fn(f64, f64) -> f64) -> Self::Real;
    fn max_val(x: &Self::Real) -> f64;
    fn sum_val(x: &Self::Real) -> f64;
    /// Values of a real quantity, one per phase in asymmetric mode.
    fn real_values(x: &Self::Real) -> &[f64];

    /// Phase voltage base of a node with rated line voltage `u_rated`.
    fn voltage_base(u_rated: f64) -> f64;
    fn positive_sequence(x: &Self::Complex) -> Complex64;
    /// Three-phase view of a quantity, expanding a symmetric value into balanced phasors.
    fn to_three_phase(x: &Self::Complex) -> Vector3<Complex64>;
}

/// Symmetric (positive-sequence) calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symmetric;

/// Asymmetric (per-phase) calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asymmetric;

impl PhaseMode for Symmetric {
    const IS_SYMMETRIC: bool = true;
    const BASE_POWER: f64 = BASE_POWER_3P;

    type Real = f64;
    type Complex = Complex64;
    type Tensor = Complex64;

    fn real_zero() -> f64 {
        0.0
    }
    fn complex_zero() -> Complex64 {
        Complex64::zero()
    }
    fn tensor_zero() -> Complex64 {
        Complex64::zero()
    }

    fn splat(x: f64) -> f64 {
        x
    }
    fn piecewise(x: Complex64) -> Complex64 {
        x
    }
    fn balanced(x: Complex64) -> Complex64 {
        x
    }
    fn real_from_phases(x: [f64; 3]) -> f64 {
        (x[0] + x[1] + x[2]) / 3.0
    }
    fn complex_from_phases(x: [Complex64; 3]) -> Complex64 {
        (x[0] + x[1] + x[2]) / 3.0
    }
    fn angle_from_phases(x: [f64; 3]) -> f64 {
        x[0]
    }
    fn phase_angles(theta: f64) -> f64 {
        theta
    }

    fn from_sequence(_y0: Complex64, y1: Complex64, _y2: Complex64) -> Complex64 {
        y1
    }

    fn cabs(x: &Complex64) -> f64 {
        x.norm()
    }
    fn arg(x: &Complex64) -> f64 {
        x.arg()
    }
    fn real(x: &Complex64) -> f64 {
        x.re
    }
    fn imag(x: &Complex64) -> f64 {
        x.im
    }
    fn mul_conj(x: &Complex64, y: &Complex64) -> Complex64 {
        x * y.conj()
    }

    fn map_real(x: &f64, f: impl Fn(f64) -> f64) -> f64 {
        f(*x)
    }
    fn zip_real(x: &f64, y: &f64, f: impl Fn(f64, f64) -> f64) -> f64 {
        f(*x, *y)
    }
    fn max_val(x: &f64) -> f64 {
        *x
    }
    fn sum_val(x: &f64) -> f64 {
        *x
    }
    fn real_values(x: &f64) -> &[f64] {
        std::slice::from_ref(x)
    }

    fn voltage_base(u_rated: f64) -> f64 {
        u_rated
    }
    fn positive_sequence(x: &Complex64) -> Complex64 {
        *x
    }
    fn to_three_phase(x: &Complex64) -> Vector3<Complex64> {
        Asymmetric::balanced(*x)
    }
}

impl PhaseMode for Asymmetric {
    const IS_SYMMETRIC: bool = false;
    const BASE_POWER: f64 = BASE_POWER_1P;

    type Real = Vector3<f64>;
    type Complex = Vector3<Complex64>;
    type Tensor = Matrix3<Complex64>;

    fn real_zero() -> Vector3<f64> {
        Vector3::zeros()
    }
    fn complex_zero() -> Vector3<Complex64> {
        Vector3::zeros()
    }
    fn tensor_zero() -> Matrix3<Complex64> {
        Matrix3::zeros()
    }

    fn splat(x: f64) -> Vector3<f64> {
        Vector3::repeat(x)
    }
    fn piecewise(x: Complex64) -> Vector3<Complex64> {
        Vector3::repeat(x)
    }
    fn balanced(x: Complex64) -> Vector3<Complex64> {
        Vector3::new(x, x * A2, x * A)
    }
    fn real_from_phases(x: [f64; 3]) -> Vector3<f64> {
        Vector3::from(x)
    }
    fn complex_from_phases(x: [Complex64; 3]) -> Vector3<Complex64> {
        Vector3::from(x)
    }
    fn angle_from_phases(x: [f64; 3]) -> Vector3<f64> {
        Vector3::from(x)
    }
    fn phase_angles(theta: f64) -> Vector3<f64> {
        Vector3::new(theta, theta - DEG_120, theta + DEG_120)
    }

    fn from_sequence(y0: Complex64, y1: Complex64, y2: Complex64) -> Matrix3<Complex64> {
        sequence_to_phase()
            * Matrix3::from_diagonal(&Vector3::new(y0, y1, y2))
            * phase_to_sequence()
    }

    fn cabs(x: &Vector3<Complex64>) -> Vector3<f64> {
        x.map(|c| c.norm())
    }
    fn arg(x: &Vector3<Complex64>) -> Vector3<f64> {
        x.map(|c| c.arg())
    }
    fn real(x: &Vector3<Complex64>) -> Vector3<f64> {
        x.map(|c| c.re)
    }
    fn imag(x: &Vector3<Complex64>) -> Vector3<f64> {
        x.map(|c| c.im)
    }
    fn mul_conj(x: &Vector3<Complex64>, y: &Vector3<Complex64>) -> Vector3<Complex64> {
        x.zip_map(y, |a, b| a * b.conj())
    }

    fn map_real(x: &Vector3<f64>, f: impl Fn(f64) -> f64) -> Vector3<f64> {
        x.map(f)
    }
    fn zip_real(x: &Vector3<f64>, y: &Vector3<f64>, f: impl Fn(f64, f64) -> f64) -> Vector3<f64> {
        x.zip_map(y, f)
    }
    fn max_val(x: &Vector3<f64>) -> f64 {
        x.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
    fn sum_val(x: &Vector3<f64>) -> f64 {
        x.sum()
    }
    fn real_values(x: &Vector3<f64>) -> &[f64] {
        x.as_slice()
    }

    fn voltage_base(u_rated: f64) -> f64 {
        u_rated / SQRT3
    }
    fn positive_sequence(x: &Vector3<Complex64>) -> Complex64 {
        (x[0] + A * x[1] + A2 * x[2]) / 3.0
    }
    fn to_three_phase(x: &Vector3<Complex64>) -> Vector3<Complex64> {
        *x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_tensor_eq(x: &Matrix3<Complex64>, y: &Matrix3<Complex64>) {
        for (a, b) in x.iter().zip(y.iter()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-9);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn rotation_operator() {
        let a = Complex64::from_polar(1.0, DEG_120);
        assert_relative_eq!(A.re, a.re, epsilon = 1e-12);
        assert_relative_eq!(A.im, a.im, epsilon = 1e-12);
        let one = A * A * A;
        assert_relative_eq!(one.re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(one.im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn sequence_tensor_without_shift() {
        let y1 = Complex64::new(1.0, -2.0);
        let y0 = Complex64::new(0.5, 3.0);
        let y = Asymmetric::from_sequence(y0, y1, y1);
        let diag = (y1 * 2.0 + y0) / 3.0;
        let off = (y0 - y1) / 3.0;
        let expected = Matrix3::from_fn(|i, j| if i == j { diag } else { off });
        assert_tensor_eq(&y, &expected);
        assert_eq!(Symmetric::from_sequence(y0, y1, y1), y1);
    }

    #[test]
    fn balanced_phasors_keep_positive_sequence() {
        let x = Complex64::from_polar(0.95, 0.3);
        let abc = Asymmetric::balanced(x);
        let x1 = Asymmetric::positive_sequence(&abc);
        assert_relative_eq!(x1.re, x.re, epsilon = 1e-12);
        assert_relative_eq!(x1.im, x.im, epsilon = 1e-12);
        assert_eq!(Symmetric::to_three_phase(&x), abc);
        let angles = Asymmetric::arg(&abc);
        assert_relative_eq!(angles[1], wrap_angle(0.3 - DEG_120), epsilon = 1e-12);
        assert_relative_eq!(angles[2], wrap_angle(0.3 + DEG_120), epsilon = 1e-12);
    }

    #[test]
    fn tensor_multiplies_balanced_voltage() {
        let y1 = Complex64::new(2.0, -5.0);
        let y0 = Complex64::new(1.0, -1.0);
        let y = Asymmetric::from_sequence(y0, y1, y1);
        let u = Complex64::from_polar(1.02, -0.1);
        let i = y * Asymmetric::balanced(u);
        let i1 = Asymmetric::positive_sequence(&i);
        let expected = y1 * u;
        assert_relative_eq!(i1.re, expected.re, epsilon = 1e-9);
        assert_relative_eq!(i1.im, expected.im, epsilon = 1e-9);
    }

    #[test]
    fn reductions() {
        let x = Vector3::new(1.0, 4.0, -2.0);
        assert_eq!(Asymmetric::max_val(&x), 4.0);
        assert_eq!(Asymmetric::sum_val(&x), 3.0);
        assert_eq!(Symmetric::real_from_phases([1.0, 2.0, 3.0]), 2.0);
        assert_relative_eq!(wrap_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(base_i(10e3), 1e6 / 10e3 / SQRT3);
    }
}
