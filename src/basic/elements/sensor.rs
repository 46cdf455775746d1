//! Voltage and power sensors. Their output is the residual between measured and
//! calculated values, in the representation of the calculation.

use serde::{Deserialize, Serialize};

use crate::basic::error::{ProjectionError, ProjectionResult};
use crate::basic::phase::{BASE_POWER_3P, PhaseMode, SQRT3, wrap_angle};

use super::{ID, NullOutput, SensorKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymVoltageSensorInput {
    pub id: ID,
    pub measured_object: ID,
    /// Standard deviation of the measurement (V).
    pub u_sigma: f64,
    /// Measured line-to-line voltage (V).
    pub u_measured: f64,
    #[serde(default)]
    pub u_angle_measured: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AsymVoltageSensorInput {
    pub id: ID,
    pub measured_object: ID,
    pub u_sigma: f64,
    /// Measured line-to-neutral voltage per phase (V).
    pub u_measured: [f64; 3],
    #[serde(default)]
    pub u_angle_measured: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoltageMeasurement {
    Sym {
        u_sigma: f64,
        u_measured: f64,
        u_angle_measured: f64,
    },
    Asym {
        u_sigma: f64,
        u_measured: [f64; 3],
        u_angle_measured: [f64; 3],
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageSensor {
    id: ID,
    measured_object: ID,
    u_rated: f64,
    measurement: VoltageMeasurement,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoltageSensorOutput<S: PhaseMode> {
    pub id: ID,
    pub energized: bool,
    pub u_residual: S::Real,
    pub u_angle_residual: S::Real,
}

impl<S: PhaseMode> NullOutput for VoltageSensorOutput<S> {
    fn null_output(id: ID) -> Self {
        Self {
            id,
            energized: false,
            u_residual: S::real_zero(),
            u_angle_residual: S::real_zero(),
        }
    }
}

/// Sensor output of a short-circuit calculation, which never uses measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorShortCircuitOutput {
    pub id: ID,
    pub energized: bool,
}

impl NullOutput for SensorShortCircuitOutput {
    fn null_output(id: ID) -> Self {
        Self { id, energized: false }
    }
}

impl VoltageSensor {
    pub fn sym(input: &SymVoltageSensorInput, u_rated: f64) -> Self {
        Self {
            id: input.id,
            measured_object: input.measured_object,
            u_rated,
            measurement: VoltageMeasurement::Sym {
                u_sigma: input.u_sigma,
                u_measured: input.u_measured,
                u_angle_measured: input.u_angle_measured,
            },
        }
    }

    pub fn asym(input: &AsymVoltageSensorInput, u_rated: f64) -> Self {
        Self {
            id: input.id,
            measured_object: input.measured_object,
            u_rated,
            measurement: VoltageMeasurement::Asym {
                u_sigma: input.u_sigma,
                u_measured: input.u_measured,
                u_angle_measured: input.u_angle_measured,
            },
        }
    }

    pub fn id(&self) -> ID {
        self.id
    }

    pub fn measured_object(&self) -> ID {
        self.measured_object
    }

    pub fn measurement(&self) -> &VoltageMeasurement {
        &self.measurement
    }

    pub fn kind(&self) -> SensorKind {
        match self.measurement {
            VoltageMeasurement::Sym { .. } => SensorKind::Sym,
            VoltageMeasurement::Asym { .. } => SensorKind::Asym,
        }
    }

    /// Measured magnitude and angle in the representation of the calculation.
    fn measured<S: PhaseMode>(&self) -> (S::Real, S::Real) {
        match self.measurement {
            VoltageMeasurement::Sym {
                u_measured,
                u_angle_measured,
                ..
            } => (S::splat(S::voltage_base(u_measured)), S::phase_angles(u_angle_measured)),
            VoltageMeasurement::Asym {
                u_measured,
                u_angle_measured,
                ..
            } => (
                // phase voltages are scaled to line voltages first
                S::map_real(&S::real_from_phases(u_measured.map(|u| u * SQRT3)), S::voltage_base),
                S::angle_from_phases(u_angle_measured),
            ),
        }
    }

    pub fn output<S: PhaseMode>(&self, u: &S::Complex) -> VoltageSensorOutput<S> {
        let (u_measured, u_angle_measured) = self.measured::<S>();
        let u_calc = S::cabs(u) * S::voltage_base(self.u_rated);
        let u_angle_calc = S::arg(u);
        VoltageSensorOutput {
            id: self.id,
            energized: true,
            u_residual: u_measured - u_calc,
            u_angle_residual: S::map_real(&(u_angle_measured - u_angle_calc), wrap_angle),
        }
    }

    pub fn sc_output(&self) -> SensorShortCircuitOutput {
        SensorShortCircuitOutput::null_output(self.id)
    }
}

/// Terminal of the measured object, with its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasuredTerminalType {
    BranchFrom = 0,
    BranchTo = 1,
    Source = 2,
    Shunt = 3,
    Load = 4,
    Generator = 5,
    Branch3_1 = 6,
    Branch3_2 = 7,
    Branch3_3 = 8,
    Node = 9,
}

impl TryFrom<i8> for MeasuredTerminalType {
    type Error = ProjectionError;

    fn try_from(code: i8) -> ProjectionResult<Self> {
        use MeasuredTerminalType::*;
        Ok(match code {
            0 => BranchFrom,
            1 => BranchTo,
            2 => Source,
            3 => Shunt,
            4 => Load,
            5 => Generator,
            6 => Branch3_1,
            7 => Branch3_2,
            8 => Branch3_3,
            9 => Node,
            _ => {
                return Err(ProjectionError::MissingCaseForEnum {
                    context: "GenericPowerSensor output_result()",
                    enum_name: "MeasuredTerminalType",
                    value: i64::from(code),
                });
            }
        })
    }
}

impl MeasuredTerminalType {
    /// Reference direction of the measured power relative to the bus injection.
    pub fn direction(self) -> f64 {
        match self {
            MeasuredTerminalType::Load | MeasuredTerminalType::Shunt => -1.0,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymPowerSensorInput {
    pub id: ID,
    pub measured_object: ID,
    /// Raw [`MeasuredTerminalType`] code.
    pub measured_terminal_type: i8,
    pub power_sigma: f64,
    /// Measured total power (W, var).
    pub p_measured: f64,
    pub q_measured: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AsymPowerSensorInput {
    pub id: ID,
    pub measured_object: ID,
    pub measured_terminal_type: i8,
    pub power_sigma: f64,
    /// Measured power per phase (W, var).
    pub p_measured: [f64; 3],
    pub q_measured: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerMeasurement {
    Sym {
        power_sigma: f64,
        p_measured: f64,
        q_measured: f64,
    },
    Asym {
        power_sigma: f64,
        p_measured: [f64; 3],
        q_measured: [f64; 3],
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSensor {
    id: ID,
    measured_object: ID,
    terminal_type: i8,
    measurement: PowerMeasurement,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerSensorOutput<S: PhaseMode> {
    pub id: ID,
    pub energized: bool,
    pub p_residual: S::Real,
    pub q_residual: S::Real,
}

impl<S: PhaseMode> NullOutput for PowerSensorOutput<S> {
    fn null_output(id: ID) -> Self {
        Self {
            id,
            energized: false,
            p_residual: S::real_zero(),
            q_residual: S::real_zero(),
        }
    }
}

impl PowerSensor {
    pub fn sym(input: &SymPowerSensorInput) -> Self {
        Self {
            id: input.id,
            measured_object: input.measured_object,
            terminal_type: input.measured_terminal_type,
            measurement: PowerMeasurement::Sym {
                power_sigma: input.power_sigma,
                p_measured: input.p_measured,
                q_measured: input.q_measured,
            },
        }
    }

    pub fn asym(input: &AsymPowerSensorInput) -> Self {
        Self {
            id: input.id,
            measured_object: input.measured_object,
            terminal_type: input.measured_terminal_type,
            measurement: PowerMeasurement::Asym {
                power_sigma: input.power_sigma,
                p_measured: input.p_measured,
                q_measured: input.q_measured,
            },
        }
    }

    pub fn id(&self) -> ID {
        self.id
    }

    pub fn measured_object(&self) -> ID {
        self.measured_object
    }

    pub fn measurement(&self) -> &PowerMeasurement {
        &self.measurement
    }

    pub fn kind(&self) -> SensorKind {
        match self.measurement {
            PowerMeasurement::Sym { .. } => SensorKind::Sym,
            PowerMeasurement::Asym { .. } => SensorKind::Asym,
        }
    }

    pub fn terminal_code(&self) -> i8 {
        self.terminal_type
    }

    pub fn terminal_type(&self) -> ProjectionResult<MeasuredTerminalType> {
        MeasuredTerminalType::try_from(self.terminal_type)
    }

    /// Measured power in the representation and power base of the calculation.
    fn measured<S: PhaseMode>(&self) -> (S::Real, S::Real) {
        let scale = S::BASE_POWER / BASE_POWER_3P;
        match self.measurement {
            PowerMeasurement::Sym {
                p_measured, q_measured, ..
            } => (S::splat(p_measured * scale), S::splat(q_measured * scale)),
            PowerMeasurement::Asym {
                p_measured, q_measured, ..
            } => (
                S::real_from_phases(p_measured.map(|p| p * 3.0)) * scale,
                S::real_from_phases(q_measured.map(|q| q * 3.0)) * scale,
            ),
        }
    }

    /// Residual against the per-unit power flowing into the measured terminal.
    pub fn output<S: PhaseMode>(&self, s: &S::Complex) -> ProjectionResult<PowerSensorOutput<S>> {
        let direction = self.terminal_type()?.direction();
        let (p_measured, q_measured) = self.measured::<S>();
        Ok(PowerSensorOutput {
            id: self.id,
            energized: true,
            p_residual: p_measured - S::real(s) * (S::BASE_POWER * direction),
            q_residual: q_measured - S::imag(s) * (S::BASE_POWER * direction),
        })
    }

    pub fn sc_output(&self) -> SensorShortCircuitOutput {
        SensorShortCircuitOutput::null_output(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::phase::{Asymmetric, DEG_120, Symmetric};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use num_complex::Complex64;

    fn sym_voltage_sensor() -> VoltageSensor {
        VoltageSensor::sym(
            &SymVoltageSensorInput {
                id: 3,
                measured_object: 1,
                u_sigma: 1.0,
                u_measured: 10.1e3,
                u_angle_measured: 0.1,
            },
            10e3,
        )
    }

    #[test]
    fn symmetric_voltage_residual() {
        let sensor = sym_voltage_sensor();
        assert_eq!(sensor.kind(), SensorKind::Sym);
        let u = Complex64::from_polar(1.0, 0.05);
        let res = sensor.output::<Symmetric>(&u);
        assert!(res.energized);
        assert_relative_eq!(res.u_residual, 100.0, max_relative = 1e-9);
        assert_relative_eq!(res.u_angle_residual, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn symmetric_measurement_in_asymmetric_calculation() {
        let sensor = sym_voltage_sensor();
        let u = Asymmetric::balanced(Complex64::from_polar(1.0, 0.05));
        let res = sensor.output::<Asymmetric>(&u);
        for phase in 0..3 {
            assert_relative_eq!(res.u_residual[phase], 100.0 / SQRT3, max_relative = 1e-9);
            assert_relative_eq!(res.u_angle_residual[phase], 0.05, epsilon = 1e-9);
        }
    }

    #[test]
    fn asymmetric_measurement_in_both_calculations() {
        let u_phase = 10e3 / SQRT3;
        let sensor = VoltageSensor::asym(
            &AsymVoltageSensorInput {
                id: 4,
                measured_object: 1,
                u_sigma: 1.0,
                u_measured: [u_phase, u_phase * 1.01, u_phase * 0.99],
                u_angle_measured: [0.0, -DEG_120, DEG_120],
            },
            10e3,
        );
        assert_eq!(sensor.kind(), SensorKind::Asym);

        let res = sensor.output::<Asymmetric>(&Asymmetric::balanced(Complex64::new(1.0, 0.0)));
        assert_relative_eq!(res.u_residual[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(res.u_residual[1], u_phase * 0.01, max_relative = 1e-6);
        assert_relative_eq!(res.u_angle_residual[2], 0.0, epsilon = 1e-9);

        // the average magnitude matches the rated voltage
        let res = sensor.output::<Symmetric>(&Complex64::new(1.0, 0.0));
        assert_relative_eq!(res.u_residual, 0.0, epsilon = 1e-6);
        assert_relative_eq!(res.u_angle_residual, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn angle_residual_is_wrapped() {
        let sensor = VoltageSensor::sym(
            &SymVoltageSensorInput {
                id: 3,
                measured_object: 1,
                u_sigma: 1.0,
                u_measured: 10e3,
                u_angle_measured: 3.0,
            },
            10e3,
        );
        let res = sensor.output::<Symmetric>(&Complex64::from_polar(1.0, -3.0));
        assert_relative_eq!(res.u_angle_residual, 6.0 - 2.0 * std::f64::consts::PI, epsilon = 1e-12);
    }

    fn sym_power_sensor(terminal: i8) -> PowerSensor {
        PowerSensor::sym(&SymPowerSensorInput {
            id: 5,
            measured_object: 2,
            measured_terminal_type: terminal,
            power_sigma: 1.0,
            p_measured: 3e6,
            q_measured: 1e6,
        })
    }

    #[test]
    fn terminal_codes() {
        assert_eq!(MeasuredTerminalType::try_from(0), Ok(MeasuredTerminalType::BranchFrom));
        assert_eq!(MeasuredTerminalType::try_from(8), Ok(MeasuredTerminalType::Branch3_3));
        assert_eq!(MeasuredTerminalType::try_from(9), Ok(MeasuredTerminalType::Node));
        assert_eq!(
            MeasuredTerminalType::try_from(42),
            Err(ProjectionError::MissingCaseForEnum {
                context: "GenericPowerSensor output_result()",
                enum_name: "MeasuredTerminalType",
                value: 42,
            })
        );
    }

    #[test]
    fn power_residual_follows_terminal_direction() {
        let s = Complex64::new(2.0, 1.0);
        let res = sym_power_sensor(0).output::<Symmetric>(&s).unwrap();
        assert_relative_eq!(res.p_residual, 1e6);
        assert_relative_eq!(res.q_residual, 0.0);

        // a consuming load injects negative power
        let res = sym_power_sensor(4).output::<Symmetric>(&-s).unwrap();
        assert_relative_eq!(res.p_residual, 1e6);
        assert_relative_eq!(res.q_residual, 0.0);

        assert!(sym_power_sensor(-1).output::<Symmetric>(&s).is_err());
    }

    #[test]
    fn asymmetric_power_residual() {
        let sensor = PowerSensor::asym(&AsymPowerSensorInput {
            id: 6,
            measured_object: 2,
            measured_terminal_type: 5,
            power_sigma: 1.0,
            p_measured: [1e6, 1e6, 1e6],
            q_measured: [0.0, 0.0, 3e5],
        });
        assert_eq!(sensor.kind(), SensorKind::Asym);
        let s = Vector3::repeat(Complex64::new(3.0, 0.0));
        let res = sensor.output::<Asymmetric>(&s).unwrap();
        assert_relative_eq!(res.p_residual[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(res.q_residual[2], 3e5, epsilon = 1e-6);

        let res = sensor.output::<Symmetric>(&Complex64::new(3.0, 0.3)).unwrap();
        assert_relative_eq!(res.p_residual, 0.0, epsilon = 1e-6);
        assert_relative_eq!(res.q_residual, 0.0, epsilon = 1e-6);

        let res = sym_power_sensor(2).output::<Asymmetric>(&Vector3::repeat(Complex64::new(3.0, 1.0))).unwrap();
        assert_relative_eq!(res.p_residual[1], 0.0, epsilon = 1e-6);
        assert!(PowerSensorOutput::<Asymmetric>::null_output(6).p_residual.iter().all(|x| *x == 0.0));
        assert!(!sensor.sc_output().energized);
    }
}
