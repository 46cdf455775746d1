use std::fmt;

use tabled::Tabled;

use crate::basic::elements::ID;
use crate::basic::phase::PhaseMode;

/// A wrapper around a float that limits the number of decimal places when printed.
#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub(crate) struct FloatWrapper {
    pub(crate) value: f64,
    pub(crate) precision: usize,
}

impl FloatWrapper {
    pub fn new(value: f64, precision: usize) -> Self {
        FloatWrapper { value, precision }
    }
}

impl fmt::Display for FloatWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1$}", self.value, self.precision)
    }
}

impl fmt::Debug for FloatWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// One value per phase, printed as `a / b / c` with a fixed number of decimals.
#[derive(Clone, PartialEq)]
pub(crate) struct PhaseValues(Vec<FloatWrapper>);

impl PhaseValues {
    pub fn from_slice(values: &[f64], scale: f64, precision: usize) -> Self {
        PhaseValues(values.iter().map(|v| FloatWrapper::new(v * scale, precision)).collect())
    }

    pub fn new<S: PhaseMode>(x: &S::Real, precision: usize) -> Self {
        Self::from_slice(S::real_values(x), 1.0, precision)
    }

    pub fn scaled<S: PhaseMode>(x: &S::Real, scale: f64, precision: usize) -> Self {
        Self::from_slice(S::real_values(x), scale, precision)
    }

    /// Angles given in radians.
    pub fn degrees<S: PhaseMode>(x: &S::Real, precision: usize) -> Self {
        Self::new::<S>(&S::map_real(x, f64::to_degrees), precision)
    }
}

impl fmt::Display for PhaseValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" / ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for PhaseValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Table row for display node results.
#[derive(Debug, Tabled)]
#[allow(non_snake_case)]
pub(crate) struct NodeResTable {
    pub(crate) Node: ID,
    pub(crate) Energized: bool,
    pub(crate) Vm_pu: PhaseValues,
    pub(crate) U_kv: PhaseValues,
    pub(crate) Va_degree: PhaseValues,
    pub(crate) P_mw: PhaseValues,
    pub(crate) Q_mvar: PhaseValues,
}

/// Table row for display branch results.
#[derive(Debug, Tabled)]
#[allow(non_snake_case)]
pub(crate) struct BranchResTable {
    pub(crate) Branch: ID,
    pub(crate) Energized: bool,
    pub(crate) p_from_mw: PhaseValues,
    pub(crate) q_from_mvar: PhaseValues,
    pub(crate) p_to_mw: PhaseValues,
    pub(crate) q_to_mvar: PhaseValues,
    pub(crate) i_from_ka: PhaseValues,
    pub(crate) i_to_ka: PhaseValues,
    pub(crate) loading_percent: FloatWrapper,
}

#[derive(Debug, Tabled)]
#[allow(non_snake_case)]
pub(crate) struct FaultResTable {
    pub(crate) Fault: ID,
    pub(crate) Energized: bool,
    pub(crate) I_ka: PhaseValues,
    pub(crate) I_angle_degree: PhaseValues,
}
