//! Solver output per solved sub-network, in per-unit.
//!
//! Appliance quantities are injections into the bus, so a consuming load has
//! negative active power here.

use super::phase::PhaseMode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchMathOutput<S: PhaseMode> {
    pub s_f: S::Complex,
    pub s_t: S::Complex,
    pub i_f: S::Complex,
    pub i_t: S::Complex,
}

impl<S: PhaseMode> Default for BranchMathOutput<S> {
    fn default() -> Self {
        Self {
            s_f: S::complex_zero(),
            s_t: S::complex_zero(),
            i_f: S::complex_zero(),
            i_t: S::complex_zero(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplianceMathOutput<S: PhaseMode> {
    pub s: S::Complex,
    pub i: S::Complex,
}

impl<S: PhaseMode> Default for ApplianceMathOutput<S> {
    fn default() -> Self {
        Self {
            s: S::complex_zero(),
            i: S::complex_zero(),
        }
    }
}

/// Power-flow or state-estimation output of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct MathOutput<S: PhaseMode> {
    pub u: Vec<S::Complex>,
    pub bus_injection: Vec<S::Complex>,
    pub branch: Vec<BranchMathOutput<S>>,
    pub source: Vec<ApplianceMathOutput<S>>,
    pub shunt: Vec<ApplianceMathOutput<S>>,
    pub load_gen: Vec<ApplianceMathOutput<S>>,
}

impl<S: PhaseMode> Default for MathOutput<S> {
    fn default() -> Self {
        Self {
            u: Vec::new(),
            bus_injection: Vec::new(),
            branch: Vec::new(),
            source: Vec::new(),
            shunt: Vec::new(),
            load_gen: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchShortCircuitMathOutput<S: PhaseMode> {
    pub i_f: S::Complex,
    pub i_t: S::Complex,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplianceShortCircuitMathOutput<S: PhaseMode> {
    pub i: S::Complex,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultShortCircuitMathOutput<S: PhaseMode> {
    pub i_fault: S::Complex,
}

/// Short-circuit output of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortCircuitMathOutput<S: PhaseMode> {
    pub u_bus: Vec<S::Complex>,
    pub branch: Vec<BranchShortCircuitMathOutput<S>>,
    pub source: Vec<ApplianceShortCircuitMathOutput<S>>,
    pub shunt: Vec<ApplianceShortCircuitMathOutput<S>>,
    pub fault: Vec<FaultShortCircuitMathOutput<S>>,
}

impl<S: PhaseMode> Default for ShortCircuitMathOutput<S> {
    fn default() -> Self {
        Self {
            u_bus: Vec::new(),
            branch: Vec::new(),
            source: Vec::new(),
            shunt: Vec::new(),
            fault: Vec::new(),
        }
    }
}
