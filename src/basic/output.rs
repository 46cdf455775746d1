//! Result projection: solver output per group to physical output per component.
//!
//! Every entry point walks one category (or one subtype of it) in canonical order
//! together with its coupling entries, writes one record per component into the front
//! of `res` and returns the unwritten tail, so calls for several categories can be
//! chained over one buffer. Components outside any solved group get their null record.

pub mod short_circuit;

use std::ops::Range;

use serde::Serialize;
use tracing::debug;

use super::container::CategoryOffsets;
use super::elements::*;
use super::error::{ProjectionError, ProjectionResult};
use super::math_output::MathOutput;
use super::phase::PhaseMode;
use super::state::ModelState;
use super::topology::Idx2D;

/// Writes `formula(component, coupling entry)` for every component into the front of `res`.
pub(crate) fn produce_output<'r, C, I: Copy, O>(
    category: &'static str,
    components: &[C],
    coupling: &[I],
    res: &'r mut [O],
    mut formula: impl FnMut(&C, I) -> ProjectionResult<O>,
) -> ProjectionResult<&'r mut [O]> {
    if res.len() < components.len() {
        return Err(ProjectionError::OutputTooShort {
            category,
            expected: components.len(),
            actual: res.len(),
        });
    }
    let (head, tail) = res.split_at_mut(components.len());
    for ((component, idx), slot) in components.iter().zip(coupling).zip(head.iter_mut()) {
        *slot = formula(component, *idx)?;
    }
    Ok(tail)
}

/// Sub-slice of a coupling or topology table.
pub(crate) fn table_slice<'t, T>(
    category: &'static str,
    table: &'static str,
    items: &'t [T],
    range: Range<usize>,
) -> ProjectionResult<&'t [T]> {
    let len = items.len();
    let end = range.end;
    items.get(range).ok_or(ProjectionError::PositionOutOfRange {
        category,
        table,
        pos: end as i64,
        len,
    })
}

/// Math output of the group of `idx`.
pub(crate) fn group<'m, M>(category: &'static str, math: &'m [M], idx: Idx2D) -> ProjectionResult<&'m M> {
    usize::try_from(idx.group)
        .ok()
        .and_then(|g| math.get(g))
        .ok_or(ProjectionError::GroupOutOfRange {
            category,
            group: idx.group,
            groups: math.len(),
        })
}

/// Entry `pos` of one math output table.
pub(crate) fn at<'m, T>(category: &'static str, table: &'static str, items: &'m [T], pos: i64) -> ProjectionResult<&'m T> {
    usize::try_from(pos)
        .ok()
        .and_then(|p| items.get(p))
        .ok_or(ProjectionError::PositionOutOfRange {
            category,
            table,
            pos,
            len: items.len(),
        })
}

pub(crate) fn subtype_range<K: Subtype>(offsets: &CategoryOffsets<K>, kind: Option<K>) -> Range<usize> {
    kind.map_or(0..offsets.total(), |k| offsets.range(k))
}

pub fn output_node<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[MathOutput<S>],
    res: &'r mut [NodeOutput<S>],
) -> ProjectionResult<&'r mut [NodeOutput<S>]> {
    const CATEGORY: &str = "node";
    let nodes = state.components.nodes();
    let coupling = table_slice(CATEGORY, "coupling", &state.coupling.node, 0..nodes.len())?;
    produce_output(CATEGORY, nodes, coupling, res, |node, idx| {
        if !idx.is_connected() {
            return Ok(NodeOutput::null_output(node.id()));
        }
        let m = group(CATEGORY, math, idx)?;
        Ok(node.output(
            at(CATEGORY, "u", &m.u, idx.pos)?,
            at(CATEGORY, "bus_injection", &m.bus_injection, idx.pos)?,
        ))
    })
}

/// Branches of one subtype, or of every subtype when `kind` is `None`.
pub fn output_branch<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[MathOutput<S>],
    kind: Option<BranchKind>,
    res: &'r mut [BranchOutput<S>],
) -> ProjectionResult<&'r mut [BranchOutput<S>]> {
    const CATEGORY: &str = "branch";
    let range = subtype_range(&state.components.offsets().branch, kind);
    let branches = &state.components.branches()[range.clone()];
    let coupling = table_slice(CATEGORY, "coupling", &state.coupling.branch, range)?;
    produce_output(CATEGORY, branches, coupling, res, |branch, idx| {
        if !idx.is_connected() {
            return Ok(BranchOutput::null_output(branch.id()));
        }
        let m = group(CATEGORY, math, idx)?;
        Ok(branch.output(at(CATEGORY, "branch", &m.branch, idx.pos)?))
    })
}

pub fn output_branch3<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[MathOutput<S>],
    kind: Option<Branch3Kind>,
    res: &'r mut [Branch3Output<S>],
) -> ProjectionResult<&'r mut [Branch3Output<S>]> {
    const CATEGORY: &str = "branch3";
    let range = subtype_range(&state.components.offsets().branch3, kind);
    let branch3s = &state.components.branch3s()[range.clone()];
    let coupling = table_slice(CATEGORY, "coupling", &state.coupling.branch3, range)?;
    produce_output(CATEGORY, branch3s, coupling, res, |branch3, idx| {
        if !idx.is_connected() {
            return Ok(Branch3Output::null_output(branch3.id()));
        }
        let m = group(CATEGORY, math, idx.leg(0))?;
        let legs = [
            at(CATEGORY, "branch", &m.branch, idx.pos[0])?,
            at(CATEGORY, "branch", &m.branch, idx.pos[1])?,
            at(CATEGORY, "branch", &m.branch, idx.pos[2])?,
        ];
        Ok(branch3.output(legs))
    })
}

pub fn output_source<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[MathOutput<S>],
    res: &'r mut [ApplianceOutput<S>],
) -> ProjectionResult<&'r mut [ApplianceOutput<S>]> {
    const CATEGORY: &str = "source";
    let sources = state.components.sources();
    let coupling = table_slice(CATEGORY, "coupling", &state.coupling.source, 0..sources.len())?;
    produce_output(CATEGORY, sources, coupling, res, |source, idx| {
        if !idx.is_connected() {
            return Ok(ApplianceOutput::null_output(source.id()));
        }
        let m = group(CATEGORY, math, idx)?;
        Ok(source.output(at(CATEGORY, "source", &m.source, idx.pos)?))
    })
}

pub fn output_load_gen<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[MathOutput<S>],
    kind: Option<LoadGenKind>,
    res: &'r mut [ApplianceOutput<S>],
) -> ProjectionResult<&'r mut [ApplianceOutput<S>]> {
    const CATEGORY: &str = "load_gen";
    let range = subtype_range(&state.components.offsets().load_gen, kind);
    let load_gens = &state.components.load_gens()[range.clone()];
    let coupling = table_slice(CATEGORY, "coupling", &state.coupling.load_gen, range)?;
    produce_output(CATEGORY, load_gens, coupling, res, |load_gen, idx| {
        if !idx.is_connected() {
            return Ok(ApplianceOutput::null_output(load_gen.id()));
        }
        let m = group(CATEGORY, math, idx)?;
        Ok(load_gen.output(at(CATEGORY, "load_gen", &m.load_gen, idx.pos)?))
    })
}

pub fn output_shunt<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[MathOutput<S>],
    res: &'r mut [ApplianceOutput<S>],
) -> ProjectionResult<&'r mut [ApplianceOutput<S>]> {
    const CATEGORY: &str = "shunt";
    let shunts = state.components.shunts();
    let coupling = table_slice(CATEGORY, "coupling", &state.coupling.shunt, 0..shunts.len())?;
    produce_output(CATEGORY, shunts, coupling, res, |shunt, idx| {
        if !idx.is_connected() {
            return Ok(ApplianceOutput::null_output(shunt.id()));
        }
        let m = group(CATEGORY, math, idx)?;
        Ok(shunt.output(at(CATEGORY, "shunt", &m.shunt, idx.pos)?))
    })
}

/// Sources, then loads and generators, then shunts.
pub fn output_appliance<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[MathOutput<S>],
    res: &'r mut [ApplianceOutput<S>],
) -> ProjectionResult<&'r mut [ApplianceOutput<S>]> {
    let res = output_source(state, math, res)?;
    let res = output_load_gen(state, math, None, res)?;
    output_shunt(state, math, res)
}

pub fn output_voltage_sensor<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[MathOutput<S>],
    kind: Option<SensorKind>,
    res: &'r mut [VoltageSensorOutput<S>],
) -> ProjectionResult<&'r mut [VoltageSensorOutput<S>]> {
    const CATEGORY: &str = "voltage_sensor";
    let range = subtype_range(&state.components.offsets().voltage_sensor, kind);
    let sensors = &state.components.voltage_sensors()[range.clone()];
    let node_idx = table_slice(CATEGORY, "voltage_sensor_node_idx", &state.topology.voltage_sensor_node_idx, range)?;
    produce_output(CATEGORY, sensors, node_idx, res, |sensor, node_seq| {
        let idx = *at(CATEGORY, "node coupling", &state.coupling.node, node_seq as i64)?;
        if !idx.is_connected() {
            return Ok(VoltageSensorOutput::null_output(sensor.id()));
        }
        let m = group(CATEGORY, math, idx)?;
        Ok(sensor.output(at(CATEGORY, "u", &m.u, idx.pos)?))
    })
}

/// Coupling entry of the object a power sensor measures.
fn measured_object_idx(state: &ModelState, terminal: MeasuredTerminalType, obj_seq: usize) -> ProjectionResult<Idx2D> {
    use MeasuredTerminalType::*;
    const CATEGORY: &str = "power_sensor";
    let coupling = &state.coupling;
    let pos = obj_seq as i64;
    Ok(match terminal {
        BranchFrom | BranchTo => *at(CATEGORY, "branch coupling", &coupling.branch, pos)?,
        Source => *at(CATEGORY, "source coupling", &coupling.source, pos)?,
        Shunt => *at(CATEGORY, "shunt coupling", &coupling.shunt, pos)?,
        Load | Generator => *at(CATEGORY, "load_gen coupling", &coupling.load_gen, pos)?,
        Node => *at(CATEGORY, "node coupling", &coupling.node, pos)?,
        Branch3_1 => at(CATEGORY, "branch3 coupling", &coupling.branch3, pos)?.leg(0),
        Branch3_2 => at(CATEGORY, "branch3 coupling", &coupling.branch3, pos)?.leg(1),
        Branch3_3 => at(CATEGORY, "branch3 coupling", &coupling.branch3, pos)?.leg(2),
    })
}

pub fn output_power_sensor<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[MathOutput<S>],
    kind: Option<SensorKind>,
    res: &'r mut [PowerSensorOutput<S>],
) -> ProjectionResult<&'r mut [PowerSensorOutput<S>]> {
    use MeasuredTerminalType::*;
    const CATEGORY: &str = "power_sensor";
    let range = subtype_range(&state.components.offsets().power_sensor, kind);
    let sensors = &state.components.power_sensors()[range.clone()];
    let object_idx = table_slice(CATEGORY, "power_sensor_object_idx", &state.topology.power_sensor_object_idx, range)?;
    produce_output(CATEGORY, sensors, object_idx, res, |sensor, obj_seq| {
        let terminal = sensor.terminal_type()?;
        let idx = measured_object_idx(state, terminal, obj_seq)?;
        if !idx.is_connected() {
            return Ok(PowerSensorOutput::null_output(sensor.id()));
        }
        let m = group(CATEGORY, math, idx)?;
        let s = match terminal {
            // the legs of a three-winding transformer are measured at their from-side
            BranchFrom | Branch3_1 | Branch3_2 | Branch3_3 => &at(CATEGORY, "branch", &m.branch, idx.pos)?.s_f,
            BranchTo => &at(CATEGORY, "branch", &m.branch, idx.pos)?.s_t,
            Source => &at(CATEGORY, "source", &m.source, idx.pos)?.s,
            Shunt => &at(CATEGORY, "shunt", &m.shunt, idx.pos)?.s,
            Load | Generator => &at(CATEGORY, "load_gen", &m.load_gen, idx.pos)?.s,
            Node => at(CATEGORY, "bus_injection", &m.bus_injection, idx.pos)?,
        };
        sensor.output(s)
    })
}

/// Faults have no power-flow result; the coupling is walked for uniformity only.
pub fn output_fault<'r, S: PhaseMode>(
    state: &ModelState,
    _math: &[MathOutput<S>],
    res: &'r mut [FaultOutput],
) -> ProjectionResult<&'r mut [FaultOutput]> {
    const CATEGORY: &str = "fault";
    let faults = state.components.faults();
    let coupling = table_slice(CATEGORY, "coupling", &state.coupling.fault, 0..faults.len())?;
    produce_output(CATEGORY, faults, coupling, res, |fault, _idx: Idx2D| Ok(fault.output()))
}

pub(crate) fn null_records<C, O: NullOutput>(components: &[C], id: impl Fn(&C) -> ID) -> Vec<O> {
    components.iter().map(|c| O::null_output(id(c))).collect()
}

/// Output buffers of one power-flow scenario, one record per component in canonical order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDataset<S: PhaseMode> {
    pub node: Vec<NodeOutput<S>>,
    pub branch: Vec<BranchOutput<S>>,
    pub branch3: Vec<Branch3Output<S>>,
    /// Sources, loads/generators and shunts, in that order.
    pub appliance: Vec<ApplianceOutput<S>>,
    pub voltage_sensor: Vec<VoltageSensorOutput<S>>,
    pub power_sensor: Vec<PowerSensorOutput<S>>,
    pub fault: Vec<FaultOutput>,
}

impl<S: PhaseMode> OutputDataset<S> {
    /// Buffers sized for `state`, holding null records.
    pub fn for_model(state: &ModelState) -> Self {
        let c = &state.components;
        let mut appliance: Vec<ApplianceOutput<S>> = null_records(c.sources(), Source::id);
        appliance.extend(null_records::<_, ApplianceOutput<S>>(c.load_gens(), LoadGen::id));
        appliance.extend(null_records::<_, ApplianceOutput<S>>(c.shunts(), Shunt::id));
        Self {
            node: null_records(c.nodes(), Node::id),
            branch: null_records(c.branches(), Branch::id),
            branch3: null_records(c.branch3s(), Branch3::id),
            appliance,
            voltage_sensor: null_records(c.voltage_sensors(), VoltageSensor::id),
            power_sensor: null_records(c.power_sensors(), PowerSensor::id),
            fault: null_records(c.faults(), Fault::id),
        }
    }
}

/// Projects every category of one scenario into `dataset`.
pub fn output_all<S: PhaseMode>(
    state: &ModelState,
    math: &[MathOutput<S>],
    dataset: &mut OutputDataset<S>,
) -> ProjectionResult<()> {
    output_node(state, math, &mut dataset.node)?;
    output_branch(state, math, None, &mut dataset.branch)?;
    output_branch3(state, math, None, &mut dataset.branch3)?;
    output_appliance(state, math, &mut dataset.appliance)?;
    output_voltage_sensor(state, math, None, &mut dataset.voltage_sensor)?;
    output_power_sensor(state, math, None, &mut dataset.power_sensor)?;
    output_fault(state, math, &mut dataset.fault)?;
    debug!(
        groups = math.len(),
        nodes = dataset.node.len(),
        branches = dataset.branch.len(),
        appliances = dataset.appliance.len(),
        symmetric = S::IS_SYMMETRIC,
        "projected power-flow scenario"
    );
    Ok(())
}

/// Projects one scenario into freshly allocated buffers.
pub fn project<S: PhaseMode>(state: &ModelState, math: &[MathOutput<S>]) -> ProjectionResult<OutputDataset<S>> {
    let mut dataset = OutputDataset::for_model(state);
    output_all(state, math, &mut dataset)?;
    Ok(dataset)
}
