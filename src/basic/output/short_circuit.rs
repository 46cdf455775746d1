//! Projection of short-circuit results. Records are always per phase, whatever the
//! representation of the math output.

use serde::Serialize;
use tracing::debug;

use super::{at, group, null_records, produce_output, subtype_range, table_slice};
use crate::basic::elements::*;
use crate::basic::error::ProjectionResult;
use crate::basic::math_output::ShortCircuitMathOutput;
use crate::basic::phase::PhaseMode;
use crate::basic::state::ModelState;
use crate::basic::topology::Idx2D;

pub fn sc_output_node<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[ShortCircuitMathOutput<S>],
    res: &'r mut [NodeShortCircuitOutput],
) -> ProjectionResult<&'r mut [NodeShortCircuitOutput]> {
    const CATEGORY: &str = "node";
    let nodes = state.components.nodes();
    let coupling = table_slice(CATEGORY, "coupling", &state.coupling.node, 0..nodes.len())?;
    produce_output(CATEGORY, nodes, coupling, res, |node, idx| {
        if !idx.is_connected() {
            return Ok(NodeShortCircuitOutput::null_output(node.id()));
        }
        let m = group(CATEGORY, math, idx)?;
        Ok(node.sc_output::<S>(at(CATEGORY, "u_bus", &m.u_bus, idx.pos)?))
    })
}

pub fn sc_output_branch<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[ShortCircuitMathOutput<S>],
    kind: Option<BranchKind>,
    res: &'r mut [BranchShortCircuitOutput],
) -> ProjectionResult<&'r mut [BranchShortCircuitOutput]> {
    const CATEGORY: &str = "branch";
    let range = subtype_range(&state.components.offsets().branch, kind);
    let branches = &state.components.branches()[range.clone()];
    let coupling = table_slice(CATEGORY, "coupling", &state.coupling.branch, range)?;
    produce_output(CATEGORY, branches, coupling, res, |branch, idx| {
        if !idx.is_connected() {
            return Ok(BranchShortCircuitOutput::null_output(branch.id()));
        }
        let m = group(CATEGORY, math, idx)?;
        let flow = at(CATEGORY, "branch", &m.branch, idx.pos)?;
        Ok(branch.sc_output::<S>(&flow.i_f, &flow.i_t))
    })
}

pub fn sc_output_branch3<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[ShortCircuitMathOutput<S>],
    kind: Option<Branch3Kind>,
    res: &'r mut [Branch3ShortCircuitOutput],
) -> ProjectionResult<&'r mut [Branch3ShortCircuitOutput]> {
    const CATEGORY: &str = "branch3";
    let range = subtype_range(&state.components.offsets().branch3, kind);
    let branch3s = &state.components.branch3s()[range.clone()];
    let coupling = table_slice(CATEGORY, "coupling", &state.coupling.branch3, range)?;
    produce_output(CATEGORY, branch3s, coupling, res, |branch3, idx| {
        if !idx.is_connected() {
            return Ok(Branch3ShortCircuitOutput::null_output(branch3.id()));
        }
        let m = group(CATEGORY, math, idx.leg(0))?;
        let i = [
            &at(CATEGORY, "branch", &m.branch, idx.pos[0])?.i_f,
            &at(CATEGORY, "branch", &m.branch, idx.pos[1])?.i_f,
            &at(CATEGORY, "branch", &m.branch, idx.pos[2])?.i_f,
        ];
        Ok(branch3.sc_output::<S>(i))
    })
}

pub fn sc_output_source<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[ShortCircuitMathOutput<S>],
    res: &'r mut [ApplianceShortCircuitOutput],
) -> ProjectionResult<&'r mut [ApplianceShortCircuitOutput]> {
    const CATEGORY: &str = "source";
    let sources = state.components.sources();
    let coupling = table_slice(CATEGORY, "coupling", &state.coupling.source, 0..sources.len())?;
    produce_output(CATEGORY, sources, coupling, res, |source, idx| {
        if !idx.is_connected() {
            return Ok(ApplianceShortCircuitOutput::null_output(source.id()));
        }
        let m = group(CATEGORY, math, idx)?;
        Ok(source.sc_output::<S>(&at(CATEGORY, "source", &m.source, idx.pos)?.i))
    })
}

/// Loads and generators are not part of the short-circuit equations.
pub fn sc_output_load_gen<'r, S: PhaseMode>(
    state: &ModelState,
    _math: &[ShortCircuitMathOutput<S>],
    kind: Option<LoadGenKind>,
    res: &'r mut [ApplianceShortCircuitOutput],
) -> ProjectionResult<&'r mut [ApplianceShortCircuitOutput]> {
    const CATEGORY: &str = "load_gen";
    let range = subtype_range(&state.components.offsets().load_gen, kind);
    let load_gens = &state.components.load_gens()[range.clone()];
    let coupling = table_slice(CATEGORY, "coupling", &state.coupling.load_gen, range)?;
    produce_output(CATEGORY, load_gens, coupling, res, |load_gen, idx: Idx2D| {
        if !idx.is_connected() {
            return Ok(ApplianceShortCircuitOutput::null_output(load_gen.id()));
        }
        Ok(load_gen.sc_output())
    })
}

pub fn sc_output_shunt<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[ShortCircuitMathOutput<S>],
    res: &'r mut [ApplianceShortCircuitOutput],
) -> ProjectionResult<&'r mut [ApplianceShortCircuitOutput]> {
    const CATEGORY: &str = "shunt";
    let shunts = state.components.shunts();
    let coupling = table_slice(CATEGORY, "coupling", &state.coupling.shunt, 0..shunts.len())?;
    produce_output(CATEGORY, shunts, coupling, res, |shunt, idx| {
        if !idx.is_connected() {
            return Ok(ApplianceShortCircuitOutput::null_output(shunt.id()));
        }
        let m = group(CATEGORY, math, idx)?;
        Ok(shunt.sc_output::<S>(&at(CATEGORY, "shunt", &m.shunt, idx.pos)?.i))
    })
}

/// Sources, then loads and generators, then shunts.
pub fn sc_output_appliance<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[ShortCircuitMathOutput<S>],
    res: &'r mut [ApplianceShortCircuitOutput],
) -> ProjectionResult<&'r mut [ApplianceShortCircuitOutput]> {
    let res = sc_output_source(state, math, res)?;
    let res = sc_output_load_gen(state, math, None, res)?;
    sc_output_shunt(state, math, res)
}

pub fn sc_output_voltage_sensor<'r>(
    state: &ModelState,
    kind: Option<SensorKind>,
    res: &'r mut [SensorShortCircuitOutput],
) -> ProjectionResult<&'r mut [SensorShortCircuitOutput]> {
    const CATEGORY: &str = "voltage_sensor";
    let range = subtype_range(&state.components.offsets().voltage_sensor, kind);
    let sensors = &state.components.voltage_sensors()[range.clone()];
    let node_idx = table_slice(CATEGORY, "voltage_sensor_node_idx", &state.topology.voltage_sensor_node_idx, range)?;
    produce_output(CATEGORY, sensors, node_idx, res, |sensor, _node_seq| Ok(sensor.sc_output()))
}

pub fn sc_output_power_sensor<'r>(
    state: &ModelState,
    kind: Option<SensorKind>,
    res: &'r mut [SensorShortCircuitOutput],
) -> ProjectionResult<&'r mut [SensorShortCircuitOutput]> {
    const CATEGORY: &str = "power_sensor";
    let range = subtype_range(&state.components.offsets().power_sensor, kind);
    let sensors = &state.components.power_sensors()[range.clone()];
    let object_idx = table_slice(CATEGORY, "power_sensor_object_idx", &state.topology.power_sensor_object_idx, range)?;
    produce_output(CATEGORY, sensors, object_idx, res, |sensor, _obj_seq| Ok(sensor.sc_output()))
}

/// Fault currents, addressed through the fault coupling.
pub fn sc_output_fault<'r, S: PhaseMode>(
    state: &ModelState,
    math: &[ShortCircuitMathOutput<S>],
    res: &'r mut [FaultShortCircuitOutput],
) -> ProjectionResult<&'r mut [FaultShortCircuitOutput]> {
    const CATEGORY: &str = "fault";
    let faults = state.components.faults();
    let coupling = table_slice(CATEGORY, "coupling", &state.coupling.fault, 0..faults.len())?;
    produce_output(CATEGORY, faults, coupling, res, |fault, idx| {
        if !idx.is_connected() {
            return Ok(FaultShortCircuitOutput::null_output(fault.id()));
        }
        let m = group(CATEGORY, math, idx)?;
        Ok(fault.sc_output::<S>(&at(CATEGORY, "fault", &m.fault, idx.pos)?.i_fault))
    })
}

/// Output buffers of one short-circuit scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortCircuitOutputDataset {
    pub node: Vec<NodeShortCircuitOutput>,
    pub branch: Vec<BranchShortCircuitOutput>,
    pub branch3: Vec<Branch3ShortCircuitOutput>,
    pub appliance: Vec<ApplianceShortCircuitOutput>,
    pub voltage_sensor: Vec<SensorShortCircuitOutput>,
    pub power_sensor: Vec<SensorShortCircuitOutput>,
    pub fault: Vec<FaultShortCircuitOutput>,
}

impl ShortCircuitOutputDataset {
    pub fn for_model(state: &ModelState) -> Self {
        let c = &state.components;
        let mut appliance: Vec<ApplianceShortCircuitOutput> = null_records(c.sources(), Source::id);
        appliance.extend(null_records::<_, ApplianceShortCircuitOutput>(c.load_gens(), LoadGen::id));
        appliance.extend(null_records::<_, ApplianceShortCircuitOutput>(c.shunts(), Shunt::id));
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

pub fn sc_output_all<S: PhaseMode>(
    state: &ModelState,
    math: &[ShortCircuitMathOutput<S>],
    dataset: &mut ShortCircuitOutputDataset,
) -> ProjectionResult<()> {
    sc_output_node(state, math, &mut dataset.node)?;
    sc_output_branch(state, math, None, &mut dataset.branch)?;
    sc_output_branch3(state, math, None, &mut dataset.branch3)?;
    sc_output_appliance(state, math, &mut dataset.appliance)?;
    sc_output_voltage_sensor(state, None, &mut dataset.voltage_sensor)?;
    sc_output_power_sensor(state, None, &mut dataset.power_sensor)?;
    sc_output_fault(state, math, &mut dataset.fault)?;
    debug!(
        groups = math.len(),
        nodes = dataset.node.len(),
        faults = dataset.fault.len(),
        symmetric = S::IS_SYMMETRIC,
        "projected short-circuit scenario"
    );
    Ok(())
}

pub fn project_short_circuit<S: PhaseMode>(
    state: &ModelState,
    math: &[ShortCircuitMathOutput<S>],
) -> ProjectionResult<ShortCircuitOutputDataset> {
    let mut dataset = ShortCircuitOutputDataset::for_model(state);
    sc_output_all(state, math, &mut dataset)?;
    Ok(dataset)
}
