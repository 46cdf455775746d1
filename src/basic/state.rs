use super::container::ComponentContainer;
use super::error::{ConstructionError, ConstructionResult};
use super::topology::{ComponentToMathCoupling, ComponentTopology};

/// Static state shared by every scenario projected on one model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelState {
    pub components: ComponentContainer,
    pub topology: ComponentTopology,
    pub coupling: ComponentToMathCoupling,
}

fn check_len(category: &'static str, table: &'static str, expected: usize, actual: usize) -> ConstructionResult<()> {
    if expected != actual {
        return Err(ConstructionError::TopologyMismatch {
            category,
            table,
            expected,
            actual,
        });
    }
    Ok(())
}

impl ModelState {
    /// Checks that every coupling and topology table has one entry per component.
    pub fn new(
        components: ComponentContainer,
        topology: ComponentTopology,
        coupling: ComponentToMathCoupling,
    ) -> ConstructionResult<Self> {
        let c = &components;
        check_len("node", "coupling", c.nodes().len(), coupling.node.len())?;
        check_len("branch", "coupling", c.branches().len(), coupling.branch.len())?;
        check_len("branch3", "coupling", c.branch3s().len(), coupling.branch3.len())?;
        check_len("source", "coupling", c.sources().len(), coupling.source.len())?;
        check_len("load_gen", "coupling", c.load_gens().len(), coupling.load_gen.len())?;
        check_len("shunt", "coupling", c.shunts().len(), coupling.shunt.len())?;
        check_len("fault", "coupling", c.faults().len(), coupling.fault.len())?;
        check_len(
            "voltage_sensor",
            "voltage_sensor_node_idx",
            c.voltage_sensors().len(),
            topology.voltage_sensor_node_idx.len(),
        )?;
        check_len(
            "power_sensor",
            "power_sensor_object_idx",
            c.power_sensors().len(),
            topology.power_sensor_object_idx.len(),
        )?;
        Ok(Self {
            components,
            topology,
            coupling,
        })
    }
}
