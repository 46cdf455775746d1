//! Error types of model construction, result projection and batch execution.
//!
//! Disconnected components are not errors: they project to a null output record.
//! Only inconsistent input or an internally inconsistent dispatch ends up here.

use thiserror::Error;

use super::elements::{FaultPhase, FaultType, ID, WindingType};

/// Result type alias using [`ConstructionError`].
pub type ConstructionResult<T> = std::result::Result<T, ConstructionError>;

/// Result type alias using [`ProjectionError`].
pub type ProjectionResult<T> = std::result::Result<T, ProjectionError>;

/// Invalid component definitions, raised while the model is built.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    /// Branch with both terminals at the same node
    #[error("Branch {id} has the same from- and to-node {node}")]
    InvalidBranch { id: ID, node: ID },

    /// Three-winding transformer with two windings at the same node
    #[error("Three-winding transformer {id} is connected to node {node} more than once")]
    InvalidBranch3 { id: ID, node: ID },

    #[error(
        "Conflicting voltage for line {id}: node {from_node} is rated {u_from} V, node {to_node} is rated {u_to} V"
    )]
    ConflictVoltage {
        id: ID,
        from_node: ID,
        to_node: ID,
        u_from: f64,
        u_to: f64,
    },

    #[error(
        "Invalid clock for transformer {id}: clock {clock}, winding_from {winding_from:?}, winding_to {winding_to:?}"
    )]
    InvalidTransformerClock {
        id: ID,
        clock: i8,
        winding_from: WindingType,
        winding_to: WindingType,
    },

    #[error("Fault {id} of type {fault_type:?} cannot act on phases {fault_phase:?}")]
    InvalidShortCircuitPhases {
        id: ID,
        fault_type: FaultType,
        fault_phase: FaultPhase,
    },

    #[error("Conflicting id {0}")]
    ConflictId(ID),

    #[error("The id {0} cannot be found")]
    IdNotFound(ID),

    #[error("Wrong type for object with id {0}")]
    IdWrongType(ID),

    /// Coupling or topology table whose length disagrees with the component count
    #[error("{category} has {expected} components but its {table} table has {actual} entries")]
    TopologyMismatch {
        category: &'static str,
        table: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Failure to load a model from its JSON input.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("invalid grid input: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

/// Inconsistency found while projecting one scenario. It aborts that scenario only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("{context} is not implemented for {enum_name} #{value}")]
    MissingCaseForEnum {
        context: &'static str,
        enum_name: &'static str,
        value: i64,
    },

    #[error("{category}: group {group} is out of range, the math output has {groups} groups")]
    GroupOutOfRange {
        category: &'static str,
        group: i64,
        groups: usize,
    },

    #[error("{category}: position {pos} is out of range for {table} with {len} entries")]
    PositionOutOfRange {
        category: &'static str,
        table: &'static str,
        pos: i64,
        len: usize,
    },

    #[error("{category}: result buffer has {actual} slots, {expected} are required")]
    OutputTooShort {
        category: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Failure of a batch projection.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("failed to build projection thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{scenarios} scenarios were given for {results} result buffers")]
    ScenarioCountMismatch { scenarios: usize, results: usize },

    /// Scenarios whose projection failed; every other scenario has been written.
    #[error("projection failed in {} scenario(s): {}", .failed_scenarios.len(), .messages.join("; "))]
    ScenarioFailures {
        failed_scenarios: Vec<usize>,
        messages: Vec<String>,
    },
}

/// Invalid calculation configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("threading must be -1 (sequential), 0 (all cores) or a positive worker count, got {0}")]
    InvalidThreading(i64),
}
