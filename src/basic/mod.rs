pub mod batch;
pub mod config;
pub mod container;
pub mod elements;
pub mod error;
pub mod math_output;
pub mod output;
pub mod phase;
pub mod state;
pub mod topology;

#[cfg(feature = "ecs")]
pub mod ecs;

pub use batch::{project_batch, project_short_circuit_batch};
pub use output::short_circuit::{ShortCircuitOutputDataset, project_short_circuit};
pub use output::{OutputDataset, project};
