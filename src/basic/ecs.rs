//! Bevy integration of the result projection.
//!
//! The model and the solver output are stored as resources. [`plugin::ResultProjectionPlugin`]
//! projects the solver output whenever it changes, and [`post_processing::PostProcessing`]
//! offers the same projection plus tabular printing on an [`bevy_app::App`].

pub mod plugin;
pub mod post_processing;

use bevy_ecs::prelude::*;
use derive_more::derive::{Deref, DerefMut};

use super::math_output::{MathOutput, ShortCircuitMathOutput};
use super::output::OutputDataset;
use super::output::short_circuit::ShortCircuitOutputDataset;
use super::phase::PhaseMode;
use super::state::ModelState;

/// Static model the solver output refers to.
#[derive(Debug, Clone, Resource, Deref, DerefMut)]
pub struct GridModel(pub ModelState);

/// Power-flow output of every group, written by the solver.
#[derive(Debug, Clone, Resource, Deref, DerefMut)]
pub struct SolverOutput<S: PhaseMode>(pub Vec<MathOutput<S>>);

/// Short-circuit output of every group, written by the solver.
#[derive(Debug, Clone, Resource, Deref, DerefMut)]
pub struct ShortCircuitSolverOutput<S: PhaseMode>(pub Vec<ShortCircuitMathOutput<S>>);

#[derive(Debug, Clone, Resource, Deref, DerefMut)]
pub struct ProjectedResults<S: PhaseMode>(pub OutputDataset<S>);

#[derive(Debug, Clone, Resource, Deref, DerefMut)]
pub struct ProjectedShortCircuitResults(pub ShortCircuitOutputDataset);
