use std::marker::PhantomData;

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use tracing::error;

use crate::basic::config::CalculationConfig;
use crate::basic::output::project;
use crate::basic::output::short_circuit::project_short_circuit;
use crate::basic::phase::{Asymmetric, PhaseMode, Symmetric};

use super::*;

/// System set holding the projection systems of every calculation mode.
#[derive(Debug, SystemSet, Hash, Eq, PartialEq, Clone)]
pub struct ProjectionStage;

/// Projects solver output of calculation mode `S` into result resources.
///
/// The systems run in [`Update`] once a [`GridModel`] exists and only in frames where the
/// matching solver output resource was inserted or changed.
pub struct ResultProjectionPlugin<S: PhaseMode>(PhantomData<S>);

impl<S: PhaseMode> Default for ResultProjectionPlugin<S> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<S: PhaseMode> Plugin for ResultProjectionPlugin<S> {
    /// Registers the configuration resource and the power-flow and short-circuit
    /// projection systems of mode `S`.
    fn build(&self, app: &mut App) {
        app.init_resource::<CalculationConfig>();
        app.add_systems(
            Update,
            (
                project_results::<S>
                    .run_if(resource_exists::<GridModel>)
                    .run_if(resource_exists_and_changed::<SolverOutput<S>>),
                project_short_circuit_results::<S>
                    .run_if(resource_exists::<GridModel>)
                    .run_if(resource_exists_and_changed::<ShortCircuitSolverOutput<S>>),
            )
                .in_set(ProjectionStage),
        );
    }
}

/// Replaces [`ProjectedResults`] with the projection of the current solver output.
///
/// A failed projection is logged and leaves the previous results in place.
pub(crate) fn project_results<S: PhaseMode>(
    mut cmd: Commands,
    model: Res<GridModel>,
    solver: Res<SolverOutput<S>>,
) {
    match project(&model, &solver) {
        Ok(dataset) => cmd.insert_resource(ProjectedResults(dataset)),
        Err(err) => error!(%err, symmetric = S::IS_SYMMETRIC, "power-flow result projection failed"),
    }
}

pub(crate) fn project_short_circuit_results<S: PhaseMode>(
    mut cmd: Commands,
    model: Res<GridModel>,
    solver: Res<ShortCircuitSolverOutput<S>>,
) {
    match project_short_circuit(&model, &solver) {
        Ok(dataset) => cmd.insert_resource(ProjectedShortCircuitResults(dataset)),
        Err(err) => error!(%err, symmetric = S::IS_SYMMETRIC, "short-circuit result projection failed"),
    }
}

/// Creates an `App` projecting both symmetric and asymmetric solver output.
pub fn default_app() -> App {
    let mut app = App::new();
    app.add_plugins((
        ResultProjectionPlugin::<Symmetric>::default(),
        ResultProjectionPlugin::<Asymmetric>::default(),
    ));
    app
}
