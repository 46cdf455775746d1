use bevy_app::App;
use bevy_ecs::{prelude::*, system::RunSystemOnce};
use tabled::{Table, settings::Style};
use tracing::error;

mod res_display;
use res_display::*;

use crate::basic::phase::PhaseMode;

use super::plugin::{project_results, project_short_circuit_results};
use super::*;

/// Prints the node results of calculation mode `S`.
fn print_res_node<S: PhaseMode>(res: Res<ProjectedResults<S>>) {
    let rows = res.node.iter().map(|n| NodeResTable {
        Node: n.id,
        Energized: n.energized,
        Vm_pu: PhaseValues::new::<S>(&n.u_pu, 5),
        U_kv: PhaseValues::scaled::<S>(&n.u, 1e-3, 4),
        Va_degree: PhaseValues::degrees::<S>(&n.u_angle, 4),
        P_mw: PhaseValues::scaled::<S>(&n.p, 1e-6, 5),
        Q_mvar: PhaseValues::scaled::<S>(&n.q, 1e-6, 5),
    });
    let table = Table::new(rows).with(Style::markdown()).to_string();
    println!("{table}");
}

/// Prints the branch results of calculation mode `S`.
fn print_res_branch<S: PhaseMode>(res: Res<ProjectedResults<S>>) {
    let rows = res.branch.iter().map(|b| BranchResTable {
        Branch: b.id,
        Energized: b.energized,
        p_from_mw: PhaseValues::scaled::<S>(&b.p_from, 1e-6, 3),
        q_from_mvar: PhaseValues::scaled::<S>(&b.q_from, 1e-6, 3),
        p_to_mw: PhaseValues::scaled::<S>(&b.p_to, 1e-6, 3),
        q_to_mvar: PhaseValues::scaled::<S>(&b.q_to, 1e-6, 3),
        i_from_ka: PhaseValues::scaled::<S>(&b.i_from, 1e-3, 3),
        i_to_ka: PhaseValues::scaled::<S>(&b.i_to, 1e-3, 3),
        loading_percent: FloatWrapper::new(b.loading * 100.0, 1),
    });
    let table = Table::new(rows).with(Style::markdown()).to_string();
    println!("{table}");
}

fn print_res_fault(res: Res<ProjectedShortCircuitResults>) {
    let rows = res.fault.iter().map(|f| FaultResTable {
        Fault: f.id,
        Energized: f.energized,
        I_ka: PhaseValues::from_slice(f.i_f.as_slice(), 1e-3, 4),
        I_angle_degree: PhaseValues::from_slice(f.i_f_angle.map(f64::to_degrees).as_slice(), 1.0, 2),
    });
    let table = Table::new(rows).with(Style::markdown()).to_string();
    println!("{table}");
}

fn run_logged<M>(app: &mut App, name: &'static str, system: impl IntoSystem<(), (), M>) {
    if let Err(err) = app.world_mut().run_system_once(system) {
        error!(%err, system = name, "post-processing system did not run");
    }
}

/// Trait for post-processing projected results on an `App`.
pub trait PostProcessing {
    /// Projects the current power-flow and short-circuit solver output of mode `S` immediately.
    fn post_process<S: PhaseMode>(&mut self);

    /// Prints the node results of mode `S` as a markdown table.
    fn print_res_node<S: PhaseMode>(&mut self);

    /// Prints the branch results of mode `S` as a markdown table.
    fn print_res_branch<S: PhaseMode>(&mut self);

    /// Prints the short-circuit fault currents.
    fn print_res_fault(&mut self);
}

impl PostProcessing for App {
    fn post_process<S: PhaseMode>(&mut self) {
        if self.world().contains_resource::<SolverOutput<S>>() {
            run_logged(self, "project_results", project_results::<S>);
        }
        if self.world().contains_resource::<ShortCircuitSolverOutput<S>>() {
            run_logged(self, "project_short_circuit_results", project_short_circuit_results::<S>);
        }
    }

    fn print_res_node<S: PhaseMode>(&mut self) {
        run_logged(self, "print_res_node", print_res_node::<S>);
    }

    fn print_res_branch<S: PhaseMode>(&mut self) {
        run_logged(self, "print_res_branch", print_res_branch::<S>);
    }

    fn print_res_fault(&mut self) {
        run_logged(self, "print_res_fault", print_res_fault);
    }
}
