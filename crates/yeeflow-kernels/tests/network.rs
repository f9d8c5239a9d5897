//! End-to-end runs of the six-component Yee network.
//!
//! Field gains derived from the default constants grow by many orders of
//! magnitude per step, so multi-step comparisons use `tame()` constants
//! that keep samples finite.

use indexmap::IndexMap;
use yeeflow_core::{Component, FieldKind, Grid, PhysConstants, PhysParams};
use yeeflow_engine::{
    CostBalanced, EngineConfig, ExecError, FixedCapacity, Growable, KernelPerThread, LockFree,
    SinglePartition, WorkerPool,
};
use yeeflow_kernels::{Iterations, NetworkError, SeedPlan, Simulation, YeeNetwork};
use yeeflow_test_utils::fixtures::{ramp, reference_electric, reference_magnetic};

fn tame() -> PhysConstants {
    PhysConstants {
        c0: 1e-16,
        ..PhysConstants::default()
    }
}

fn configs() -> Vec<EngineConfig> {
    let mut out = Vec::new();
    for alloc in 0..3 {
        let base = match alloc {
            0 => EngineConfig::default().with_allocation(FixedCapacity { capacity: 1 }),
            1 => EngineConfig::default().with_allocation(Growable::default()),
            _ => EngineConfig::default().with_allocation(LockFree { capacity: 1 }),
        };
        out.push(base.clone().with_partition(SinglePartition));
        out.push(base.clone().with_partition(KernelPerThread));
        out.push(base.clone().with_partition(CostBalanced { partitions: 3 }));
        out.push(base.with_schedule(WorkerPool { workers: 4 }));
    }
    out
}

fn close(a: &Grid, b: &Grid) -> bool {
    a.dims() == b.dims()
        && a.as_slice()
            .iter()
            .zip(b.as_slice())
            .all(|(x, y)| (x - y).abs() <= 1e-9 * x.abs().max(y.abs()).max(1.0))
}

fn explicit_ramps(dims: (usize, usize, usize)) -> IndexMap<Component, Grid> {
    Component::ALL
        .into_iter()
        .map(|c| (c, ramp(dims, c.ordinal() as f64 * 0.25)))
        .collect()
}

/// `t` leapfrog steps computed directly from the reference stencils.
fn leapfrog(
    mut grids: IndexMap<Component, Grid>,
    t: u64,
    p: &PhysParams,
) -> IndexMap<Component, Grid> {
    for _ in 0..t {
        for kind in [FieldKind::Magnetic, FieldKind::Electric] {
            let next: Vec<(Component, Grid)> = Component::ALL
                .into_iter()
                .filter(|c| c.kind == kind)
                .map(|c| {
                    let [sb, sg] = c.sources();
                    let g = match kind {
                        FieldKind::Magnetic => {
                            reference_magnetic(c, &grids[&c], [&grids[&sb], &grids[&sg]], p)
                        }
                        FieldKind::Electric => {
                            reference_electric(c, &grids[&c], [&grids[&sb], &grids[&sg]], p)
                        }
                    };
                    (c, g)
                })
                .collect();
            grids.extend(next);
        }
    }
    grids
}

#[test]
fn every_config_performs_exactly_t_updates() {
    let t = 3;
    for config in configs() {
        let label = format!("{config:?}");
        let network = YeeNetwork::builder()
            .dims(3, 3, 3)
            .iterations(Iterations::Bounded(t))
            .seed(SeedPlan::Random { seed: 11 })
            .constants(tame())
            .build()
            .unwrap();
        let out = Simulation::run(network, config).unwrap();
        assert_eq!(out.grids.len(), 6, "{label}");
        assert!(out.updates.values().all(|&n| n == t), "{label}");
        assert_eq!(out.report.residual_tokens(), 0, "{label}");
        // H: seed + t + final. E: seed + 2t + final. Seeds and sinks: once.
        assert_eq!(out.report.total_activations(), 9 * t + 24, "{label}");
        assert!(out.report.kernels.iter().all(|k| k.stopped), "{label}");
    }
}

#[test]
fn grids_come_back_in_output_order() {
    let network = YeeNetwork::builder().dims(2, 2, 2).build().unwrap();
    let out = Simulation::run(network, EngineConfig::default()).unwrap();
    let order: Vec<String> = out.grids.keys().map(ToString::to_string).collect();
    assert_eq!(order, ["Hx", "Hy", "Hz", "Ex", "Ey", "Ez"]);
}

#[test]
fn single_step_from_impulse() {
    let network = YeeNetwork::builder()
        .dims(2, 2, 2)
        .iterations(Iterations::Bounded(1))
        .seed(SeedPlan::Impulse {
            component: Component::EZ,
            x: 0,
            y: 0,
            z: 0,
            value: 1.0,
        })
        .build()
        .unwrap();
    let p = network.params();
    let out = Simulation::run(network, EngineConfig::default()).unwrap();

    // Hx = ch * ((Ey[+z] - Ey) * cz - (Ez[+y] - Ez) * cy) at the origin.
    assert_eq!(out.grids[&Component::HX].at(0, 0, 0), p.ch * p.cy);
    // Hy = ch * ((Ez[+x] - Ez) * cx - (Ex[+z] - Ex) * cz) at the origin.
    assert_eq!(out.grids[&Component::HY].at(0, 0, 0), -(p.ch * p.cx));
    assert!(out.grids[&Component::HZ].as_slice().iter().all(|&v| v == 0.0));

    // The electric interior (1,1,1) only sees H differences that are zero.
    assert_eq!(out.grids[&Component::EZ].at(0, 0, 0), 1.0);
    for c in [Component::EX, Component::EY] {
        assert!(out.grids[&c].as_slice().iter().all(|&v| v == 0.0), "{c}");
    }
}

#[test]
fn matches_reference_leapfrog() {
    let dims = (3, 4, 2);
    for t in 1..=3 {
        let seeds = explicit_ramps(dims);
        let network = YeeNetwork::builder()
            .dims(dims.0, dims.1, dims.2)
            .iterations(Iterations::Bounded(t))
            .seed(SeedPlan::Explicit(seeds.clone()))
            .constants(tame())
            .build()
            .unwrap();
        let p = network.params();
        let expected = leapfrog(seeds, t, &p);
        let out = Simulation::run(network, EngineConfig::pool(3)).unwrap();
        for c in Component::ALL {
            assert!(close(&out.grids[&c], &expected[&c]), "t={t} {c}");
        }
    }
}

#[test]
fn zero_budget_returns_seeds_untouched() {
    let seeds = explicit_ramps((2, 3, 2));
    let network = YeeNetwork::builder()
        .dims(2, 3, 2)
        .iterations(Iterations::Bounded(0))
        .seed(SeedPlan::Explicit(seeds.clone()))
        .build()
        .unwrap();
    let out = Simulation::run(network, EngineConfig::default()).unwrap();
    assert_eq!(out.grids, seeds);
    assert!(out.updates.values().all(|&n| n == 0));
    assert_eq!(out.report.residual_tokens(), 0);
}

#[test]
fn single_cell_grid_is_a_fixed_point() {
    let seeds = explicit_ramps((1, 1, 1));
    let network = YeeNetwork::builder()
        .dims(1, 1, 1)
        .iterations(Iterations::Bounded(4))
        .seed(SeedPlan::Explicit(seeds.clone()))
        .build()
        .unwrap();
    let out = Simulation::run(network, EngineConfig::default()).unwrap();
    assert_eq!(out.grids, seeds);
    assert!(out.updates.values().all(|&n| n == 4));
}

#[test]
fn unbounded_run_is_stopped_by_activation_cap() {
    let network = YeeNetwork::builder()
        .dims(2, 2, 2)
        .iterations(Iterations::from_count(0))
        .constants(tame())
        .build()
        .unwrap();
    let err = Simulation::run_for(network, EngineConfig::default(), 500).unwrap_err();
    assert_eq!(
        err,
        NetworkError::Exec(ExecError::ActivationCapReached { activations: 500 })
    );
}

#[test]
fn random_seeds_are_deterministic_across_schedules() {
    let run = |seed: u64, config: EngineConfig| {
        let network = YeeNetwork::builder()
            .dims(3, 2, 4)
            .iterations(Iterations::Bounded(2))
            .seed(SeedPlan::Random { seed })
            .constants(tame())
            .build()
            .unwrap();
        Simulation::run(network, config).unwrap().grids
    };
    let a = run(42, EngineConfig::default());
    let b = run(42, EngineConfig::pool(4).with_allocation(LockFree { capacity: 1 }));
    let c = run(43, EngineConfig::default());
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn discarded_finals_still_count_updates() {
    let network = YeeNetwork::builder()
        .dims(2, 2, 2)
        .iterations(Iterations::Bounded(2))
        .constants(tame())
        .forward_final(false)
        .build()
        .unwrap();
    let out = Simulation::run(network, EngineConfig::default()).unwrap();
    assert!(out.grids.is_empty());
    assert!(out.updates.values().all(|&n| n == 2));
}
