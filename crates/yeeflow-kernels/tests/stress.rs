//! Repeated multi-threaded runs: a schedule that occasionally reports a
//! spurious stall shows up here long before it shows up in a single run.

use yeeflow_core::PhysConstants;
use yeeflow_engine::{EngineConfig, FixedCapacity, KernelPerThread, WorkerPool};
use yeeflow_kernels::{Iterations, SeedPlan, Simulation, YeeNetwork};

const RUNS: u64 = 200;
const STEPS: u64 = 20;

fn repeat(config: EngineConfig) {
    let constants = PhysConstants {
        c0: 1e-16,
        ..PhysConstants::default()
    };
    for run in 0..RUNS {
        let network = YeeNetwork::builder()
            .dims(2, 2, 2)
            .iterations(Iterations::Bounded(STEPS))
            .seed(SeedPlan::Random { seed: run })
            .constants(constants)
            .build()
            .unwrap();
        let out = match Simulation::run(network, config.clone()) {
            Ok(out) => out,
            Err(e) => panic!("run {run} failed: {e}"),
        };
        assert!(out.updates.values().all(|&n| n == STEPS), "run {run}");
        assert_eq!(out.report.residual_tokens(), 0, "run {run}");
    }
}

#[test]
fn kernel_per_thread_never_stalls_spuriously() {
    repeat(
        EngineConfig::default()
            .with_allocation(FixedCapacity { capacity: 1 })
            .with_partition(KernelPerThread),
    );
}

#[test]
fn worker_pool_never_stalls_spuriously() {
    repeat(
        EngineConfig::default()
            .with_allocation(FixedCapacity { capacity: 1 })
            .with_schedule(WorkerPool { workers: 3 }),
    );
}
