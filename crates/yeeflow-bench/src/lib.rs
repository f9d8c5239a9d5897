//! Benchmark profiles for the yeeflow dataflow engine.
//!
//! - [`reference_network`]: 16x16x16 grid (4K cells), 10 leapfrog steps
//! - [`stress_network`]: 64x64x64 grid (~262K cells), 5 leapfrog steps
//! - [`strategy_matrix`]: the engine configurations compared by the
//!   network benchmarks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use yeeflow_core::PhysConstants;
use yeeflow_engine::{
    EngineConfig, FixedCapacity, Growable, KernelPerThread, LockFree, WorkerPool,
};
use yeeflow_kernels::{Iterations, SeedPlan, YeeNetwork};

/// Constants whose update gains keep random fields finite over long runs.
pub fn bench_constants() -> PhysConstants {
    PhysConstants {
        c0: 1e-16,
        ..PhysConstants::default()
    }
}

fn network(side: usize, steps: u64, seed: u64) -> YeeNetwork {
    match YeeNetwork::builder()
        .dims(side, side, side)
        .iterations(Iterations::Bounded(steps))
        .seed(SeedPlan::Random { seed })
        .constants(bench_constants())
        .forward_final(false)
        .build()
    {
        Ok(n) => n,
        Err(e) => panic!("benchmark network is invalid: {e}"),
    }
}

/// Build the reference benchmark network: 16x16x16 grid, 10 steps.
///
/// Final grids are discarded so only the simulation is measured.
pub fn reference_network(seed: u64) -> YeeNetwork {
    network(16, 10, seed)
}

/// Build the stress benchmark network: 64x64x64 grid, 5 steps.
pub fn stress_network(seed: u64) -> YeeNetwork {
    network(64, 5, seed)
}

/// Named engine configurations compared by the network benchmarks.
pub fn strategy_matrix() -> Vec<(&'static str, EngineConfig)> {
    vec![
        ("cooperative_fixed", EngineConfig::default()),
        (
            "cooperative_dynamic",
            EngineConfig::default().with_allocation(Growable::default()),
        ),
        (
            "per_kernel_fixed",
            EngineConfig::default()
                .with_partition(KernelPerThread)
                .with_allocation(FixedCapacity { capacity: 1 }),
        ),
        (
            "per_kernel_lock_free",
            EngineConfig::default()
                .with_partition(KernelPerThread)
                .with_allocation(LockFree { capacity: 1 }),
        ),
        (
            "pool4_fixed",
            EngineConfig::default().with_schedule(WorkerPool { workers: 4 }),
        ),
    ]
}
