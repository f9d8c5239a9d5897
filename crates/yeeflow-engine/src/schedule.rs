//! Schedule strategies: how execution units pick kernels to activate.
//!
//! - [`Cooperative`]: one execution unit per partition group, each driving
//!   its kernels round-robin. A single group runs on the calling thread,
//!   deterministically.
//! - [`WorkerPool`]: `workers` threads pulling ready kernels from one
//!   shared, mutex-protected set. Partition groups are ignored.
//!
//! Both wait on the runtime's [`Doorbell`](crate::runtime::Doorbell)
//! instead of spinning, and both report a stall when every unit is parked
//! on the same generation.

use std::collections::VecDeque;
use std::thread;

use parking_lot::Mutex;
use yeeflow_core::KernelId;

use crate::error::ExecError;
use crate::partition::Partitioning;
use crate::runtime::{Activation, Runtime, UnitGuard, Wake};

/// Drives a [`Runtime`] until every kernel has stopped or the run fails.
pub trait ScheduleStrategy: Send + Sync {
    /// Short strategy name for logging and reports.
    fn name(&self) -> &'static str;

    /// Check the strategy's parameters.
    ///
    /// # Errors
    ///
    /// A description of the invalid parameter.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Run to completion. Returns the number of execution units used.
    ///
    /// # Errors
    ///
    /// The first failure recorded by any unit.
    fn run(&self, rt: &Runtime, partitioning: &Partitioning) -> Result<usize, ExecError>;
}

// ── Cooperative ────────────────────────────────────────────────────

/// One execution unit per partition group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cooperative;

impl ScheduleStrategy for Cooperative {
    fn name(&self) -> &'static str {
        "cooperative"
    }

    fn run(&self, rt: &Runtime, partitioning: &Partitioning) -> Result<usize, ExecError> {
        let groups = partitioning.groups();
        rt.doorbell().enlist(groups.len());
        if let [only] = groups {
            drive_group(rt, only);
            return rt.outcome(1);
        }
        spawn_units(rt, groups.len(), |i| drive_group(rt, &groups[i]));
        rt.outcome(groups.len())
    }
}

fn drive_group(rt: &Runtime, group: &[KernelId]) {
    let _unit = UnitGuard::new(rt);
    let mut live: Vec<usize> = group.iter().map(|k| k.index()).collect();
    while !live.is_empty() {
        if rt.is_aborted() {
            return;
        }
        let seen = rt.doorbell().generation();
        let mut progressed = false;
        let mut i = 0;
        while i < live.len() {
            match rt.try_activate(live[i]) {
                Ok(Activation::Idle) => i += 1,
                Ok(Activation::Continued) => {
                    rt.doorbell().ring();
                    progressed = true;
                    i += 1;
                }
                Ok(Activation::Stopped) => {
                    rt.doorbell().ring();
                    progressed = true;
                    live.remove(i);
                }
                Err(e) => {
                    rt.fail(e);
                    return;
                }
            }
        }
        if !progressed && !wait(rt, seen) {
            return;
        }
    }
}

/// Park until progress. Returns `false` if the unit should exit.
fn wait(rt: &Runtime, seen: u64) -> bool {
    match rt.doorbell().park(seen) {
        Wake::Progress => true,
        Wake::Aborted => false,
        Wake::Stalled => {
            rt.stall();
            false
        }
    }
}

// ── WorkerPool ─────────────────────────────────────────────────────

/// `workers` threads sharing one ready set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerPool {
    /// Number of worker threads. Must be at least 1.
    pub workers: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self { workers }
    }
}

impl ScheduleStrategy for WorkerPool {
    fn name(&self) -> &'static str {
        "worker-pool"
    }

    fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("worker pool needs at least 1 worker".into());
        }
        Ok(())
    }

    fn run(&self, rt: &Runtime, _partitioning: &Partitioning) -> Result<usize, ExecError> {
        // Unclaimed kernels that have not stopped.
        let idle: Mutex<VecDeque<usize>> = Mutex::new((0..rt.kernel_count()).collect());
        rt.doorbell().enlist(self.workers);
        spawn_units(rt, self.workers, |_| pool_worker(rt, &idle));
        rt.outcome(self.workers)
    }
}

fn pool_worker(rt: &Runtime, idle: &Mutex<VecDeque<usize>>) {
    let _unit = UnitGuard::new(rt);
    loop {
        if rt.is_aborted() || rt.all_stopped() {
            return;
        }
        let seen = rt.doorbell().generation();
        let claimed = {
            let mut set = idle.lock();
            let mut found = None;
            for (pos, &k) in set.iter().enumerate() {
                match rt.is_ready(k) {
                    Ok(true) => {
                        found = Some(pos);
                        break;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        rt.fail(e);
                        return;
                    }
                }
            }
            found.and_then(|pos| set.remove(pos))
        };
        match claimed {
            Some(k) => {
                match rt.try_activate(k) {
                    Ok(Activation::Stopped) => {}
                    Ok(Activation::Continued | Activation::Idle) => idle.lock().push_back(k),
                    Err(e) => {
                        rt.fail(e);
                        return;
                    }
                }
                rt.doorbell().ring();
            }
            None => {
                if !wait(rt, seen) {
                    return;
                }
            }
        }
    }
}

// ── Threads ────────────────────────────────────────────────────────

/// Run `units` scoped threads executing `body(i)`, recording spawn
/// failures and panics on the runtime.
fn spawn_units<F>(rt: &Runtime, units: usize, body: F)
where
    F: Fn(usize) + Sync,
{
    let body = &body;
    thread::scope(|s| {
        let mut handles = Vec::with_capacity(units);
        for i in 0..units {
            let name = format!("yeeflow-unit-{i}");
            match thread::Builder::new()
                .name(name.clone())
                .spawn_scoped(s, move || body(i))
            {
                Ok(h) => handles.push((name, h)),
                Err(e) => {
                    rt.fail(ExecError::SpawnFailed {
                        reason: e.to_string(),
                    });
                    // Units never spawned will never retire.
                    for _ in i..units {
                        rt.doorbell().retire();
                    }
                    break;
                }
            }
        }
        for (name, h) in handles {
            if h.join().is_err() {
                rt.fail(ExecError::WorkerPanicked { unit: name });
            }
        }
    });
}
