//! Shared run state: kernel slots, the doorbell and failure tracking.
//!
//! A [`Runtime`] owns every kernel together with its port endpoints, each
//! behind its own mutex, so any execution unit can activate any kernel
//! while two units never activate the same kernel at once. Schedule
//! strategies drive it through [`try_activate`](Runtime::try_activate) and
//! wait on its [`Doorbell`] when nothing they own is ready.
//!
//! Readiness is monotone: only the kernel itself consumes its inputs or
//! fills its outputs, so a kernel observed ready stays ready until it is
//! activated. A unit that found nothing ready therefore only needs to wait
//! for *some* activation to complete before looking again.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};
use yeeflow_core::KernelId;
use yeeflow_kernel::{demand_satisfied, InputPort, Kernel, KernelContext, KernelStatus, OutputPort};

use crate::error::ExecError;
use crate::metrics::KernelMetrics;
use crate::topology::Node;

// ── Doorbell ───────────────────────────────────────────────────────

/// Why [`Doorbell::park`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wake {
    /// Some activation completed since the caller's snapshot.
    Progress,
    /// Every active unit is parked on the same generation: nothing can
    /// ever become ready again.
    Stalled,
    /// The run was aborted.
    Aborted,
}

#[derive(Debug, Default)]
struct BellState {
    generation: u64,
    parked: usize,
    active: usize,
    aborted: bool,
}

/// Generation-counted wakeup shared by all execution units.
///
/// Rung after every activation. A unit snapshots the
/// [`generation`](Self::generation) before looking for ready kernels and
/// [`park`](Self::park)s on that snapshot if it found none, so a ring that
/// lands between the look and the park is never lost.
#[derive(Debug, Default)]
pub struct Doorbell {
    state: Mutex<BellState>,
    cv: Condvar,
}

impl Doorbell {
    /// Declare how many execution units take part in the run.
    pub fn enlist(&self, units: usize) {
        let mut s = self.state.lock();
        s.active = units;
        s.parked = 0;
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Announce a completed activation.
    pub fn ring(&self) {
        let mut s = self.state.lock();
        s.generation += 1;
        // Every parked unit is now waking to look again; `parked` only
        // counts units waiting on the current generation.
        s.parked = 0;
        drop(s);
        self.cv.notify_all();
    }

    /// Remove the calling unit from the run.
    pub fn retire(&self) {
        let mut s = self.state.lock();
        s.active = s.active.saturating_sub(1);
        drop(s);
        self.cv.notify_all();
    }

    /// Wake every unit and make all future parks return [`Wake::Aborted`].
    pub fn abort(&self) {
        self.state.lock().aborted = true;
        self.cv.notify_all();
    }

    /// Whether [`abort`](Self::abort) was called.
    pub fn is_aborted(&self) -> bool {
        self.state.lock().aborted
    }

    /// Block until the generation moves past `seen`, the run aborts, or
    /// every active unit is parked.
    pub fn park(&self, seen: u64) -> Wake {
        let mut s = self.state.lock();
        if s.aborted {
            return Wake::Aborted;
        }
        if s.generation != seen {
            return Wake::Progress;
        }
        s.parked += 1;
        let wake = loop {
            if s.aborted {
                break Wake::Aborted;
            }
            if s.generation != seen {
                break Wake::Progress;
            }
            if s.parked >= s.active {
                break Wake::Stalled;
            }
            self.cv.wait(&mut s);
        };
        // A ring already cleared this unit from the count.
        if s.generation == seen {
            s.parked = s.parked.saturating_sub(1);
        }
        wake
    }
}

// ── Runtime ────────────────────────────────────────────────────────

/// Outcome of [`Runtime::try_activate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    /// The kernel's demand is not satisfied (or it already stopped).
    Idle,
    /// The kernel stepped and wants to run again.
    Continued,
    /// The kernel stepped and returned `Stop`.
    Stopped,
}

struct Slot {
    id: KernelId,
    kernel: Box<dyn Kernel>,
    inputs: Vec<InputPort>,
    outputs: Vec<OutputPort>,
    metrics: KernelMetrics,
}

/// Shared state of one run.
pub struct Runtime {
    slots: Vec<Mutex<Slot>>,
    remaining: AtomicUsize,
    activations: AtomicU64,
    cap: Option<u64>,
    doorbell: Doorbell,
    failure: Mutex<Option<ExecError>>,
}

// Compile-time assertion: units share the runtime by reference across threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Runtime>();
};

impl Runtime {
    pub(crate) fn new(nodes: Vec<Node>, cap: Option<u64>) -> Self {
        let slots: Vec<Mutex<Slot>> = nodes
            .into_iter()
            .map(|n| {
                let name = n.kernel.name().to_string();
                Mutex::new(Slot {
                    id: n.id,
                    kernel: n.kernel,
                    inputs: n.inputs,
                    outputs: n.outputs,
                    metrics: KernelMetrics {
                        name,
                        ..KernelMetrics::default()
                    },
                })
            })
            .collect();
        Self {
            remaining: AtomicUsize::new(slots.len()),
            slots,
            activations: AtomicU64::new(0),
            cap,
            doorbell: Doorbell::default(),
            failure: Mutex::new(None),
        }
    }

    /// Number of kernels.
    pub fn kernel_count(&self) -> usize {
        self.slots.len()
    }

    /// The doorbell shared by all units.
    pub fn doorbell(&self) -> &Doorbell {
        &self.doorbell
    }

    /// Whether every kernel has returned `Stop`.
    pub fn all_stopped(&self) -> bool {
        self.remaining.load(Ordering::Acquire) == 0
    }

    /// Whether the run was aborted by a failure.
    pub fn is_aborted(&self) -> bool {
        self.doorbell.is_aborted()
    }

    /// Whether kernel `k` could be activated right now.
    ///
    /// # Errors
    ///
    /// [`ExecError::KernelFailed`] if its demand names a missing port.
    pub fn is_ready(&self, k: usize) -> Result<bool, ExecError> {
        let slot = self.slots[k].lock();
        if slot.metrics.stopped {
            return Ok(false);
        }
        let demand = slot.kernel.demand();
        demand_satisfied(&demand, &slot.inputs, &slot.outputs).map_err(|reason| {
            ExecError::KernelFailed {
                kernel: slot.metrics.name.clone(),
                reason,
            }
        })
    }

    /// Activate kernel `k` once if its demand is satisfied.
    ///
    /// Does not ring the doorbell; the caller rings once the outcome is
    /// visible to other units.
    ///
    /// # Errors
    ///
    /// [`ExecError::KernelFailed`] if the kernel's demand or step fails,
    /// and [`ExecError::ActivationCapReached`] once the run's activation
    /// cap is exhausted.
    pub fn try_activate(&self, k: usize) -> Result<Activation, ExecError> {
        let mut guard = self.slots[k].lock();
        let Slot {
            id,
            kernel,
            inputs,
            outputs,
            metrics,
        } = &mut *guard;
        if metrics.stopped {
            return Ok(Activation::Idle);
        }
        let fail = |reason| ExecError::KernelFailed {
            kernel: metrics.name.clone(),
            reason,
        };
        let demand = kernel.demand();
        if !demand_satisfied(&demand, inputs, outputs).map_err(fail)? {
            return Ok(Activation::Idle);
        }

        let n = self.activations.fetch_add(1, Ordering::Relaxed);
        if let Some(cap) = self.cap {
            if n >= cap {
                return Err(ExecError::ActivationCapReached { activations: cap });
            }
        }

        let mut ctx = KernelContext::new(*id, inputs, outputs, metrics.activations);
        let start = Instant::now();
        let status = kernel.step(&mut ctx);
        metrics.busy_us += start.elapsed().as_micros() as u64;
        metrics.activations += 1;
        trace!(kernel = %metrics.name, activation = metrics.activations, "activated");

        match status.map_err(fail)? {
            KernelStatus::Continue => Ok(Activation::Continued),
            KernelStatus::Stop => {
                metrics.stopped = true;
                self.remaining.fetch_sub(1, Ordering::AcqRel);
                debug!(
                    kernel = %metrics.name,
                    activations = metrics.activations,
                    "kernel stopped"
                );
                Ok(Activation::Stopped)
            }
        }
    }

    /// Record the run's first failure and abort every unit.
    pub fn fail(&self, err: ExecError) {
        {
            let mut failure = self.failure.lock();
            if failure.is_none() {
                warn!(error = %err, "run aborted");
                *failure = Some(err);
            }
        }
        self.doorbell.abort();
    }

    /// Record a stall, naming every kernel that never stopped.
    ///
    /// A no-op once every kernel has stopped: units parked while the last
    /// kernel finished are not stuck.
    pub fn stall(&self) {
        if self.all_stopped() {
            return;
        }
        let pending: Vec<String> = self
            .slots
            .iter()
            .filter_map(|s| {
                let s = s.lock();
                (!s.metrics.stopped).then(|| s.metrics.name.clone())
            })
            .collect();
        if pending.is_empty() {
            return;
        }
        self.fail(ExecError::Stalled { pending });
    }

    /// The run's result once every unit has returned.
    ///
    /// # Errors
    ///
    /// The recorded failure, or [`ExecError::Stalled`] if units returned
    /// with kernels still pending.
    pub fn outcome(&self, units: usize) -> Result<usize, ExecError> {
        if let Some(err) = self.failure.lock().take() {
            return Err(err);
        }
        if !self.all_stopped() {
            self.stall();
            if let Some(err) = self.failure.lock().take() {
                return Err(err);
            }
        }
        Ok(units)
    }

    pub(crate) fn into_metrics(self) -> Vec<KernelMetrics> {
        self.slots
            .into_iter()
            .map(|s| s.into_inner().metrics)
            .collect()
    }
}

/// Retires a unit from the doorbell when it returns or unwinds.
pub(crate) struct UnitGuard<'a> {
    rt: &'a Runtime,
}

impl<'a> UnitGuard<'a> {
    pub(crate) fn new(rt: &'a Runtime) -> Self {
        Self { rt }
    }
}

impl Drop for UnitGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.rt.doorbell.abort();
        }
        self.rt.doorbell.retire();
    }
}
