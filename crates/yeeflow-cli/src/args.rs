//! Command-line arguments and their mapping onto the library types.

use clap::{Parser, ValueEnum};
use yeeflow::engine::{
    CostBalanced, EngineConfig, FixedCapacity, Growable, KernelPerThread, LockFree,
    SinglePartition, WorkerPool,
};
use yeeflow::kernels::{Iterations, NetworkError, SeedPlan, YeeNetwork};

/// Run a six-component Yee FDTD network and print the final fields.
#[derive(Parser, Debug)]
#[command(name = "yeeflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Grid extent along x
    pub x: usize,

    /// Grid extent along y
    pub y: usize,

    /// Grid extent along z
    pub z: usize,

    /// Leapfrog steps per field kernel (0 runs until interrupted)
    pub t: u64,

    /// Use growable queues instead of fixed-capacity rings
    #[arg(long, conflicts_with = "lock_free")]
    pub dynamic: bool,

    /// Use lock-free bounded queues
    #[arg(long)]
    pub lock_free: bool,

    /// Capacity of fixed and lock-free queues
    #[arg(long, default_value_t = 1)]
    pub capacity: usize,

    /// Drive kernels from a shared worker pool instead of cooperatively
    #[arg(long)]
    pub pool: bool,

    /// Worker threads for --pool, partitions for --partition cost
    /// (default: available parallelism)
    #[arg(long)]
    pub workers: Option<usize>,

    /// How kernels are grouped into execution units
    #[arg(long, value_enum, default_value_t = PartitionArg::Single)]
    pub partition: PartitionArg,

    /// Seed for the random initial fields
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Run the full simulation but do not print the final fields
    #[arg(long)]
    pub silent: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// `--partition` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PartitionArg {
    /// All kernels in one execution unit.
    Single,
    /// One execution unit per kernel.
    PerKernel,
    /// Balance kernels over `--workers` units by cost.
    Cost,
}

impl Cli {
    fn workers(&self) -> usize {
        self.workers.unwrap_or_else(|| WorkerPool::default().workers)
    }

    /// The engine configuration selected by the flags.
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        config = match self.partition {
            PartitionArg::Single => config.with_partition(SinglePartition),
            PartitionArg::PerKernel => config.with_partition(KernelPerThread),
            PartitionArg::Cost => config.with_partition(CostBalanced {
                partitions: self.workers(),
            }),
        };
        if self.pool {
            config = config.with_schedule(WorkerPool {
                workers: self.workers(),
            });
        }
        if self.dynamic {
            config.with_allocation(Growable {
                initial_capacity: self.capacity,
            })
        } else if self.lock_free {
            config.with_allocation(LockFree {
                capacity: self.capacity,
            })
        } else {
            config.with_allocation(FixedCapacity {
                capacity: self.capacity,
            })
        }
    }

    /// The network selected by the positional arguments.
    ///
    /// # Errors
    ///
    /// [`NetworkError::Grid`] for a zero dimension.
    pub fn network(&self) -> Result<YeeNetwork, NetworkError> {
        YeeNetwork::builder()
            .dims(self.x, self.y, self.z)
            .iterations(Iterations::from_count(self.t))
            .seed(SeedPlan::Random { seed: self.seed })
            .forward_final(!self.silent)
            .build()
    }
}
