//! Partition strategies: grouping kernels into execution units.
//!
//! A [`Partitioning`] assigns every kernel to exactly one group. Under the
//! cooperative schedule each group is driven by its own execution unit;
//! the worker pool ignores groups.

use yeeflow_core::KernelId;

/// What a partition strategy knows about one kernel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelInfo {
    /// Kernel id.
    pub id: KernelId,
    /// Kernel name.
    pub name: String,
    /// Relative activation cost from [`Kernel::cost`](yeeflow_kernel::Kernel::cost).
    pub cost: u64,
}

/// Kernels grouped into execution units.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partitioning {
    groups: Vec<Vec<KernelId>>,
}

impl Partitioning {
    /// Build a partitioning from explicit groups. Empty groups are dropped.
    pub fn new(groups: Vec<Vec<KernelId>>) -> Self {
        Self {
            groups: groups.into_iter().filter(|g| !g.is_empty()).collect(),
        }
    }

    /// The non-empty groups.
    pub fn groups(&self) -> &[Vec<KernelId>] {
        &self.groups
    }

    /// Number of non-empty groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Check that every kernel `0..kernel_count` appears exactly once.
    ///
    /// # Errors
    ///
    /// A description of the first missing, duplicated or unknown kernel.
    pub fn check_covers(&self, kernel_count: usize) -> Result<(), String> {
        let mut seen = vec![false; kernel_count];
        for id in self.groups.iter().flatten() {
            match seen.get_mut(id.index()) {
                None => return Err(format!("unknown kernel {id}")),
                Some(true) => return Err(format!("kernel {id} assigned twice")),
                Some(s) => *s = true,
            }
        }
        match seen.iter().position(|s| !s) {
            Some(i) => Err(format!("kernel {i} not assigned")),
            None => Ok(()),
        }
    }
}

/// Groups kernels into execution units.
pub trait PartitionStrategy: Send + Sync {
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

    /// Assign every kernel to a group.
    fn partition(&self, kernels: &[KernelInfo]) -> Partitioning;
}

/// Every kernel in one group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinglePartition;

impl PartitionStrategy for SinglePartition {
    fn name(&self) -> &'static str {
        "single"
    }

    fn partition(&self, kernels: &[KernelInfo]) -> Partitioning {
        Partitioning::new(vec![kernels.iter().map(|k| k.id).collect()])
    }
}

/// One group per kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KernelPerThread;

impl PartitionStrategy for KernelPerThread {
    fn name(&self) -> &'static str {
        "per-kernel"
    }

    fn partition(&self, kernels: &[KernelInfo]) -> Partitioning {
        Partitioning::new(kernels.iter().map(|k| vec![k.id]).collect())
    }
}

/// `partitions` groups balanced by kernel cost.
///
/// Greedy longest-processing-time: kernels sorted by descending cost (ties
/// by id), each assigned to the currently lightest group (ties by group
/// index). Deterministic for a given input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CostBalanced {
    /// Number of groups. Must be at least 1.
    pub partitions: usize,
}

impl PartitionStrategy for CostBalanced {
    fn name(&self) -> &'static str {
        "cost"
    }

    fn validate(&self) -> Result<(), String> {
        if self.partitions == 0 {
            return Err("cost-balanced partitioning needs at least 1 partition".into());
        }
        Ok(())
    }

    fn partition(&self, kernels: &[KernelInfo]) -> Partitioning {
        let bins = self.partitions.max(1);
        let mut order: Vec<&KernelInfo> = kernels.iter().collect();
        order.sort_by(|a, b| b.cost.cmp(&a.cost).then(a.id.cmp(&b.id)));

        let mut groups: Vec<Vec<KernelId>> = vec![Vec::new(); bins];
        let mut load = vec![0u64; bins];
        for k in order {
            let lightest = (0..bins).min_by_key(|&i| (load[i], i)).unwrap_or(0);
            load[lightest] = load[lightest].saturating_add(k.cost);
            groups[lightest].push(k.id);
        }
        Partitioning::new(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn infos(costs: &[u64]) -> Vec<KernelInfo> {
        costs
            .iter()
            .enumerate()
            .map(|(i, &cost)| KernelInfo {
                id: KernelId(i as u32),
                name: format!("k{i}"),
                cost,
            })
            .collect()
    }

    #[test]
    fn single_groups_everything() {
        let p = SinglePartition.partition(&infos(&[1, 1, 1]));
        assert_eq!(p.len(), 1);
        assert_eq!(p.groups()[0], vec![KernelId(0), KernelId(1), KernelId(2)]);
    }

    #[test]
    fn per_kernel_isolates() {
        let p = KernelPerThread.partition(&infos(&[5, 1]));
        assert_eq!(p.groups(), &[vec![KernelId(0)], vec![KernelId(1)]]);
    }

    #[test]
    fn cost_balanced_lpt() {
        // Costs 8,7,6,5,4 into two bins: 8+5+4=17 vs 7+6=13.
        let p = CostBalanced { partitions: 2 }.partition(&infos(&[8, 7, 6, 5, 4]));
        assert_eq!(
            p.groups(),
            &[
                vec![KernelId(0), KernelId(3), KernelId(4)],
                vec![KernelId(1), KernelId(2)]
            ]
        );
    }

    #[test]
    fn cost_balanced_drops_empty_bins() {
        let p = CostBalanced { partitions: 4 }.partition(&infos(&[1, 1]));
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn coverage_check() {
        assert!(Partitioning::new(vec![vec![KernelId(0)], vec![KernelId(1)]])
            .check_covers(2)
            .is_ok());
        assert!(Partitioning::new(vec![vec![KernelId(0)]])
            .check_covers(2)
            .is_err());
        assert!(Partitioning::new(vec![vec![KernelId(0), KernelId(0)]])
            .check_covers(1)
            .is_err());
        assert!(Partitioning::new(vec![vec![KernelId(7)]])
            .check_covers(1)
            .is_err());
    }

    proptest! {
        #[test]
        fn every_strategy_covers_all_kernels(
            costs in proptest::collection::vec(0u64..100, 1..30),
            bins in 1usize..8,
        ) {
            let kernels = infos(&costs);
            let strategies: Vec<Box<dyn PartitionStrategy>> = vec![
                Box::new(SinglePartition),
                Box::new(KernelPerThread),
                Box::new(CostBalanced { partitions: bins }),
            ];
            for s in strategies {
                let p = s.partition(&kernels);
                prop_assert!(p.check_covers(kernels.len()).is_ok(), "{}", s.name());
            }
        }
    }
}
