//! Topology validation and port wiring.
//!
//! [`validate_topology`] runs once, before any kernel is activated, to check
//! the kernel graph for structural errors and build the [`WiringPlan`]: the
//! edge behind every input and output port. Every failure here is fatal.
//! A graph that fails validation is never run.
//!
//! Cyclic graphs are allowed. What is not allowed is a graph in which some
//! kernel can never perform its first activation: validation proves start
//! up by a fixpoint over first-activation demands, starting from kernels
//! whose first activation pops nothing.

use std::error::Error;
use std::fmt;

use indexmap::IndexMap;
use yeeflow_core::{EdgeId, KernelId, PayloadKind};

use crate::kernel::{Demand, PortSpec};

// ── Inputs ─────────────────────────────────────────────────────────

/// What validation needs to know about one kernel.
#[derive(Clone, Debug)]
pub struct KernelDecl {
    /// Kernel name, for error messages.
    pub name: String,
    /// Declared input ports.
    pub inputs: Vec<PortSpec>,
    /// Declared output ports.
    pub outputs: Vec<PortSpec>,
    /// Demand of the kernel's first activation.
    pub first_demand: Demand,
}

/// A connection from an output port to an input port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connection {
    /// Producing kernel.
    pub from: KernelId,
    /// Output port index on the producer.
    pub output: usize,
    /// Consuming kernel.
    pub to: KernelId,
    /// Input port index on the consumer.
    pub input: usize,
}

/// Which side of a kernel a port is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// An input port.
    Input,
    /// An output port.
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

// ── Plan ───────────────────────────────────────────────────────────

/// The edge behind every port, indexed by kernel and port index.
///
/// Edge ids are the positions of the connections in the validated list.
#[derive(Debug)]
#[must_use]
pub struct WiringPlan {
    inputs: Vec<Vec<EdgeId>>,
    outputs: Vec<Vec<EdgeId>>,
}

impl WiringPlan {
    /// Number of kernels covered by the plan.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Whether the plan covers zero kernels.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Edge feeding input `port` of `kernel`.
    pub fn input_edge(&self, kernel: KernelId, port: usize) -> Option<EdgeId> {
        self.inputs.get(kernel.index())?.get(port).copied()
    }

    /// Edge fed by output `port` of `kernel`.
    pub fn output_edge(&self, kernel: KernelId, port: usize) -> Option<EdgeId> {
        self.outputs.get(kernel.index())?.get(port).copied()
    }

    /// Edges feeding each input of `kernel`, in port order.
    pub fn inputs_of(&self, kernel: KernelId) -> &[EdgeId] {
        self.inputs
            .get(kernel.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Edges fed by each output of `kernel`, in port order.
    pub fn outputs_of(&self, kernel: KernelId) -> &[EdgeId] {
        self.outputs
            .get(kernel.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// ── Errors ─────────────────────────────────────────────────────────

/// Errors from topology construction and validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TopologyError {
    /// No kernels registered.
    EmptyGraph,

    /// A connection references a kernel id that does not exist.
    UnknownKernel {
        /// The missing id.
        kernel: KernelId,
    },

    /// A connection references a port the kernel does not declare.
    UnknownPort {
        /// Kernel name.
        kernel: String,
        /// Port name (or `#index` when resolved by index).
        port: String,
        /// Side of the kernel.
        direction: Direction,
    },

    /// A port is connected more than once.
    DuplicateConnection {
        /// Kernel name.
        kernel: String,
        /// Port name.
        port: String,
        /// Side of the kernel.
        direction: Direction,
    },

    /// A declared port has no connection.
    UnconnectedPort {
        /// Kernel name.
        kernel: String,
        /// Port name.
        port: String,
        /// Side of the kernel.
        direction: Direction,
    },

    /// Producer and consumer disagree on the payload kind.
    PortTypeMismatch {
        /// `kernel.port` of the producer.
        from: String,
        /// Kind declared by the producer.
        from_kind: PayloadKind,
        /// `kernel.port` of the consumer.
        to: String,
        /// Kind declared by the consumer.
        to_kind: PayloadKind,
    },

    /// A kernel's first demand names a port it does not have.
    InvalidDemand {
        /// Kernel name.
        kernel: String,
        /// The out-of-range index.
        index: usize,
        /// Side of the kernel.
        direction: Direction,
    },

    /// These kernels can never perform their first activation: the graph
    /// has a cycle with no seed path into it.
    NoSeedPath {
        /// Names of the kernels that can never start.
        kernels: Vec<String>,
    },
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGraph => write!(f, "topology has no kernels"),
            Self::UnknownKernel { kernel } => write!(f, "no kernel with id {kernel}"),
            Self::UnknownPort {
                kernel,
                port,
                direction,
            } => write!(f, "kernel '{kernel}' has no {direction} port '{port}'"),
            Self::DuplicateConnection {
                kernel,
                port,
                direction,
            } => write!(f, "{direction} port '{kernel}.{port}' is connected twice"),
            Self::UnconnectedPort {
                kernel,
                port,
                direction,
            } => write!(f, "{direction} port '{kernel}.{port}' is not connected"),
            Self::PortTypeMismatch {
                from,
                from_kind,
                to,
                to_kind,
            } => write!(
                f,
                "'{from}' produces {from_kind} tokens but '{to}' consumes {to_kind} tokens"
            ),
            Self::InvalidDemand {
                kernel,
                index,
                direction,
            } => write!(
                f,
                "kernel '{kernel}' demands {direction} port #{index}, which does not exist"
            ),
            Self::NoSeedPath { kernels } => {
                write!(f, "kernels can never start (no seed path): ")?;
                for (i, k) in kernels.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{k}'")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for TopologyError {}

// ── Validation ─────────────────────────────────────────────────────

/// Validate a kernel graph and build its [`WiringPlan`].
///
/// Checks performed:
///
/// 1. The graph is non-empty.
/// 2. Every connection names existing kernels and ports.
/// 3. No port is connected twice.
/// 4. Producer and consumer agree on payload kind.
/// 5. Every declared port is connected.
/// 6. First demands only name existing ports.
/// 7. Every kernel can perform its first activation.
pub fn validate_topology(
    kernels: &[KernelDecl],
    connections: &[Connection],
) -> Result<WiringPlan, TopologyError> {
    // 1. Non-empty
    if kernels.is_empty() {
        return Err(TopologyError::EmptyGraph);
    }

    let mut inputs: Vec<Vec<Option<EdgeId>>> =
        kernels.iter().map(|k| vec![None; k.inputs.len()]).collect();
    let mut outputs: Vec<Vec<Option<EdgeId>>> =
        kernels.iter().map(|k| vec![None; k.outputs.len()]).collect();

    for (i, c) in connections.iter().enumerate() {
        let edge = EdgeId(i as u32);
        // 2. Existence
        let producer = kernels
            .get(c.from.index())
            .ok_or(TopologyError::UnknownKernel { kernel: c.from })?;
        let consumer = kernels
            .get(c.to.index())
            .ok_or(TopologyError::UnknownKernel { kernel: c.to })?;
        let out_spec = producer
            .outputs
            .get(c.output)
            .ok_or_else(|| TopologyError::UnknownPort {
                kernel: producer.name.clone(),
                port: format!("#{}", c.output),
                direction: Direction::Output,
            })?;
        let in_spec = consumer
            .inputs
            .get(c.input)
            .ok_or_else(|| TopologyError::UnknownPort {
                kernel: consumer.name.clone(),
                port: format!("#{}", c.input),
                direction: Direction::Input,
            })?;

        // 3. Single connection per port
        let out_slot = &mut outputs[c.from.index()][c.output];
        if out_slot.is_some() {
            return Err(TopologyError::DuplicateConnection {
                kernel: producer.name.clone(),
                port: out_spec.name.clone(),
                direction: Direction::Output,
            });
        }
        *out_slot = Some(edge);
        let in_slot = &mut inputs[c.to.index()][c.input];
        if in_slot.is_some() {
            return Err(TopologyError::DuplicateConnection {
                kernel: consumer.name.clone(),
                port: in_spec.name.clone(),
                direction: Direction::Input,
            });
        }
        *in_slot = Some(edge);

        // 4. Payload agreement
        if out_spec.kind != in_spec.kind {
            return Err(TopologyError::PortTypeMismatch {
                from: format!("{}.{}", producer.name, out_spec.name),
                from_kind: out_spec.kind,
                to: format!("{}.{}", consumer.name, in_spec.name),
                to_kind: in_spec.kind,
            });
        }
    }

    // 5. Every port connected
    let inputs = resolve_ports(kernels, inputs, Direction::Input)?;
    let outputs = resolve_ports(kernels, outputs, Direction::Output)?;

    // 6. First demands in range
    for k in kernels {
        if let Some(&index) = k
            .first_demand
            .pop_ports()
            .iter()
            .find(|&&i| i >= k.inputs.len())
        {
            return Err(TopologyError::InvalidDemand {
                kernel: k.name.clone(),
                index,
                direction: Direction::Input,
            });
        }
        if let Some(&index) = k
            .first_demand
            .push_ports()
            .iter()
            .find(|&&o| o >= k.outputs.len())
        {
            return Err(TopologyError::InvalidDemand {
                kernel: k.name.clone(),
                index,
                direction: Direction::Output,
            });
        }
    }

    // 7. Seed path
    check_startable(kernels, connections, &inputs)?;

    Ok(WiringPlan { inputs, outputs })
}

fn resolve_ports(
    kernels: &[KernelDecl],
    slots: Vec<Vec<Option<EdgeId>>>,
    direction: Direction,
) -> Result<Vec<Vec<EdgeId>>, TopologyError> {
    kernels
        .iter()
        .zip(slots)
        .map(|(k, ports)| {
            ports
                .into_iter()
                .enumerate()
                .map(|(p, edge)| {
                    edge.ok_or_else(|| {
                        let specs = match direction {
                            Direction::Input => &k.inputs,
                            Direction::Output => &k.outputs,
                        };
                        TopologyError::UnconnectedPort {
                            kernel: k.name.clone(),
                            port: specs[p].name.clone(),
                            direction,
                        }
                    })
                })
                .collect()
        })
        .collect()
}

/// Fixpoint: a kernel can start once every input its first activation pops
/// is fed by a kernel that can start.
fn check_startable(
    kernels: &[KernelDecl],
    connections: &[Connection],
    inputs: &[Vec<EdgeId>],
) -> Result<(), TopologyError> {
    let mut startable = vec![false; kernels.len()];
    loop {
        let mut changed = false;
        for (k, decl) in kernels.iter().enumerate() {
            if startable[k] {
                continue;
            }
            let ready = decl.first_demand.pop_ports().iter().all(|&p| {
                let producer = connections[inputs[k][p].index()].from;
                startable[producer.index()]
            });
            if ready {
                startable[k] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // Deduplicate by name, keeping graph order, for a readable message.
    let stuck: IndexMap<&str, ()> = kernels
        .iter()
        .zip(&startable)
        .filter(|(_, &ok)| !ok)
        .map(|(k, _)| (k.name.as_str(), ()))
        .collect();
    if stuck.is_empty() {
        Ok(())
    } else {
        Err(TopologyError::NoSeedPath {
            kernels: stuck.keys().map(|s| s.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str) -> KernelDecl {
        KernelDecl {
            name: name.into(),
            inputs: vec![],
            outputs: vec![PortSpec::grid("out")],
            first_demand: Demand::none().pushes([0]),
        }
    }

    fn relay(name: &str) -> KernelDecl {
        KernelDecl {
            name: name.into(),
            inputs: vec![PortSpec::grid("in")],
            outputs: vec![PortSpec::grid("out")],
            first_demand: Demand::none().pops([0]).pushes([0]),
        }
    }

    fn sink(name: &str) -> KernelDecl {
        KernelDecl {
            name: name.into(),
            inputs: vec![PortSpec::grid("in")],
            outputs: vec![],
            first_demand: Demand::none().pops([0]),
        }
    }

    fn conn(from: u32, output: usize, to: u32, input: usize) -> Connection {
        Connection {
            from: KernelId(from),
            output,
            to: KernelId(to),
            input,
        }
    }

    #[test]
    fn valid_chain() {
        let kernels = vec![source("src"), relay("mid"), sink("dst")];
        let plan = validate_topology(&kernels, &[conn(0, 0, 1, 0), conn(1, 0, 2, 0)]).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.output_edge(KernelId(0), 0), Some(EdgeId(0)));
        assert_eq!(plan.input_edge(KernelId(1), 0), Some(EdgeId(0)));
        assert_eq!(plan.outputs_of(KernelId(1)), &[EdgeId(1)]);
        assert_eq!(plan.inputs_of(KernelId(2)), &[EdgeId(1)]);
        assert!(plan.inputs_of(KernelId(9)).is_empty());
    }

    #[test]
    fn empty_graph_rejected() {
        assert_eq!(
            validate_topology(&[], &[]).unwrap_err(),
            TopologyError::EmptyGraph
        );
    }

    #[test]
    fn unknown_kernel_rejected() {
        let kernels = vec![source("src")];
        assert_eq!(
            validate_topology(&kernels, &[conn(0, 0, 5, 0)]).unwrap_err(),
            TopologyError::UnknownKernel {
                kernel: KernelId(5)
            }
        );
    }

    #[test]
    fn unknown_port_rejected() {
        let kernels = vec![source("src"), sink("dst")];
        let err = validate_topology(&kernels, &[conn(0, 1, 1, 0)]).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::UnknownPort {
                direction: Direction::Output,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_input_rejected() {
        let kernels = vec![source("a"), source("b"), sink("dst")];
        let err = validate_topology(&kernels, &[conn(0, 0, 2, 0), conn(1, 0, 2, 0)]).unwrap_err();
        assert_eq!(
            err,
            TopologyError::DuplicateConnection {
                kernel: "dst".into(),
                port: "in".into(),
                direction: Direction::Input,
            }
        );
    }

    #[test]
    fn payload_mismatch_rejected() {
        let mut scalar_sink = sink("dst");
        scalar_sink.inputs = vec![PortSpec::scalar("in")];
        let kernels = vec![source("src"), scalar_sink];
        let err = validate_topology(&kernels, &[conn(0, 0, 1, 0)]).unwrap_err();
        assert_eq!(
            err,
            TopologyError::PortTypeMismatch {
                from: "src.out".into(),
                from_kind: PayloadKind::Grid,
                to: "dst.in".into(),
                to_kind: PayloadKind::Scalar,
            }
        );
    }

    #[test]
    fn unconnected_port_rejected() {
        let kernels = vec![source("src"), relay("mid")];
        let err = validate_topology(&kernels, &[conn(0, 0, 1, 0)]).unwrap_err();
        assert_eq!(
            err,
            TopologyError::UnconnectedPort {
                kernel: "mid".into(),
                port: "out".into(),
                direction: Direction::Output,
            }
        );
    }

    #[test]
    fn demand_out_of_range_rejected() {
        let mut bad = source("src");
        bad.first_demand = Demand::none().pushes([3]);
        let kernels = vec![bad, sink("dst")];
        let err = validate_topology(&kernels, &[conn(0, 0, 1, 0)]).unwrap_err();
        assert!(matches!(err, TopologyError::InvalidDemand { index: 3, .. }));
    }

    #[test]
    fn unseeded_cycle_rejected() {
        // a → b → a with both popping first: nobody can start.
        let kernels = vec![relay("a"), relay("b")];
        let err = validate_topology(&kernels, &[conn(0, 0, 1, 0), conn(1, 0, 0, 0)]).unwrap_err();
        assert_eq!(
            err,
            TopologyError::NoSeedPath {
                kernels: vec!["a".into(), "b".into()]
            }
        );
    }

    #[test]
    fn cycle_with_push_first_member_is_startable() {
        // a pushes before it pops, so the a ⇄ b cycle can start.
        let mut a = relay("a");
        a.first_demand = Demand::none().pushes([0]);
        let kernels = vec![a, relay("b")];
        assert!(validate_topology(&kernels, &[conn(0, 0, 1, 0), conn(1, 0, 0, 0)]).is_ok());
    }

    #[test]
    fn seeded_cycle_is_startable() {
        // seed → a (port 0); a ⇄ b on a's port 1 / b's port 0.
        let a = KernelDecl {
            name: "a".into(),
            inputs: vec![PortSpec::grid("seed"), PortSpec::grid("loop")],
            outputs: vec![PortSpec::grid("out")],
            first_demand: Demand::none().pops([0]),
        };
        let kernels = vec![source("seed"), a, relay("b")];
        let connections = [conn(0, 0, 1, 0), conn(1, 0, 2, 0), conn(2, 0, 1, 1)];
        assert!(validate_topology(&kernels, &connections).is_ok());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        /// `src -> r0 -> … -> r{n-1} -> dst`.
        fn chain(n: usize) -> (Vec<KernelDecl>, Vec<Connection>) {
            let mut kernels = vec![source("src")];
            kernels.extend((0..n).map(|i| relay(&format!("r{i}"))));
            kernels.push(sink("dst"));
            let connections = (0..=n as u32).map(|i| conn(i, 0, i + 1, 0)).collect();
            (kernels, connections)
        }

        proptest! {
            #[test]
            fn chains_validate(n in 0usize..12) {
                let (kernels, connections) = chain(n);
                let plan = validate_topology(&kernels, &connections).unwrap();
                prop_assert_eq!(plan.len(), n + 2);
            }

            #[test]
            fn dropping_any_link_leaves_a_port_unconnected(
                n in 0usize..12,
                victim in any::<prop::sample::Index>(),
            ) {
                let (kernels, mut connections) = chain(n);
                connections.remove(victim.index(connections.len()));
                let err = validate_topology(&kernels, &connections).unwrap_err();
                let is_unconnected = matches!(err, TopologyError::UnconnectedPort { .. });
                prop_assert!(is_unconnected);
            }

            #[test]
            fn relay_ring_never_starts(n in 1usize..12) {
                let kernels: Vec<KernelDecl> = (0..n).map(|i| relay(&format!("r{i}"))).collect();
                let connections: Vec<Connection> = (0..n as u32)
                    .map(|i| conn(i, 0, (i + 1) % n as u32, 0))
                    .collect();
                let err = validate_topology(&kernels, &connections).unwrap_err();
                let stuck = match err {
                    TopologyError::NoSeedPath { kernels } => kernels,
                    other => return Err(TestCaseError::fail(format!("unexpected {other:?}"))),
                };
                prop_assert_eq!(stuck.len(), n);
            }
        }
    }
}
