//! Graph construction: kernels, named connections, queue allocation.
//!
//! [`TopologyBuilder`] collects kernels and connections by port name;
//! [`build`](TopologyBuilder::build) validates the whole graph, allocates
//! one queue per edge and binds every port endpoint to its queue. The
//! resulting [`Graph`] is ready for an [`Executor`](crate::Executor).

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use yeeflow_core::{EdgeId, KernelId, Queue};
use yeeflow_kernel::{
    validate_topology, Connection, Direction, InputPort, Kernel, KernelDecl, OutputPort,
    PortSpec, TopologyError,
};

use crate::allocation::{AllocationStrategy, EdgeInfo};
use crate::partition::KernelInfo;

/// Collects kernels and connections before validation.
#[derive(Default)]
pub struct TopologyBuilder {
    kernels: Vec<Entry>,
    connections: Vec<Connection>,
}

struct Entry {
    kernel: Box<dyn Kernel>,
    inputs: Vec<PortSpec>,
    outputs: Vec<PortSpec>,
}

impl TopologyBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kernel. Ids are assigned sequentially.
    pub fn add_kernel<K: Kernel>(&mut self, kernel: K) -> KernelId {
        self.add_boxed(Box::new(kernel))
    }

    /// Register an already boxed kernel.
    pub fn add_boxed(&mut self, kernel: Box<dyn Kernel>) -> KernelId {
        let id = KernelId(self.kernels.len() as u32);
        let inputs = kernel.inputs();
        let outputs = kernel.outputs();
        self.kernels.push(Entry {
            kernel,
            inputs,
            outputs,
        });
        id
    }

    /// Number of registered kernels.
    pub fn kernel_count(&self) -> usize {
        self.kernels.len()
    }

    /// Number of recorded connections.
    pub fn edge_count(&self) -> usize {
        self.connections.len()
    }

    /// Connect output `output` of `from` to input `input` of `to`.
    ///
    /// Names are resolved immediately; structural checks that need the
    /// whole graph run in [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// [`TopologyError::UnknownKernel`] or [`TopologyError::UnknownPort`].
    pub fn connect(
        &mut self,
        from: KernelId,
        output: &str,
        to: KernelId,
        input: &str,
    ) -> Result<EdgeId, TopologyError> {
        let output = self.port_index(from, output, Direction::Output)?;
        let input = self.port_index(to, input, Direction::Input)?;
        let id = EdgeId(self.connections.len() as u32);
        self.connections.push(Connection {
            from,
            output,
            to,
            input,
        });
        Ok(id)
    }

    fn port_index(
        &self,
        kernel: KernelId,
        name: &str,
        direction: Direction,
    ) -> Result<usize, TopologyError> {
        let entry = self
            .kernels
            .get(kernel.index())
            .ok_or(TopologyError::UnknownKernel { kernel })?;
        let ports = match direction {
            Direction::Input => &entry.inputs,
            Direction::Output => &entry.outputs,
        };
        ports
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| TopologyError::UnknownPort {
                kernel: entry.kernel.name().to_string(),
                port: name.to_string(),
                direction,
            })
    }

    /// Validate the graph, allocate queues and bind port endpoints.
    ///
    /// # Errors
    ///
    /// Any [`TopologyError`] found by
    /// [`validate_topology`](yeeflow_kernel::validate_topology).
    pub fn build(self, allocation: &dyn AllocationStrategy) -> Result<Graph, TopologyError> {
        let decls: Vec<KernelDecl> = self
            .kernels
            .iter()
            .map(|e| KernelDecl {
                name: e.kernel.name().to_string(),
                inputs: e.inputs.clone(),
                outputs: e.outputs.clone(),
                first_demand: e.kernel.demand(),
            })
            .collect();
        let plan = validate_topology(&decls, &self.connections)?;

        let edges: Vec<Edge> = self
            .connections
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let producer = &decls[c.from.index()];
                let consumer = &decls[c.to.index()];
                let out_spec = &producer.outputs[c.output];
                let info = EdgeInfo {
                    id: EdgeId(i as u32),
                    producer: format!("{}.{}", producer.name, out_spec.name),
                    consumer: format!("{}.{}", consumer.name, consumer.inputs[c.input].name),
                    kind: out_spec.kind,
                };
                let queue = allocation.allocate(&info);
                Edge { info, queue }
            })
            .collect();

        let nodes: Vec<Node> = self
            .kernels
            .into_iter()
            .enumerate()
            .map(|(k, entry)| {
                let id = KernelId(k as u32);
                let inputs = entry
                    .inputs
                    .into_iter()
                    .zip(plan.inputs_of(id))
                    .map(|(spec, &e)| InputPort::new(spec, e, Arc::clone(&edges[e.index()].queue)))
                    .collect();
                let outputs = entry
                    .outputs
                    .into_iter()
                    .zip(plan.outputs_of(id))
                    .map(|(spec, &e)| OutputPort::new(spec, e, Arc::clone(&edges[e.index()].queue)))
                    .collect();
                Node {
                    id,
                    kernel: entry.kernel,
                    inputs,
                    outputs,
                }
            })
            .collect();

        debug!(
            kernels = nodes.len(),
            edges = edges.len(),
            allocation = allocation.name(),
            "topology built"
        );
        Ok(Graph { nodes, edges })
    }
}

impl fmt::Debug for TopologyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopologyBuilder")
            .field(
                "kernels",
                &self.kernels.iter().map(|e| e.kernel.name()).collect::<Vec<_>>(),
            )
            .field("connections", &self.connections)
            .finish()
    }
}

// ── Graph ──────────────────────────────────────────────────────────

/// A kernel with its bound port endpoints.
pub(crate) struct Node {
    pub(crate) id: KernelId,
    pub(crate) kernel: Box<dyn Kernel>,
    pub(crate) inputs: Vec<InputPort>,
    pub(crate) outputs: Vec<OutputPort>,
}

/// One edge and the queue behind it.
pub struct Edge {
    /// Producer, consumer and payload kind.
    pub info: EdgeInfo,
    /// The allocated buffer.
    pub queue: Arc<dyn Queue>,
}

/// A validated, fully wired kernel graph.
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
}

impl Graph {
    /// Number of kernels.
    pub fn kernel_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Partitioning inputs for every kernel, in id order.
    pub fn kernel_infos(&self) -> Vec<KernelInfo> {
        self.nodes
            .iter()
            .map(|n| KernelInfo {
                id: n.id,
                name: n.kernel.name().to_string(),
                cost: n.kernel.cost(),
            })
            .collect()
    }

    /// All edges, in id order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("kernels", &self.nodes.len())
            .field("edges", &self.edges.len())
            .finish()
    }
}
