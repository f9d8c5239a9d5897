//! Producer and consumer endpoints of an edge.
//!
//! Each edge's [`Queue`] is shared between exactly one [`OutputPort`]
//! (owned by the producing kernel's slot) and one [`InputPort`] (owned by
//! the consuming kernel's slot). [`peek`](InputPort::peek) reads through to
//! [`Queue::peek`], so a peeked token keeps occupying its edge.

use std::fmt;
use std::sync::Arc;

use yeeflow_core::{EdgeId, KernelError, Queue, Token};

use crate::kernel::PortSpec;

/// Consumer side of an edge.
pub struct InputPort {
    spec: PortSpec,
    edge: EdgeId,
    queue: Arc<dyn Queue>,
}

impl InputPort {
    /// Bind a port spec to the queue of `edge`.
    pub fn new(spec: PortSpec, edge: EdgeId, queue: Arc<dyn Queue>) -> Self {
        Self { spec, edge, queue }
    }

    /// The port's declaration.
    pub fn spec(&self) -> &PortSpec {
        &self.spec
    }

    /// The edge this port consumes from.
    pub fn edge(&self) -> EdgeId {
        self.edge
    }

    /// Number of tokens available to this consumer.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether a pop would find nothing.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Remove and return the oldest token.
    ///
    /// # Errors
    ///
    /// [`KernelError::PortEmpty`] if nothing is buffered, and
    /// [`KernelError::WrongPayload`] if the producer sent the wrong kind.
    pub fn pop(&mut self) -> Result<Token, KernelError> {
        let token = self.queue.try_pop().ok_or_else(|| KernelError::PortEmpty {
            port: self.spec.name.clone(),
        })?;
        self.check_kind(&token)?;
        Ok(token)
    }

    /// A copy of the oldest token, left in place on the edge.
    pub fn peek(&self) -> Option<Token> {
        self.queue.peek()
    }

    fn check_kind(&self, token: &Token) -> Result<(), KernelError> {
        if token.kind() == self.spec.kind {
            Ok(())
        } else {
            Err(KernelError::WrongPayload {
                port: self.spec.name.clone(),
                expected: self.spec.kind,
                actual: token.kind(),
            })
        }
    }
}

impl fmt::Debug for InputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputPort")
            .field("name", &self.spec.name)
            .field("edge", &self.edge)
            .field("len", &self.len())
            .finish()
    }
}

/// Producer side of an edge.
pub struct OutputPort {
    spec: PortSpec,
    edge: EdgeId,
    queue: Arc<dyn Queue>,
}

impl OutputPort {
    /// Bind a port spec to the queue of `edge`.
    pub fn new(spec: PortSpec, edge: EdgeId, queue: Arc<dyn Queue>) -> Self {
        Self { spec, edge, queue }
    }

    /// The port's declaration.
    pub fn spec(&self) -> &PortSpec {
        &self.spec
    }

    /// The edge this port produces into.
    pub fn edge(&self) -> EdgeId {
        self.edge
    }

    /// Whether a push would be accepted.
    pub fn has_room(&self) -> bool {
        self.queue.has_room()
    }

    /// Append a token to the edge.
    ///
    /// # Errors
    ///
    /// [`KernelError::WrongPayload`] if the token's kind differs from the
    /// port's, and [`KernelError::PortFull`] if the queue refused it.
    pub fn push(&mut self, token: Token) -> Result<(), KernelError> {
        if token.kind() != self.spec.kind {
            return Err(KernelError::WrongPayload {
                port: self.spec.name.clone(),
                expected: self.spec.kind,
                actual: token.kind(),
            });
        }
        self.queue
            .try_push(token)
            .map_err(|_| KernelError::PortFull {
                port: self.spec.name.clone(),
            })
    }
}

impl fmt::Debug for OutputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputPort")
            .field("name", &self.spec.name)
            .field("edge", &self.edge)
            .field("has_room", &self.has_room())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yeeflow_core::{Grid, PayloadKind};
    use yeeflow_test_utils::MockQueue;

    fn pair(cap: Option<usize>, spec: PortSpec) -> (OutputPort, InputPort) {
        let q: Arc<dyn Queue> = Arc::new(MockQueue::new(cap));
        (
            OutputPort::new(spec.clone(), EdgeId(0), Arc::clone(&q)),
            InputPort::new(spec, EdgeId(0), q),
        )
    }

    #[test]
    fn fifo_through_endpoints() {
        let (mut tx, mut rx) = pair(None, PortSpec::scalar("s"));
        for v in [1.0, 2.0, 3.0] {
            tx.push(Token::Scalar(v)).unwrap();
        }
        assert_eq!(rx.len(), 3);
        assert_eq!(rx.pop().unwrap(), Token::Scalar(1.0));
        assert_eq!(rx.pop().unwrap(), Token::Scalar(2.0));
        assert_eq!(rx.pop().unwrap(), Token::Scalar(3.0));
        assert!(matches!(rx.pop(), Err(KernelError::PortEmpty { .. })));
    }

    #[test]
    fn peek_does_not_consume() {
        let (mut tx, mut rx) = pair(Some(1), PortSpec::scalar("s"));
        tx.push(Token::Scalar(5.0)).unwrap();
        assert_eq!(rx.peek(), Some(Token::Scalar(5.0)));
        assert_eq!(rx.peek(), Some(Token::Scalar(5.0)));
        assert_eq!(rx.len(), 1);
        assert!(!rx.is_empty());
        assert_eq!(rx.pop().unwrap(), Token::Scalar(5.0));
        assert!(rx.is_empty());
        assert_eq!(rx.peek(), None);
    }

    #[test]
    fn peek_preserves_fifo_order() {
        let (mut tx, mut rx) = pair(None, PortSpec::scalar("s"));
        tx.push(Token::Scalar(1.0)).unwrap();
        let _ = rx.peek();
        tx.push(Token::Scalar(2.0)).unwrap();
        assert_eq!(rx.pop().unwrap(), Token::Scalar(1.0));
        assert_eq!(rx.pop().unwrap(), Token::Scalar(2.0));
    }

    #[test]
    fn peek_leaves_a_full_edge_full() {
        let q: Arc<dyn Queue> = Arc::new(MockQueue::new(Some(1)));
        let spec = PortSpec::scalar("s");
        let mut tx = OutputPort::new(spec.clone(), EdgeId(0), Arc::clone(&q));
        let rx = InputPort::new(spec, EdgeId(0), Arc::clone(&q));
        tx.push(Token::Scalar(1.0)).unwrap();
        assert_eq!(rx.peek(), Some(Token::Scalar(1.0)));
        assert!(!tx.has_room());
        assert!(matches!(
            tx.push(Token::Scalar(2.0)),
            Err(KernelError::PortFull { .. })
        ));
        assert_eq!(q.len(), 1);
        assert_eq!(q.stats().popped, 0);
    }

    #[test]
    fn push_on_full_is_refused() {
        let (mut tx, _rx) = pair(Some(1), PortSpec::scalar("s"));
        tx.push(Token::Scalar(1.0)).unwrap();
        assert!(!tx.has_room());
        assert!(matches!(
            tx.push(Token::Scalar(2.0)),
            Err(KernelError::PortFull { .. })
        ));
    }

    #[test]
    fn wrong_payload_is_refused() {
        let (mut tx, _rx) = pair(None, PortSpec::scalar("s"));
        let err = tx
            .push(Token::Grid(Grid::zeros(1, 1, 1).unwrap()))
            .unwrap_err();
        assert_eq!(
            err,
            KernelError::WrongPayload {
                port: "s".into(),
                expected: PayloadKind::Scalar,
                actual: PayloadKind::Grid,
            }
        );
    }

    #[test]
    fn pushed_grid_does_not_alias_producer_copy() {
        let (mut tx, mut rx) = pair(Some(1), PortSpec::grid("g"));
        let mut mine = Grid::zeros(2, 2, 2).unwrap();
        tx.push(Token::Grid(mine.clone())).unwrap();
        *mine.at_mut(0, 0, 0) = 9.0;
        let theirs = rx.pop().unwrap().into_grid().unwrap();
        assert_eq!(theirs.at(0, 0, 0), 0.0);
        assert_eq!(mine.at(0, 0, 0), 9.0);
    }
}
