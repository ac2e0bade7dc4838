//! Asynchronous operation handles.
//!
//! Every submission into a [`DeviceQueue`](crate::device::DeviceQueue)
//! returns an [`OpHandle`] immediately. The handle supports two things:
//! being passed as a dependency of a later submission, and an unbounded
//! blocking join via [`OpHandle::wait`]. The backend keeps the paired
//! [`Completion`] token and signals it exactly once when the operation
//! finishes or fails.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::error::{OverlapError, Result};

static NEXT_OP_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a submitted device operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(u64);

impl OpId {
    fn next() -> Self {
        Self(NEXT_OP_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for logging.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// The kind of device operation behind a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Asynchronous host-to-device copy.
    Transfer,
    /// Asynchronous data-parallel kernel execution.
    Compute,
}

#[derive(Debug, Clone)]
enum OpState {
    Pending,
    Complete,
    Failed { reason: String, dep: Option<OpId> },
}

/// Completion handle for one asynchronous device operation.
///
/// Cloning is cheap; all clones observe the same completion state. Waiting
/// on a handle joins only that operation, never its dependents, which is
/// what allows the caller to overlap host work with a still-running compute.
#[derive(Debug, Clone)]
pub struct OpHandle {
    id: OpId,
    kind: OpKind,
    state: watch::Receiver<OpState>,
}

/// Single-use token held by the backend to resolve an [`OpHandle`].
#[derive(Debug)]
pub struct Completion {
    tx: watch::Sender<OpState>,
}

impl OpHandle {
    /// Create a handle/completion pair for a new operation.
    pub fn channel(kind: OpKind) -> (OpHandle, Completion) {
        let (tx, rx) = watch::channel(OpState::Pending);
        let handle = OpHandle {
            id: OpId::next(),
            kind,
            state: rx,
        };
        (handle, Completion { tx })
    }

    /// Identifier of this operation.
    #[must_use]
    pub fn id(&self) -> OpId {
        self.id
    }

    /// Kind of this operation.
    #[must_use]
    pub fn kind(&self) -> OpKind {
        self.kind
    }

    /// Whether the operation has completed successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(*self.state.borrow(), OpState::Complete)
    }

    /// Block the calling task until this operation completes.
    ///
    /// Device-side failures surface here, not at submission time: a failed
    /// transfer yields [`OverlapError::TransferFailed`], a failed kernel
    /// [`OverlapError::KernelFailed`], and an operation skipped because a
    /// dependency failed yields [`OverlapError::DependencyFailed`].
    pub async fn wait(&self) -> Result<()> {
        let mut rx = self.state.clone();
        loop {
            {
                let state = rx.borrow_and_update();
                match &*state {
                    OpState::Pending => {}
                    OpState::Complete => return Ok(()),
                    OpState::Failed { reason, dep } => {
                        return Err(match dep {
                            Some(dep) => OverlapError::DependencyFailed {
                                id: self.id,
                                dep: *dep,
                            },
                            None => match self.kind {
                                OpKind::Transfer => OverlapError::TransferFailed(reason.clone()),
                                OpKind::Compute => OverlapError::KernelFailed(reason.clone()),
                            },
                        });
                    }
                }
            }
            if rx.changed().await.is_err() {
                // Backend dropped the Completion without resolving it.
                return Err(OverlapError::OperationLost {
                    id: self.id,
                    reason: "completion signal dropped by backend".to_string(),
                });
            }
        }
    }
}

impl Completion {
    /// Mark the operation as successfully completed.
    pub fn finish(self) {
        let _ = self.tx.send(OpState::Complete);
    }

    /// Mark the operation as failed.
    pub fn fail(self, reason: impl Into<String>) {
        let _ = self.tx.send(OpState::Failed {
            reason: reason.into(),
            dep: None,
        });
    }

    /// Mark the operation as skipped because a dependency failed.
    pub fn fail_dependency(self, dep: OpId) {
        let _ = self.tx.send(OpState::Failed {
            reason: format!("dependency {dep} failed"),
            dep: Some(dep),
        });
    }
}
