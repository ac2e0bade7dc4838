//! Error types for the overlap benchmark.

use crate::event::OpId;

/// Result type used throughout the benchmark crates.
pub type Result<T> = std::result::Result<T, OverlapError>;

/// Errors surfaced by device selection, allocation, and asynchronous
/// operations.
///
/// Every variant is fatal to the benchmark: errors propagate to `main` via
/// `?` and terminate the process with a diagnostic. Device-side failures are
/// surfaced at wait time, not at submission time.
#[derive(Debug, thiserror::Error)]
pub enum OverlapError {
    /// No accelerator matching the selection policy is available.
    #[error("no device available: {0}")]
    DeviceUnavailable(String),

    /// Host memory could not be allocated at the requested size.
    #[error("host allocation of {size} bytes failed")]
    HostAllocationFailed {
        /// Requested allocation size in bytes.
        size: usize,
    },

    /// Device memory could not be allocated at the requested size.
    #[error("device out of memory: requested {requested} bytes")]
    OutOfMemory {
        /// Requested allocation size in bytes.
        requested: usize,
    },

    /// A host-to-device transfer failed.
    #[error("transfer failed: {0}")]
    TransferFailed(String),

    /// A compute kernel failed during execution.
    #[error("kernel execution failed: {0}")]
    KernelFailed(String),

    /// An operation's dependency failed, so the operation never ran.
    #[error("operation {id} did not run: dependency {dep} failed")]
    DependencyFailed {
        /// The operation that was poisoned.
        id: OpId,
        /// The failed dependency.
        dep: OpId,
    },

    /// An operation's completion signal was lost (backend dropped it).
    #[error("operation {id} never completed: {reason}")]
    OperationLost {
        /// The orphaned operation.
        id: OpId,
        /// Why the completion signal disappeared.
        reason: String,
    },

    /// Invalid configuration or misuse of a backend.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
