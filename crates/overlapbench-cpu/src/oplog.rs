//! Deterministic record of operation lifecycles.

use std::time::Instant;

use parking_lot::Mutex;

use overlapbench_core::event::{OpId, OpKind};

/// Lifecycle phase of one recorded operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpPhase {
    /// The operation was enqueued with these dependencies.
    Submitted {
        /// Declared dependencies, in submission order.
        deps: Vec<OpId>,
    },
    /// All dependencies completed and the work began.
    Started,
    /// The work finished and the handle was resolved.
    Finished,
    /// The operation failed or was skipped because a dependency failed.
    Failed,
}

/// One log entry.
#[derive(Debug, Clone)]
pub struct OpRecord {
    /// The operation this entry belongs to.
    pub op: OpId,
    /// Transfer or compute.
    pub kind: OpKind,
    /// Lifecycle phase.
    pub phase: OpPhase,
    /// When the entry was recorded.
    pub at: Instant,
}

/// Append-only log of every operation the device processed.
///
/// This is how the structural ordering contract is verified without real
/// accelerator hardware: entries are appended in the order events actually
/// happened on the simulated device.
#[derive(Debug, Default)]
pub struct OpLog {
    records: Mutex<Vec<OpRecord>>,
}

impl OpLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, op: OpId, kind: OpKind, phase: OpPhase) {
        self.records.lock().push(OpRecord {
            op,
            kind,
            phase,
            at: Instant::now(),
        });
    }

    /// Snapshot of all entries in append order.
    pub fn records(&self) -> Vec<OpRecord> {
        self.records.lock().clone()
    }

    /// When `op` recorded its `Started` entry, if it has.
    pub fn started_at(&self, op: OpId) -> Option<Instant> {
        self.phase_at(op, &OpPhase::Started)
    }

    /// When `op` recorded its `Finished` entry, if it has.
    pub fn finished_at(&self, op: OpId) -> Option<Instant> {
        self.phase_at(op, &OpPhase::Finished)
    }

    /// Whether `first` finished strictly before `second` started.
    ///
    /// Uses append positions, not timestamps, so the answer is exact even
    /// when the two entries land within the clock's resolution.
    pub fn finished_before_started(&self, first: OpId, second: OpId) -> bool {
        let records = self.records.lock();
        let finished = records
            .iter()
            .position(|r| r.op == first && r.phase == OpPhase::Finished);
        let started = records
            .iter()
            .position(|r| r.op == second && r.phase == OpPhase::Started);
        matches!((finished, started), (Some(f), Some(s)) if f < s)
    }

    fn phase_at(&self, op: OpId, phase: &OpPhase) -> Option<Instant> {
        self.records
            .lock()
            .iter()
            .find(|r| r.op == op && r.phase == *phase)
            .map(|r| r.at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlapbench_core::event::OpHandle;

    #[test]
    fn test_ordering_queries() {
        let log = OpLog::new();
        let (a, _ca) = OpHandle::channel(OpKind::Transfer);
        let (b, _cb) = OpHandle::channel(OpKind::Compute);

        log.record(a.id(), OpKind::Transfer, OpPhase::Submitted { deps: vec![] });
        log.record(
            b.id(),
            OpKind::Compute,
            OpPhase::Submitted {
                deps: vec![a.id()],
            },
        );
        log.record(a.id(), OpKind::Transfer, OpPhase::Started);
        log.record(a.id(), OpKind::Transfer, OpPhase::Finished);
        log.record(b.id(), OpKind::Compute, OpPhase::Started);
        log.record(b.id(), OpKind::Compute, OpPhase::Finished);

        assert!(log.finished_before_started(a.id(), b.id()));
        assert!(!log.finished_before_started(b.id(), a.id()));
        assert!(log.finished_at(a.id()).unwrap() <= log.started_at(b.id()).unwrap());
        assert_eq!(log.records().len(), 6);
    }

    #[test]
    fn test_missing_phases() {
        let log = OpLog::new();
        let (a, _ca) = OpHandle::channel(OpKind::Transfer);

        log.record(a.id(), OpKind::Transfer, OpPhase::Submitted { deps: vec![] });
        assert!(log.started_at(a.id()).is_none());
        assert!(log.finished_at(a.id()).is_none());

        let (b, _cb) = OpHandle::channel(OpKind::Compute);
        assert!(!log.finished_before_started(a.id(), b.id()));
    }
}
