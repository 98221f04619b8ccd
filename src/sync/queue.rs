use tracing::debug;

use crate::{
    pending::StoredPending,
    remote::RemoteResult,
    store::{StoreResult, local::LocalStore},
    types::PendingSeq,
};

/// Result of one full ordered traversal attempt of the pending queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every snapshotted entry replayed and was removed.
    Drained {
        /// Number of entries replayed.
        replayed: usize,
    },
    /// A replay failed; the entry stays in place and the pass stopped.
    Halted {
        /// Sequence of the entry that failed.
        at: PendingSeq,
        /// Entries replayed (and removed) before the failure.
        replayed: usize,
    },
}

/// Replays one queue entry against the remote source.
///
/// The handler receives the store so a successful replay can update the
/// cached records the drain loop is iterating beside.
pub trait ReplayHandler {
    fn replay(&mut self, store: &LocalStore, entry: &StoredPending) -> RemoteResult<()>;
}

/// Drains the pending queue from oldest to newest sequence.
///
/// The queue is snapshotted once up front; entries enqueued while the
/// pass runs sit past the snapshot cursor and wait for the next pass.
/// Each entry is removed only after its handler returns `Ok`. A failed
/// entry halts the pass in place rather than being skipped, since a
/// later write may depend on it.
pub fn drain_in_order<H: ReplayHandler>(
    store: &LocalStore,
    handler: &mut H,
) -> StoreResult<DrainOutcome> {
    let snapshot = store.pending_snapshot()?;
    let mut replayed = 0usize;

    for entry in &snapshot {
        match handler.replay(store, entry) {
            Ok(()) => {
                store.remove_pending(entry.seq)?;
                replayed += 1;
            }
            Err(err) => {
                debug!(seq = entry.seq, ?err, "replay failed, halting drain pass");
                return Ok(DrainOutcome::Halted {
                    at: entry.seq,
                    replayed,
                });
            }
        }
    }

    Ok(DrainOutcome::Drained { replayed })
}
