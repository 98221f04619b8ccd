//! Offline-first data access: cache-aside reads, deferred writes, replay.

/// Ordered drain over the pending queue.
pub mod queue;
/// Connectivity state machine and replay dispatch.
pub mod reconciler;
/// The session context object tying store and remote together.
pub mod session;

/// Result of a mutating call at the write boundary.
///
/// Network-caused failures never escape a mutation: the caller observes
/// either an immediate confirmation or a durably queued write.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    /// The remote applied the mutation; the confirmed record is attached.
    Applied(T),
    /// The network was unreachable; the mutation is queued for replay.
    Queued,
}

impl<T> MutationOutcome<T> {
    /// True when the mutation was deferred to the pending queue.
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued)
    }
}
