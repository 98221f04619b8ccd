//! Single-writer async runtime and event stream APIs.

/// Event stream types emitted toward the UI collaborator.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;
