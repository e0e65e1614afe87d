use serde::{Deserialize, Serialize};

use crate::id::ReplicaId;

/// Lamport tag stamped on every register write. Total order by
/// `(counter, replica)`, which is what merge uses to pick a winner between
/// concurrent writes to the same note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClockTag {
    pub counter: u64,
    pub replica: ReplicaId,
}

impl ClockTag {
    pub fn new(counter: u64, replica: ReplicaId) -> Self { Self { counter, replica } }
}

impl std::fmt::Display for ClockTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}@{:#}", self.counter, self.replica) }
}
