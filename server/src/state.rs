use terranotes_core::SyncCoordinator;

/// Shared state for the HTTP surface.
#[derive(Clone)]
pub struct ServerState {
    pub coordinator: SyncCoordinator,
}

impl ServerState {
    pub fn new(coordinator: SyncCoordinator) -> Self { Self { coordinator } }
}
