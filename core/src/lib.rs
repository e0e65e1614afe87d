pub mod coordinator;
pub mod document;
pub mod error;
pub mod registry;
pub mod validation;

pub use coordinator::{ClientUpdate, SyncCoordinator, SyncState};
pub use document::ParcelDocument;
pub use registry::DocumentSet;

pub use terranotes_proto as proto;
