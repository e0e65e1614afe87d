use tracing::debug;

use terranotes_proto::{EncodedState, Note, NoteId, ParcelId, ReplicaId};

use crate::{
    document::ParcelDocument,
    error::RequestError,
    registry::DocumentSet,
    validation::validate_note,
};

/// Result of every coordinator operation: the document's encoded full state
/// plus the decoded live-note list.
#[derive(Debug, Clone)]
pub struct SyncState {
    pub state: EncodedState,
    pub notes: Vec<Note>,
}

/// One client update. Exactly one of `fragment` / `note` must be set.
#[derive(Debug, Clone, Default)]
pub struct ClientUpdate {
    pub fragment: Option<EncodedState>,
    pub note: Option<serde_json::Value>,
}

/// Boundary-facing component. Holds the document mutex for the whole of each
/// mutation, so operations on one parcel are serialized and no partial state
/// is ever observable; distinct parcels proceed independently. None of the
/// container calls await, so the lock is never held across a suspension.
#[derive(Clone)]
pub struct SyncCoordinator {
    documents: DocumentSet,
}

impl SyncCoordinator {
    pub fn new(documents: DocumentSet) -> Self { Self { documents } }

    pub fn replica(&self) -> ReplicaId { self.documents.replica() }

    fn snapshot(doc: &ParcelDocument) -> Result<SyncState, RequestError> {
        Ok(SyncState { state: doc.encode_full_state()?, notes: doc.live_notes() })
    }

    /// Current encoded full state and live notes; creates an empty document
    /// for an unseen parcel rather than failing.
    pub async fn fetch_state(&self, parcel: &ParcelId) -> Result<SyncState, RequestError> {
        let handle = self.documents.get_or_create(parcel).await;
        let doc = handle.lock().await;
        Self::snapshot(&doc)
    }

    /// Merges a peer fragment or admits a validated note, then returns the
    /// merged state.
    pub async fn apply_client_update(&self, parcel: &ParcelId, update: ClientUpdate) -> Result<SyncState, RequestError> {
        let handle = self.documents.get_or_create(parcel).await;
        let mut doc = handle.lock().await;
        match (update.fragment, update.note) {
            (Some(fragment), None) => {
                // Fragments carry registers the peer replica already
                // validated; they bypass the field-level gate (trusted
                // transport, see validation.rs).
                doc.apply_fragment(&fragment)?;
                debug!(%parcel, "merged client fragment");
            }
            (None, Some(raw)) => {
                let draft = validate_note(&raw)?;
                match draft.id {
                    Some(id) if doc.is_live(&id) => {
                        doc.update(id, draft.fields);
                    }
                    _ => {
                        doc.insert(draft);
                    }
                }
            }
            _ => return Err(RequestError::BadRequest("exactly one of `update` or `note` must be supplied")),
        }
        Self::snapshot(&doc)
    }

    /// Merges the caller's fragment and returns the server's resulting full
    /// state. No version negotiation: merge is order-independent by
    /// construction, so whatever the caller missed is in the response.
    pub async fn sync_bidirectional(&self, parcel: &ParcelId, fragment: &EncodedState) -> Result<SyncState, RequestError> {
        let handle = self.documents.get_or_create(parcel).await;
        let mut doc = handle.lock().await;
        doc.apply_fragment(fragment)?;
        debug!(%parcel, "bidirectional sync");
        Self::snapshot(&doc)
    }

    /// Tombstones a live note. A concurrent delete elsewhere is tolerated —
    /// once merged, both deletes collapse into the same tombstone.
    pub async fn delete_note(&self, parcel: &ParcelId, note_id: &NoteId) -> Result<SyncState, RequestError> {
        let handle = self.documents.get_or_create(parcel).await;
        let mut doc = handle.lock().await;
        if !doc.delete(note_id) {
            return Err(RequestError::NotFound(note_id.clone()));
        }
        Self::snapshot(&doc)
    }
}
