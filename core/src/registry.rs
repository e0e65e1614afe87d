use std::{
    collections::{btree_map::Entry, BTreeMap},
    sync::Arc,
};

use tokio::sync::{Mutex, RwLock};

use terranotes_proto::{ParcelId, ReplicaId};

use crate::document::ParcelDocument;

/// Shared handle to one parcel's document. The mutex serializes mutations per
/// parcel; distinct parcels contend only on the registry map itself.
pub type DocumentHandle = Arc<Mutex<ParcelDocument>>;

/// Process-lifetime registry of open parcel documents. Owned by whoever
/// constructs the service and passed into the coordinator; there is no
/// ambient global map. No eviction: documents live until the process exits.
pub struct DocumentSet(Arc<Inner>);

impl Clone for DocumentSet {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

struct Inner {
    replica: ReplicaId,
    documents: RwLock<BTreeMap<ParcelId, DocumentHandle>>,
}

impl DocumentSet {
    pub fn new(replica: ReplicaId) -> Self { Self(Arc::new(Inner { replica, documents: RwLock::new(BTreeMap::new()) })) }

    pub fn replica(&self) -> ReplicaId { self.0.replica }

    /// Never fails; an unseen parcel id gets an empty document.
    pub async fn get_or_create(&self, id: &ParcelId) -> DocumentHandle {
        let documents = self.0.documents.read().await;
        if let Some(doc) = documents.get(id) {
            return doc.clone();
        }
        drop(documents);

        let doc: DocumentHandle = Arc::new(Mutex::new(ParcelDocument::new(id.clone(), self.0.replica)));

        let mut documents = self.0.documents.write().await;

        // We might have raced another request to create this document
        match documents.entry(id.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                entry.insert(doc.clone());
                doc
            }
        }
    }
}
