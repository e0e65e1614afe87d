use std::collections::{btree_map::Entry, BTreeMap};

use chrono::Utc;
use tracing::debug;

use terranotes_proto::{
    decode_registers, encode_registers, ClockTag, DecodeError, EncodeError, EncodedState, FieldValue, Note, NoteId, NoteRegister,
    ParcelId, ReplicaId,
};

use crate::validation::NoteDraft;

/// The convergent, in-memory authority for one parcel's notes.
///
/// A grow-only map of per-id LWW registers plus a Lamport counter. Local
/// writes stamp `counter + 1`; merging raises the counter to the highest tag
/// observed, so a later local write always out-clocks everything this replica
/// has seen. Tombstoned registers are retained for convergence and excluded
/// from listings.
#[derive(Debug, Clone)]
pub struct ParcelDocument {
    parcel_id: ParcelId,
    replica: ReplicaId,
    registers: BTreeMap<NoteId, NoteRegister>,
    counter: u64,
}

impl ParcelDocument {
    pub fn new(parcel_id: ParcelId, replica: ReplicaId) -> Self {
        Self { parcel_id, replica, registers: BTreeMap::new(), counter: 0 }
    }

    pub fn parcel_id(&self) -> &ParcelId { &self.parcel_id }

    pub fn replica(&self) -> ReplicaId { self.replica }

    fn tick(&mut self) -> ClockTag {
        self.counter += 1;
        ClockTag::new(self.counter, self.replica)
    }

    /// Admits a validated draft, generating an id when the client supplied
    /// none. Never rejects.
    pub fn insert(&mut self, draft: NoteDraft) -> Note {
        let id = draft.id.unwrap_or_else(NoteId::generate);
        self.write(id, draft.fields)
    }

    /// Replaces the field map of the note with this id, or creates it when no
    /// register exists (update-or-insert).
    pub fn update(&mut self, id: NoteId, fields: BTreeMap<String, FieldValue>) -> Note {
        self.write(id, fields)
    }

    fn write(&mut self, id: NoteId, fields: BTreeMap<String, FieldValue>) -> Note {
        let clock = self.tick();
        let now = Utc::now();
        let register = match self.registers.get(&id) {
            Some(existing) => NoteRegister {
                fields,
                created_at: existing.created_at,
                modified_at: now,
                modified_by: self.replica,
                // delete-wins: a write never clears an observed tombstone
                tombstone: existing.tombstone,
                clock,
            },
            None => NoteRegister { fields, created_at: now, modified_at: now, modified_by: self.replica, tombstone: false, clock },
        };
        debug!(parcel = %self.parcel_id, note = %id, %clock, "write");
        let note = Note::from_register(&id, &register);
        self.registers.insert(id, register);
        note
    }

    /// Marks the note tombstoned so the deletion itself replicates. Returns
    /// false when no live note exists under this id.
    pub fn delete(&mut self, id: &NoteId) -> bool {
        if !self.is_live(id) {
            return false;
        }
        let clock = self.tick();
        let replica = self.replica;
        if let Some(register) = self.registers.get_mut(id) {
            register.tombstone = true;
            register.modified_at = Utc::now();
            register.modified_by = replica;
            register.clock = clock;
        }
        debug!(parcel = %self.parcel_id, note = %id, %clock, "tombstone");
        true
    }

    pub fn is_live(&self, id: &NoteId) -> bool {
        matches!(self.registers.get(id), Some(register) if !register.tombstone)
    }

    /// Currently live notes, in this replica's key order. Order carries no
    /// cross-replica meaning.
    pub fn live_notes(&self) -> Vec<Note> {
        self.registers.iter().filter(|(_, register)| !register.tombstone).map(|(id, register)| Note::from_register(id, register)).collect()
    }

    /// Entry-by-entry merge of another replica's registers into this
    /// document. Commutative and idempotent because the per-register merge
    /// is; arrival order of fragments never matters.
    pub fn merge_registers(&mut self, incoming: BTreeMap<NoteId, NoteRegister>) {
        for (id, theirs) in incoming {
            self.counter = self.counter.max(theirs.clock.counter);
            match self.registers.entry(id) {
                Entry::Occupied(mut entry) => {
                    let merged = entry.get().merge(&theirs);
                    entry.insert(merged);
                }
                Entry::Vacant(entry) => {
                    entry.insert(theirs);
                }
            }
        }
    }

    /// Full state, live and tombstoned, sufficient to reconstruct this
    /// document on another replica.
    pub fn encode_full_state(&self) -> Result<EncodedState, EncodeError> { encode_registers(&self.registers) }

    /// Just the named registers, for shipping a delta instead of full state.
    /// Ids without a register are skipped.
    pub fn encode_notes(&self, ids: &[NoteId]) -> Result<EncodedState, EncodeError> {
        let subset: BTreeMap<NoteId, NoteRegister> =
            ids.iter().filter_map(|id| self.registers.get(id).map(|register| (id.clone(), register.clone()))).collect();
        encode_registers(&subset)
    }

    /// Merges an encoded fragment in place. Decodes the whole blob before
    /// touching the document, so a corrupt fragment never leaves a partial
    /// merge behind.
    pub fn apply_fragment(&mut self, state: &EncodedState) -> Result<(), DecodeError> {
        let incoming = decode_registers(state)?;
        debug!(parcel = %self.parcel_id, registers = incoming.len(), "apply_fragment");
        self.merge_registers(incoming);
        Ok(())
    }
}
