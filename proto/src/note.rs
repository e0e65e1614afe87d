use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{clock::ClockTag, id::NoteId, id::ReplicaId};

/// One canonical set of typed field values instead of a loosely-typed JSON
/// object threaded through the merge path. Unlike `serde_json::Value` this is
/// safe to carry through the bincode state buffers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => FieldValue::String(s.clone()),
            serde_json::Value::Array(items) => FieldValue::List(items.iter().map(FieldValue::from).collect()),
            serde_json::Value::Object(members) => {
                FieldValue::Map(members.iter().map(|(k, v)| (k.clone(), FieldValue::from(v))).collect())
            }
        }
    }
}

impl From<&FieldValue> for serde_json::Value {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Integer(i) => serde_json::Value::from(*i),
            // non-finite floats cannot cross a JSON boundary
            FieldValue::Float(f) => serde_json::Number::from_f64(*f).map(serde_json::Value::Number).unwrap_or(serde_json::Value::Null),
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::List(items) => serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect()),
            FieldValue::Map(members) => {
                serde_json::Value::Object(members.iter().map(|(k, v)| (k.clone(), serde_json::Value::from(v))).collect())
            }
        }
    }
}

/// Per-note last-writer-wins register. The full set of these, live and
/// tombstoned, is what replicas exchange; nothing else needs to travel for
/// the documents to converge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRegister {
    pub fields: BTreeMap<String, FieldValue>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub modified_by: ReplicaId,
    pub tombstone: bool,
    pub clock: ClockTag,
}

impl NoteRegister {
    /// Merge one observation of this note with another. The higher clock tag
    /// carries the field map and metadata; the tombstone bit is grow-only, so
    /// a delete survives any concurrent or later write. Commutative and
    /// idempotent, which is the whole convergence argument.
    pub fn merge(&self, other: &Self) -> Self {
        let mut winner = if other.clock > self.clock { other.clone() } else { self.clone() };
        winner.tombstone = self.tombstone || other.tombstone;
        winner.created_at = self.created_at.min(other.created_at);
        winner
    }
}

/// Boundary view of a live register, shaped for the JSON surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub fields: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub last_modified_by: ReplicaId,
}

impl Note {
    pub fn from_register(id: &NoteId, register: &NoteRegister) -> Self {
        Self {
            id: id.clone(),
            fields: register.fields.iter().map(|(k, v)| (k.clone(), serde_json::Value::from(v))).collect(),
            created_at: register.created_at,
            last_modified_at: register.modified_at,
            last_modified_by: register.modified_by,
        }
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Note({} {} fields, modified {} by {:#})", self.id, self.fields.len(), self.last_modified_at, self.last_modified_by)
    }
}
