use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

use crate::error::DecodeError;

/// Identifies the parcel a field-note document is attached to.
/// Opaque to the sync engine; supplied by the caller's routing layer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParcelId(String);

impl ParcelId {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for ParcelId {
    fn from(val: &str) -> Self { ParcelId(val.to_string()) }
}

impl From<String> for ParcelId {
    fn from(val: String) -> Self { ParcelId(val) }
}

impl AsRef<str> for ParcelId {
    fn as_ref(&self) -> &str { &self.0 }
}

impl fmt::Display for ParcelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Identifies one note within a parcel document. Client-supplied ids are kept
/// verbatim; server-generated ids are ULID strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoteId(String);

impl NoteId {
    /// Collision-resistant id for notes that arrive without one.
    pub fn generate() -> Self { NoteId(Ulid::new().to_string()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for NoteId {
    fn from(val: &str) -> Self { NoteId(val.to_string()) }
}

impl From<String> for NoteId {
    fn from(val: String) -> Self { NoteId(val) }
}

impl AsRef<str> for NoteId {
    fn as_ref(&self) -> &str { &self.0 }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Identifies the replica that authored a write. Used for clock tie-breaks
/// and for the `lastModifiedBy` field on the wire.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ReplicaId(Ulid);

impl ReplicaId {
    pub fn new() -> Self { ReplicaId(Ulid::new()) }

    pub fn from_bytes(bytes: [u8; 16]) -> Self { ReplicaId(Ulid::from_bytes(bytes)) }

    pub fn to_bytes(&self) -> [u8; 16] { self.0.to_bytes() }

    pub fn from_base64<T: AsRef<[u8]>>(input: T) -> Result<Self, DecodeError> {
        let decoded = general_purpose::URL_SAFE_NO_PAD.decode(input).map_err(DecodeError::InvalidBase64)?;
        let bytes: [u8; 16] = decoded[..].try_into().map_err(|_| DecodeError::InvalidLength)?;

        Ok(ReplicaId(Ulid::from_bytes(bytes)))
    }

    pub fn to_base64(&self) -> String { general_purpose::URL_SAFE_NO_PAD.encode(self.0.to_bytes()) }

    pub fn to_base64_short(&self) -> String {
        // take the last 6 characters of the base64 encoded string
        let value = self.to_base64();
        value[value.len() - 6..].to_string()
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        if f.alternate() {
            write!(f, "{}", self.to_base64_short())
        } else {
            write!(f, "{}", self.to_base64())
        }
    }
}

impl TryFrom<&str> for ReplicaId {
    type Error = DecodeError;
    fn try_from(id: &str) -> Result<Self, Self::Error> { Self::from_base64(id) }
}

impl TryFrom<String> for ReplicaId {
    type Error = DecodeError;
    fn try_from(id: String) -> Result<Self, Self::Error> { Self::try_from(id.as_str()) }
}

impl std::fmt::Debug for ReplicaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

impl From<ReplicaId> for Ulid {
    fn from(id: ReplicaId) -> Self { id.0 }
}

impl Default for ReplicaId {
    fn default() -> Self { Self::new() }
}
