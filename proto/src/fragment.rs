use std::collections::BTreeMap;

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DecodeError, EncodeError},
    id::NoteId,
    note::NoteRegister,
};

const FRAGMENT_VERSION: u8 = 1;

/// A base64 blob carrying encoded note registers between replicas. Covers
/// both a document's full state and a delta (any subset of registers); merge
/// does not distinguish the two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedState(String);

impl EncodedState {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for EncodedState {
    fn from(val: &str) -> Self { EncodedState(val.to_string()) }
}

impl From<String> for EncodedState {
    fn from(val: String) -> Self { EncodedState(val) }
}

impl std::fmt::Display for EncodedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}b64", self.0.len()) }
}

#[derive(Serialize, Deserialize)]
struct Fragment {
    version: u8,
    data: Vec<u8>,
}

/// Serializes registers into a transportable fragment. Deterministic for a
/// given register set because the map is ordered.
pub fn encode_registers(registers: &BTreeMap<NoteId, NoteRegister>) -> Result<EncodedState, EncodeError> {
    let data = bincode::serialize(registers)?;
    let raw = bincode::serialize(&Fragment { version: FRAGMENT_VERSION, data })?;
    Ok(EncodedState(general_purpose::URL_SAFE_NO_PAD.encode(raw)))
}

/// Decodes a fragment back into registers. Validates the whole blob before
/// returning anything, so callers can merge all-or-nothing.
pub fn decode_registers(state: &EncodedState) -> Result<BTreeMap<NoteId, NoteRegister>, DecodeError> {
    let raw = general_purpose::URL_SAFE_NO_PAD.decode(state.as_str())?;
    let Fragment { version, data } = bincode::deserialize(&raw)?;
    match version {
        FRAGMENT_VERSION => Ok(bincode::deserialize(&data)?),
        other => Err(DecodeError::UnsupportedVersion(other)),
    }
}
