use std::collections::BTreeMap;

use terranotes_proto::{FieldValue, NoteId};

use crate::error::ValidationError;

/// Client-supplied ids are stored verbatim, so keep them bounded.
const MAX_ID_LEN: usize = 128;

/// A schema-checked note payload, ready for the container. The only thing
/// permitted to construct one is [`validate_note`].
#[derive(Debug, Clone)]
pub struct NoteDraft {
    pub id: Option<NoteId>,
    pub fields: BTreeMap<String, FieldValue>,
}

/// Gate between raw JSON and the container. Runs on every direct note
/// mutation; fragment merges do not pass through here because fragments carry
/// registers already validated by the peer replica that produced them (a
/// deliberate trust boundary, not an oversight).
pub fn validate_note(raw: &serde_json::Value) -> Result<NoteDraft, ValidationError> {
    let object = raw.as_object().ok_or_else(|| ValidationError::new("note", "must be a JSON object"))?;

    let mut id = None;
    let mut fields = BTreeMap::new();
    for (key, value) in object {
        if key == "id" {
            let text = value.as_str().ok_or_else(|| ValidationError::new("id", "must be a string"))?;
            if text.is_empty() {
                return Err(ValidationError::new("id", "must not be empty"));
            }
            if text.len() > MAX_ID_LEN {
                return Err(ValidationError::new("id", "exceeds 128 bytes"));
            }
            id = Some(NoteId::from(text));
        } else {
            fields.insert(key.clone(), FieldValue::from(value));
        }
    }

    Ok(NoteDraft { id, fields })
}
