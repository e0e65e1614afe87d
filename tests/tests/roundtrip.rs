use common::*;

use anyhow::Result;
use serde_json::json;
use terranotes_proto::NoteId;

/// A fresh replica reconstructs the full live-note set from an encoded state,
/// and re-encoding on the recipient reproduces an equivalent document.
#[tokio::test]
async fn full_state_reconstructs_on_fresh_replica() -> Result<()> {
    let mut server = doc("parcel-12", 1);
    server.insert(draft(json!({"id": "n1", "text": "roof leak", "severity": 3})));
    server.insert(draft(json!({"id": "n2", "text": "fence down", "geotag": {"lat": 46.2, "lon": -119.1}})));
    server.insert(draft(json!({"id": "n3", "text": "scratch this"})));
    assert!(server.delete(&NoteId::from("n3")));

    let state = server.encode_full_state()?;

    let mut device = doc("parcel-12", 2);
    device.apply_fragment(&state)?;

    assert_eq!(live_set(&device.live_notes()), live_set(&server.live_notes()));
    assert_eq!(device.live_notes().len(), 2);

    // recipient re-encodes to the same register set
    assert_eq!(device.encode_full_state()?, state);

    // the tombstone travelled with the state: n3 cannot come back
    device.update(NoteId::from("n3"), draft(json!({"text": "back again?"})).fields);
    assert_eq!(device.live_notes().len(), 2);

    Ok(())
}

/// Decode failures are all-or-nothing: a corrupt blob must not leave a
/// partial merge behind.
#[tokio::test]
async fn corrupt_fragment_leaves_document_untouched() -> Result<()> {
    let mut server = doc("parcel-12", 1);
    server.insert(draft(json!({"id": "n1", "text": "roof leak"})));
    let before = server.encode_full_state()?;

    assert!(server.apply_fragment(&"%%% definitely not a fragment %%%".into()).is_err());

    // structurally valid base64 over garbage bytes fails in the binary layer
    assert!(server.apply_fragment(&"AAAA".into()).is_err());

    assert_eq!(server.encode_full_state()?, before);
    assert_eq!(live_set(&server.live_notes()).len(), 1);

    Ok(())
}
