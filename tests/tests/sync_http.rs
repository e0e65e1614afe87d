use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use terranotes_core::{DocumentSet, SyncCoordinator};
use terranotes_proto::ReplicaId;
use terranotes_server::{router, ServerState};

fn app() -> Router { router(ServerState::new(SyncCoordinator::new(DocumentSet::new(ReplicaId::new())))) }

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&value)?))?,
        None => Request::builder().method(method).uri(uri).body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn healthz_reports_service() -> Result<()> {
    let app = app();
    let (status, body) = call(&app, "GET", "/healthz", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    Ok(())
}

#[tokio::test]
async fn get_unknown_parcel_returns_empty_document() -> Result<()> {
    let app = app();
    let (status, body) = call(&app, "GET", "/unknown-id/notes", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notes"], json!([]));
    assert!(body["update"].is_string());
    Ok(())
}

#[tokio::test]
async fn put_note_then_get_round_trips() -> Result<()> {
    let app = app();

    let (status, body) = call(&app, "PUT", "/parcel-100/notes", Some(json!({"note": {"id": "n1", "text": "roof leak"}}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["mergedUpdate"].is_string());
    assert_eq!(body["data"]["notes"][0]["id"], json!("n1"));
    assert_eq!(body["data"]["notes"][0]["fields"]["text"], json!("roof leak"));

    let (status, body) = call(&app, "GET", "/parcel-100/notes", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notes"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"]["notes"][0]["fields"]["text"], json!("roof leak"));

    Ok(())
}

#[tokio::test]
async fn put_rejects_both_and_neither() -> Result<()> {
    let app = app();

    let (status, body) = call(&app, "PUT", "/parcel-100/notes", Some(json!({}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], json!("BadRequest"));

    let (_, state) = call(&app, "GET", "/parcel-100/notes", None).await?;
    let (status, body) =
        call(&app, "PUT", "/parcel-100/notes", Some(json!({"update": state["update"], "note": {"text": "x"}}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], json!("BadRequest"));

    Ok(())
}

#[tokio::test]
async fn put_invalid_note_returns_validation_error_with_field() -> Result<()> {
    let app = app();

    let (status, body) = call(&app, "PUT", "/parcel-100/notes", Some(json!({"note": {"id": 42}}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], json!("ValidationError"));
    assert_eq!(body["error"]["field"], json!("id"));

    Ok(())
}

#[tokio::test]
async fn sync_merges_device_state_both_ways() -> Result<()> {
    let app = app();

    call(&app, "PUT", "/parcel-100/notes", Some(json!({"note": {"id": "n1", "text": "roof leak"}}))).await?;
    let (_, fetched) = call(&app, "GET", "/parcel-100/notes", None).await?;

    // a device reconstructs the document, writes offline, and syncs back
    let mut device = terranotes_core::ParcelDocument::new("parcel-100".into(), ReplicaId::new());
    device.apply_fragment(&fetched["update"].as_str().unwrap_or_default().into())?;
    device.insert(terranotes_core::validation::validate_note(&json!({"id": "n2", "text": "fence down"}))?);
    let fragment = device.encode_full_state()?;

    let (status, body) = call(&app, "POST", "/parcel-100/sync", Some(json!({"update": fragment.as_str()}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["state"].is_string());
    assert_eq!(body["data"]["notes"].as_array().map(Vec::len), Some(2));

    Ok(())
}

#[tokio::test]
async fn sync_without_update_is_bad_request() -> Result<()> {
    let app = app();
    let (status, body) = call(&app, "POST", "/parcel-100/sync", Some(json!({}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], json!("BadRequest"));
    Ok(())
}

#[tokio::test]
async fn corrupt_sync_fragment_rejected_without_mutation() -> Result<()> {
    let app = app();

    call(&app, "PUT", "/parcel-100/notes", Some(json!({"note": {"id": "n1", "text": "roof leak"}}))).await?;
    let (_, before) = call(&app, "GET", "/parcel-100/notes", None).await?;

    let (status, body) = call(&app, "POST", "/parcel-100/sync", Some(json!({"update": "%%% garbage %%%"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], json!("MergeDecodeError"));

    let (_, after) = call(&app, "GET", "/parcel-100/notes", None).await?;
    assert_eq!(after, before);

    Ok(())
}

#[tokio::test]
async fn delete_note_and_not_found_mapping() -> Result<()> {
    let app = app();

    call(&app, "PUT", "/parcel-100/notes", Some(json!({"note": {"id": "n1", "text": "roof leak"}}))).await?;

    let (status, body) = call(&app, "DELETE", "/parcel-100/notes/n1", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notes"], json!([]));
    assert!(body["mergedUpdate"].is_string());

    let (status, body) = call(&app, "DELETE", "/parcel-100/notes/n1", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], json!("NotFound"));

    Ok(())
}
