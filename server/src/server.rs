use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

use terranotes_core::{error::RequestError, ClientUpdate, SyncCoordinator, SyncState};
use terranotes_proto::{EncodedState, NoteId, ParcelId};

use crate::state::ServerState;

pub struct Server {
    bind_address: String,
    state: ServerState,
}

impl Server {
    pub fn builder() -> ServerBuilder { ServerBuilder::default() }

    pub async fn run(self) -> Result<()> {
        let app = router(self.state);

        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;
        info!("listening on {}", listener.local_addr()?);

        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[derive(Default)]
pub struct ServerBuilder {
    bind_address: Option<String>,
    coordinator: Option<SyncCoordinator>,
}

impl ServerBuilder {
    pub fn bind_address(mut self, addr: impl Into<String>) -> Self {
        self.bind_address = Some(addr.into());
        self
    }

    pub fn coordinator(mut self, coordinator: SyncCoordinator) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    pub fn build(self) -> Result<Server> {
        let bind_address = self.bind_address.ok_or_else(|| anyhow::anyhow!("bind_address is required"))?;

        let coordinator = self.coordinator.ok_or_else(|| anyhow::anyhow!("coordinator is required"))?;

        Ok(Server { bind_address, state: ServerState::new(coordinator) })
    }
}

/// The full route surface. Exposed so tests can drive it in-process.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/{parcel_id}/notes", get(fetch_notes).put(put_notes))
        .route("/{parcel_id}/notes/{note_id}", delete(delete_note))
        .route("/{parcel_id}/sync", post(sync_parcel))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .into_inner(),
        )
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "service": env!("CARGO_PKG_NAME"), "version": env!("CARGO_PKG_VERSION"), "status": "ok" }))
}

async fn fetch_notes(Path(parcel_id): Path<String>, State(state): State<ServerState>) -> Result<Json<serde_json::Value>, ApiError> {
    let sync = state.coordinator.fetch_state(&ParcelId::from(parcel_id)).await?;
    Ok(Json(json!({ "update": sync.state, "data": { "notes": sync.notes } })))
}

#[derive(Deserialize)]
struct PutNotesBody {
    update: Option<EncodedState>,
    note: Option<serde_json::Value>,
}

async fn put_notes(
    Path(parcel_id): Path<String>,
    State(state): State<ServerState>,
    Json(body): Json<PutNotesBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let update = ClientUpdate { fragment: body.update, note: body.note };
    let sync = state.coordinator.apply_client_update(&ParcelId::from(parcel_id), update).await?;
    Ok(Json(merged_response(&sync)))
}

#[derive(Deserialize)]
struct SyncBody {
    update: Option<EncodedState>,
}

async fn sync_parcel(
    Path(parcel_id): Path<String>,
    State(state): State<ServerState>,
    Json(body): Json<SyncBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let fragment = body.update.ok_or(RequestError::BadRequest("`update` is required"))?;
    let sync = state.coordinator.sync_bidirectional(&ParcelId::from(parcel_id), &fragment).await?;
    Ok(Json(json!({ "state": sync.state, "data": { "notes": sync.notes } })))
}

async fn delete_note(
    Path((parcel_id, note_id)): Path<(String, String)>,
    State(state): State<ServerState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sync = state.coordinator.delete_note(&ParcelId::from(parcel_id), &NoteId::from(note_id)).await?;
    Ok(Json(merged_response(&sync)))
}

fn merged_response(sync: &SyncState) -> serde_json::Value {
    json!({ "mergedUpdate": sync.state, "data": { "notes": sync.notes } })
}

/// Maps the core error taxonomy onto structured 4xx bodies. Nothing is
/// swallowed: a corrupt fragment surfaces to the caller rather than quietly
/// breaking that replica's convergence.
pub struct ApiError(RequestError);

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self { ApiError(err) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            RequestError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
            RequestError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            RequestError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            RequestError::MergeDecode(_) => (StatusCode::BAD_REQUEST, "MergeDecodeError"),
            RequestError::Encode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal"),
        };

        let mut error = json!({ "kind": kind, "message": self.0.to_string() });
        if let RequestError::Validation(validation) = &self.0 {
            error["field"] = json!(validation.field);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
