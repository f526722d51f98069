//! Handlers for the tender, chore, history, tend, and import routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;

use super::{AppState, SyncId};
use crate::models::{Chore, HistoryEntry, Tender};
use crate::ops::{ExternalDocument, ImportSummary, OpError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tenders", get(list_tenders).post(create_tender))
        .route("/tenders/{id}", put(rename_tender).delete(delete_tender))
        .route("/chores", get(list_chores).post(create_chore))
        .route("/chores/{id}", put(update_chore).delete(delete_chore))
        .route("/history", get(list_history))
        .route("/history/{id}", delete(delete_history_entry))
        .route("/tend", post(record_tending))
        .route("/import", post(import))
}

// Request bodies use optional fields so a missing field surfaces as a 400
// with a descriptive message instead of a deserialization rejection.

#[derive(Deserialize)]
struct TenderBody {
    name: Option<String>,
}

#[derive(Deserialize)]
struct ChoreBody {
    name: Option<String>,
    icon: Option<String>,
}

#[derive(Deserialize)]
struct TendBody {
    tender: Option<String>,
    chore_id: Option<String>,
    notes: Option<String>,
}

async fn list_tenders(
    State(state): State<AppState>,
    Extension(SyncId(sync_id)): Extension<SyncId>,
) -> Result<Json<Vec<Tender>>, OpError> {
    Ok(Json(state.service.list_tenders(&sync_id).await?))
}

async fn create_tender(
    State(state): State<AppState>,
    Extension(SyncId(sync_id)): Extension<SyncId>,
    Json(body): Json<TenderBody>,
) -> Result<(StatusCode, Json<Tender>), OpError> {
    let name = body.name.as_deref().unwrap_or_default();
    let tender = state.service.add_tender(&sync_id, name).await?;
    Ok((StatusCode::CREATED, Json(tender)))
}

async fn rename_tender(
    State(state): State<AppState>,
    Extension(SyncId(sync_id)): Extension<SyncId>,
    Path(id): Path<String>,
    Json(body): Json<TenderBody>,
) -> Result<Json<Tender>, OpError> {
    let name = body.name.as_deref().unwrap_or_default();
    let tender = state.service.rename_tender(&sync_id, &id, name).await?;
    Ok(Json(tender))
}

async fn delete_tender(
    State(state): State<AppState>,
    Extension(SyncId(sync_id)): Extension<SyncId>,
    Path(id): Path<String>,
) -> Result<StatusCode, OpError> {
    state.service.delete_tender(&sync_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_chores(
    State(state): State<AppState>,
    Extension(SyncId(sync_id)): Extension<SyncId>,
) -> Result<Json<Vec<Chore>>, OpError> {
    Ok(Json(state.service.list_chores(&sync_id).await?))
}

async fn create_chore(
    State(state): State<AppState>,
    Extension(SyncId(sync_id)): Extension<SyncId>,
    Json(body): Json<ChoreBody>,
) -> Result<(StatusCode, Json<Chore>), OpError> {
    let name = body.name.as_deref().unwrap_or_default();
    let icon = body.icon.as_deref().unwrap_or_default();
    let chore = state.service.add_chore(&sync_id, name, icon).await?;
    Ok((StatusCode::CREATED, Json(chore)))
}

async fn update_chore(
    State(state): State<AppState>,
    Extension(SyncId(sync_id)): Extension<SyncId>,
    Path(id): Path<String>,
    Json(body): Json<ChoreBody>,
) -> Result<Json<Chore>, OpError> {
    let chore = state
        .service
        .update_chore(&sync_id, &id, body.name.as_deref(), body.icon.as_deref())
        .await?;
    Ok(Json(chore))
}

async fn delete_chore(
    State(state): State<AppState>,
    Extension(SyncId(sync_id)): Extension<SyncId>,
    Path(id): Path<String>,
) -> Result<StatusCode, OpError> {
    state.service.delete_chore(&sync_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_history(
    State(state): State<AppState>,
    Extension(SyncId(sync_id)): Extension<SyncId>,
) -> Result<Json<Vec<HistoryEntry>>, OpError> {
    Ok(Json(state.service.list_history(&sync_id).await?))
}

async fn delete_history_entry(
    State(state): State<AppState>,
    Extension(SyncId(sync_id)): Extension<SyncId>,
    Path(id): Path<String>,
) -> Result<StatusCode, OpError> {
    state.service.delete_history_entry(&sync_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn record_tending(
    State(state): State<AppState>,
    Extension(SyncId(sync_id)): Extension<SyncId>,
    Json(body): Json<TendBody>,
) -> Result<(StatusCode, Json<HistoryEntry>), OpError> {
    let tender = body.tender.as_deref().unwrap_or_default();
    let chore_id = body.chore_id.as_deref().unwrap_or_default();
    let entry = state
        .service
        .record_tending(&sync_id, tender, chore_id, body.notes.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn import(
    State(state): State<AppState>,
    Extension(SyncId(sync_id)): Extension<SyncId>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ImportSummary>, OpError> {
    // Parse by hand so a missing or mistyped collection is a 400 with a
    // message, not a generic body rejection.
    let document: ExternalDocument = serde_json::from_value(body)
        .map_err(|e| OpError::InvalidArgument(format!("malformed import payload: {}", e)))?;
    let summary = state.service.import(&sync_id, document).await?;
    Ok(Json(summary))
}
