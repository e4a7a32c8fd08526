//! Lead handlers
//!
//! Listing and mutation go through the lead service, which applies the
//! per-caller isolation scope before anything touches storage.

use super::ApiError;
use crate::auth::Actor;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use itinero_applications::NewLeadRequest;
use itinero_core::{Lead, LeadFilter, LeadStatus};
use serde::Deserialize;
use serde_json::{json, Value};

/// Status update request
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: LeadStatus,
}

/// Assignment request; `assigned_to: null` unassigns
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assigned_to: Option<i64>,
}

/// List visible leads with filters
///
/// Query parameters: `status`, `priority`, `search`, `limit`, `offset`.
pub async fn list_leads(
    State(state): State<AppState>,
    Actor(context): Actor,
    Query(filter): Query<LeadFilter>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    let actor = state.load_actor(&context).await?;
    let leads = state.leads.list(&actor, &filter).await?;

    Ok(Json(leads))
}

/// Create a lead owned by the actor
pub async fn create_lead(
    State(state): State<AppState>,
    Actor(context): Actor,
    Json(request): Json<NewLeadRequest>,
) -> Result<Json<Lead>, ApiError> {
    let actor = state.load_actor(&context).await?;
    let lead = state.leads.create(&actor, request).await?;

    Ok(Json(lead))
}

/// Fetch a single visible lead
pub async fn get_lead(
    State(state): State<AppState>,
    Actor(context): Actor,
    Path(lead_id): Path<i64>,
) -> Result<Json<Lead>, ApiError> {
    let actor = state.load_actor(&context).await?;
    let lead = state.leads.get(&actor, lead_id).await?;

    Ok(Json(lead))
}

/// Update the pipeline status of a visible lead
pub async fn update_lead_status(
    State(state): State<AppState>,
    Actor(context): Actor,
    Path(lead_id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Lead>, ApiError> {
    let actor = state.load_actor(&context).await?;
    let lead = state
        .leads
        .update_status(&actor, lead_id, request.status)
        .await?;

    Ok(Json(lead))
}

/// Reassign a lead (admin tier)
pub async fn assign_lead(
    State(state): State<AppState>,
    Actor(context): Actor,
    Path(lead_id): Path<i64>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<Lead>, ApiError> {
    let actor = state.load_actor(&context).await?;
    let lead = state
        .leads
        .assign(&actor, lead_id, request.assigned_to)
        .await?;

    Ok(Json(lead))
}

/// Delete a lead (admin tier)
pub async fn delete_lead(
    State(state): State<AppState>,
    Actor(context): Actor,
    Path(lead_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let actor = state.load_actor(&context).await?;
    state.leads.delete(&actor, lead_id).await?;

    Ok(Json(json!({ "message": "Lead deleted" })))
}
