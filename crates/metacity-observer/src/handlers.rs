//! REST API endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/state` | Full game state snapshot |
//! | `GET` | `/api/summary` | Resource summary |
//! | `POST` | `/api/actions` | Submit an action, returns its outcome |
//! | `GET` | `/api/tutorial` | Walkthrough step, suggestion and objectives |
//! | `GET` | `/api/flavor` | Latest headline and tutorial hint |
//! | `POST` | `/api/buildings/:id/description` | Generate a building description |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use metacity_core::Action;
use metacity_core::flavor::description_request;
use metacity_core::tutorial::{objectives, suggest, walkthrough_step};
use metacity_types::BuildingId;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page with headline numbers and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let summary = state.simulation.snapshot().summary();
    let headline = escape_html(state.board.read().await.headline());

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>MetaCity</title>
    <style>
        body {{ background: #0d1117; color: #c9d1d9; font-family: monospace; padding: 2rem; }}
        h1 {{ color: #58a6ff; }}
        .metric {{ display: inline-block; padding: 1rem; margin-right: 1rem; border: 1px solid #30363d; }}
        a {{ color: #58a6ff; }}
    </style>
</head>
<body>
    <h1>MetaCity</h1>
    <p><em>{headline}</em></p>
    <div class="metric">Gold<br>{currency}</div>
    <div class="metric">Citizens<br>{population}</div>
    <div class="metric">Happiness<br>{morale}</div>
    <div class="metric">Buildings<br>{buildings}</div>
    <ul>
        <li><a href="/api/state">/api/state</a></li>
        <li><a href="/api/summary">/api/summary</a></li>
        <li><a href="/api/tutorial">/api/tutorial</a></li>
        <li><a href="/api/flavor">/api/flavor</a></li>
    </ul>
</body>
</html>"#,
        currency = summary.currency.normalize(),
        population = summary.population.normalize(),
        morale = summary.morale.normalize(),
        buildings = summary.buildings,
    ))
}

// ---------------------------------------------------------------------------
// Snapshot reads
// ---------------------------------------------------------------------------

/// Return the full game state as last published by the loop.
pub async fn get_state(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let snapshot = state.simulation.snapshot();
    Ok(Json(serde_json::to_value(&*snapshot)?))
}

/// Return the resource summary.
pub async fn get_summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.simulation.snapshot().summary())
}

// ---------------------------------------------------------------------------
// POST /api/actions -- action intake
// ---------------------------------------------------------------------------

/// Submit an action and wait for the reducer's verdict.
///
/// A rejected action is still a successful request; the body carries the
/// rejection reason.
pub async fn post_action(
    State(state): State<Arc<AppState>>,
    Json(action): Json<Action>,
) -> Result<impl IntoResponse, ObserverError> {
    let kind = action.kind();
    let outcome = state.simulation.submit(action).await?;
    debug!(action = kind, ?outcome, "Action submitted over HTTP");
    Ok(Json(outcome))
}

// ---------------------------------------------------------------------------
// GET /api/tutorial
// ---------------------------------------------------------------------------

/// Return the walkthrough step, the rule-based suggestion and completed
/// objectives.
pub async fn get_tutorial(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.simulation.snapshot();
    Json(serde_json::json!({
        "step": snapshot.tutorial_step,
        "open": snapshot.is_tutorial_open,
        "walkthrough": walkthrough_step(snapshot.tutorial_step),
        "suggestion": suggest(&snapshot),
        "objectives": objectives(&snapshot),
    }))
}

// ---------------------------------------------------------------------------
// Flavor
// ---------------------------------------------------------------------------

/// Return the latest headline and tutorial hint.
pub async fn get_flavor(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let board = state.board.read().await.clone();
    Json(board)
}

/// Generate a description for one building.
pub async fn post_description(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let building_id = BuildingId::from(parse_uuid(&id_str)?);
    let request = description_request(&state.simulation.snapshot(), building_id)
        .ok_or_else(|| ObserverError::NotFound(format!("building {building_id}")))?;

    let description = state
        .flavor
        .describe_building(&request)
        .await
        .map_err(|e| {
            warn!(building = %building_id, error = %e, "Building description failed");
            ObserverError::Description(e)
        })?;

    Ok(Json(serde_json::json!({ "description": description.text })))
}

/// Generated headlines end up in markup.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn parse_uuid(s: &str) -> Result<Uuid, ObserverError> {
    Uuid::parse_str(s).map_err(|e| ObserverError::InvalidUuid(format!("{s}: {e}")))
}
