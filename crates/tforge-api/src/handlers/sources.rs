//! Trend source administration.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use tforge_models::TrendSource;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// A source as returned to clients; the key itself never leaves the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceView {
    pub name: String,
    pub url: String,
    pub has_api_key: bool,
}

impl From<TrendSource> for SourceView {
    fn from(source: TrendSource) -> Self {
        Self {
            has_api_key: source.api_key.as_deref().is_some_and(|k| !k.is_empty()),
            name: source.name,
            url: source.url,
        }
    }
}

pub async fn list_sources(State(state): State<AppState>) -> ApiResult<Json<Vec<SourceView>>> {
    let store = state.sources.clone();
    let sources = tokio::task::spawn_blocking(move || store.list()).await??;
    Ok(Json(sources.into_iter().map(SourceView::from).collect()))
}

/// Insert or replace a source by name.
pub async fn upsert_source(
    State(state): State<AppState>,
    Json(source): Json<TrendSource>,
) -> ApiResult<Json<SourceView>> {
    source.validate()?;
    if let Err(e) = state.credentials.check(&source) {
        warn!(source = %source.name, error = %e, "Rejected trend source without a usable key");
        return Err(ApiError::bad_request(e.to_string()));
    }

    let store = state.sources.clone();
    let name = source.name.clone();
    let stored = tokio::task::spawn_blocking(move || {
        store.upsert(&source)?;
        store.get(&source.name)
    })
    .await??
    .ok_or_else(|| ApiError::internal(format!("Source '{}' missing after upsert", name)))?;

    info!(source = %stored.name, "Trend source saved");
    Ok(Json(stored.into()))
}

pub async fn delete_source(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<StatusCode> {
    let store = state.sources.clone();
    let lookup = name.clone();
    let removed = tokio::task::spawn_blocking(move || store.remove(&lookup)).await??;

    if removed {
        info!(source = %name, "Trend source removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("Trend source '{}' not found", name)))
    }
}
