use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{MovieRecord, UserId};
use crate::services::{collaborative, content};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CollaborativeParams {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct ContentParams {
    pub user_id: UserId,
    pub limit: Option<usize>,
}

/// Maps a malformed or missing query string onto the app error type, so
/// clients get the usual `{"error": ...}` JSON body instead of axum's
/// plain-text rejection.
fn reject_query<T>(params: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    let Query(params) = params.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    Ok(params)
}

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Collaborative recommendations for a user
///
/// A user id with no ratings on file yields an empty list, not an error;
/// missing or non-numeric parameters are rejected with 400 before reaching
/// the scoring core.
pub async fn collaborative_recommendations(
    State(state): State<AppState>,
    params: Result<Query<CollaborativeParams>, QueryRejection>,
) -> AppResult<Json<Vec<MovieRecord>>> {
    let params = reject_query(params)?;
    let records = collaborative::recommend(params.user_id, &state.dataset, &state.recommender);
    Ok(Json(records))
}

/// Content-based recommendations for a user
///
/// `limit` caps how many of the user's top-rated movies seed the search;
/// when absent, all rated movies are used.
pub async fn content_recommendations(
    State(state): State<AppState>,
    params: Result<Query<ContentParams>, QueryRejection>,
) -> AppResult<Json<Vec<MovieRecord>>> {
    let params = reject_query(params)?;
    let records = content::recommend(
        params.user_id,
        &state.dataset,
        params.limit,
        &state.recommender,
    );
    Ok(Json(records))
}
