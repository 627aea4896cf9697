//! Data Routes
//!
//! - GET /wind-turbine-data - Latest published sample

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::LatestSampleResponse;
use crate::api::state::AppState;

/// GET /wind-turbine-data
///
/// Returns `{"data": null}` until the first sample is published.
pub async fn latest_sample(State(state): State<Arc<AppState>>) -> Json<LatestSampleResponse> {
    Json(LatestSampleResponse {
        data: state.hub.latest().await,
    })
}
