//! Query endpoint

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryParams, QueryResponse};

/// GET /query?q=... - Answer a question from the indexed documents
pub async fn query(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<QueryResponse>> {
    tracing::info!("Query: \"{}\"", params.q);

    let answer = state.engine().query(&params.q).await?;

    Ok(Json(QueryResponse::new(answer)))
}
