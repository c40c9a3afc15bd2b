//! # Route Handlers
//!
//! The single-page UI, the health check, and the question endpoint.

use crate::{
    state::AppState,
    types::{ApiResponse, QueryRequest, QueryResponse},
};
use askdb::constants::{EXAMPLE_QUESTION, FALLBACK_ANSWER};
use axum::{extract::State, response::Html, Json};
use tracing::info;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// The handler for the root (`/`) endpoint, serving the question form.
pub async fn root() -> Html<String> {
    Html(
        INDEX_HTML
            .replace("{{example_question}}", EXAMPLE_QUESTION)
            .replace("{{fallback_answer}}", FALLBACK_ANSWER),
    )
}

/// The handler for the health check (`/health`) endpoint.
pub async fn health_check() -> &'static str {
    "OK"
}

/// The handler for the `/query` endpoint.
///
/// It always answers with `200 OK`: either the chain's answer or the fallback
/// message, never an error body.
pub async fn query_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Json<ApiResponse<QueryResponse>> {
    info!("Received query payload: {:?}", payload);
    let answer = app_state.query_handler.answer(&payload.question).await;
    Json(ApiResponse {
        result: QueryResponse { answer },
    })
}
