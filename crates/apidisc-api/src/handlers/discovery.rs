//! Aggregated discovery handler

use axum::extract::State;
use axum::http::header::{ACCEPT, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use apidisc_core::AGGREGATED_CONTENT_TYPE;

use crate::error::ApiError;
use crate::state::AppState;

/// Whether an `Accept` header admits a JSON body
fn accepts_json(accept: &str) -> bool {
    accept.split(',').any(|range| {
        let media = range.split(';').next().unwrap_or_default().trim();
        matches!(media, "application/json" | "application/*" | "*/*")
    })
}

/// GET /apis
///
/// Serves the current document with its ETag; a matching `If-None-Match`
/// yields 304 without a body.
pub async fn get_apis(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(accept) = headers.get(ACCEPT).and_then(|v| v.to_str().ok()) {
        if !accepts_json(accept) {
            return Err(ApiError::NotAcceptable(format!(
                "cannot serve discovery as {}",
                accept
            )));
        }
    }

    let snapshot = state.resources().snapshot();
    let etag = format!("\"{}\"", snapshot.etag);

    let not_modified = headers
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|tags| snapshot.matches(tags));
    if not_modified {
        return Ok((StatusCode::NOT_MODIFIED, [(ETAG, etag)]).into_response());
    }

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, AGGREGATED_CONTENT_TYPE.to_string()),
            (ETAG, etag),
        ],
        snapshot.body.clone(),
    )
        .into_response())
}
