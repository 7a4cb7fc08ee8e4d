use crate::core::state::AppState;
use crate::handlers::session::session_user;
use crate::views::pages;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

pub async fn fallback_handler(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    debug!(path = %uri.path(), "No route matched");
    let viewer = session_user(&state, &headers).map(|(user, _)| user);
    (StatusCode::NOT_FOUND, Html(pages::not_found(viewer.as_ref()))).into_response()
}
