// HTTP routes configuration

use crate::core::state::AppState;
use crate::handlers::{auth, fallback, health, index, setting, status};
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use tower_http::services::ServeDir;

/// Room for the multipart framing and text fields around an upload
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.storage.max_upload_bytes + FORM_OVERHEAD_BYTES;
    let static_files = ServeDir::new(&state.config.storage.static_dir);

    Router::new()
        // Public pages
        .route("/", get(index::index_handler))
        .route("/index", get(index::index_handler))
        .route("/health", get(health::health_handler))
        .route("/login", get(auth::login_page).post(auth::login_handler))
        .route("/register", get(auth::register_page).post(auth::register_handler))
        .route(
            "/forgot_password",
            get(auth::forgot_password_page).post(auth::forgot_password_handler),
        )

        // Session required
        .route("/logout", get(auth::logout_handler))
        .route("/status", get(status::status_page).post(status::status_handler))
        .route("/setting", get(setting::setting_page).post(setting::setting_handler))

        // Profile pictures
        .nest_service("/static", static_files)

        .fallback(fallback::fallback_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
