use crate::core::state::AppState;
use crate::models::user::User;
use crate::utils::cookie::session_token;
use crate::utils::time::current_timestamp;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
    response::Redirect,
};
use std::sync::Arc;
use tracing::debug;

/// The user behind the request's session cookie, if the session is live and
/// the account is still active
pub fn session_user(state: &AppState, headers: &HeaderMap) -> Option<(User, String)> {
    let token = session_token(headers)?;
    let user_id = state.sessions.resolve(&token, current_timestamp())?;
    let user = state.users.find_by_id(user_id)?;

    if !user.is_active {
        debug!(user_id, "Session belongs to a disabled account");
        return None;
    }

    Some((user, token))
}

/// Extractor for routes that require a session. Anonymous requests are
/// redirected to the login page.
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match session_user(state, &parts.headers) {
            Some((user, token)) => Ok(CurrentUser { user, token }),
            None => {
                debug!(path = %parts.uri.path(), "No session, redirecting to login");
                Err(Redirect::to("/login"))
            }
        }
    }
}
