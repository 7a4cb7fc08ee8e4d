use crate::core::error::{AppError, StoreError};
use crate::core::state::AppState;
use crate::handlers::session::{session_user, CurrentUser};
use crate::models::user::{DegreeYear, NewUser, UserUpdate};
use crate::utils::cookie::{clear_session_cookie, session_cookie, session_token};
use crate::utils::password::{hash_password, verify_password};
use crate::utils::time::current_timestamp;
use crate::validation::forms::{ForgotPasswordForm, LoginForm, RegisterForm};
use crate::validation::rules::{validate, FormErrors};
use crate::views::pages;
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use std::sync::Arc;
use tracing::{info, warn};

const MSG_UNKNOWN_USER: &str = "User does not exist";
const MSG_WRONG_PASSWORD: &str = "Wrong password";
const MSG_DISABLED: &str = "This account is disabled";
const MSG_DUPLICATE_USERID: &str = "This user ID is already registered";

fn render_login(form: &LoginForm, errors: &FormErrors, notice: Option<&str>) -> Response {
    let notices: Vec<String> = notice.into_iter().map(str::to_string).collect();
    Html(pages::login(form, errors, &notices)).into_response()
}

/// GET /login
pub async fn login_page(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if session_user(&state, &headers).is_some() {
        return Redirect::to("/index").into_response();
    }
    render_login(&LoginForm::default(), &FormErrors::new(), None)
}

/// POST /login
///
/// Unknown users and wrong passwords get different messages; neither
/// reveals anything beyond that distinction.
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = validate(&form, state.users.as_ref()) {
        return Ok(render_login(&form, &errors, None));
    }

    let Some(user) = state.users.find_by_userid(&form.userid) else {
        info!(userid = %form.userid, "Login attempt for unknown user");
        return Ok(render_login(&form, &FormErrors::new(), Some(MSG_UNKNOWN_USER)));
    };

    if !verify_password(&form.password, &user.password_hash).await? {
        warn!(user_id = user.id, "Login attempt with wrong password");
        return Ok(render_login(&form, &FormErrors::new(), Some(MSG_WRONG_PASSWORD)));
    }

    if !user.is_active {
        warn!(user_id = user.id, "Login attempt for disabled account");
        return Ok(render_login(&form, &FormErrors::new(), Some(MSG_DISABLED)));
    }

    // A fresh token on every login; the old one stops working
    if let Some(previous) = session_token(&headers) {
        state.sessions.remove(&previous);
    }

    let token = state.sessions.create(user.id, current_timestamp());
    let cookie = session_cookie(
        &token,
        state.sessions.ttl_seconds(),
        state.config.session.cookie_secure,
    )
    .map_err(|e| AppError::Internal(format!("Failed to build session cookie: {}", e)))?;

    info!(user_id = user.id, userid = %user.userid, "User logged in");

    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, cookie);
    Ok((response_headers, Redirect::to("/index")).into_response())
}

/// GET /register
pub async fn register_page() -> Html<String> {
    Html(pages::register(&RegisterForm::default(), &FormErrors::new()))
}

/// POST /register
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = validate(&form, state.users.as_ref()) {
        return Ok(Html(pages::register(&form, &errors)).into_response());
    }

    let degree_year: DegreeYear = form
        .degree_year
        .parse()
        .map_err(|e: anyhow::Error| AppError::BadRequest(e.to_string()))?;

    let password_hash = hash_password(&form.password, state.config.security.bcrypt_cost).await?;

    let new_user = NewUser {
        username: form.username.trim().to_string(),
        userid: form.userid.clone(),
        password_hash,
        degree_year,
    };

    match state.users.create(new_user, current_timestamp()) {
        Ok(user) => {
            info!(
                user_id = user.id,
                userid = %user.userid,
                degree_year = %user.degree_year,
                "User registered"
            );
            Ok(Redirect::to("/login").into_response())
        }
        Err(StoreError::DuplicateUserId(userid)) => {
            // Lost a race with a concurrent registration
            warn!(userid = %userid, "Duplicate userid rejected by the store");
            let errors = FormErrors::single("userid", MSG_DUPLICATE_USERID);
            Ok(Html(pages::register(&form, &errors)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /forgot_password
pub async fn forgot_password_page() -> Html<String> {
    Html(pages::forgot_password("", None, &FormErrors::new(), &[]))
}

/// POST /forgot_password
///
/// A userid alone locates the account and shows the password boxes; a
/// submission carrying a new password commits it.
pub async fn forgot_password_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response, AppError> {
    if form.userid.trim().is_empty() {
        let errors = FormErrors::single("userid", "User ID is required");
        return Ok(Html(pages::forgot_password(&form.userid, None, &errors, &[])).into_response());
    }

    let Some(user) = state.users.find_by_userid(&form.userid) else {
        info!(userid = %form.userid, "Password reset for unknown user");
        let notices = [MSG_UNKNOWN_USER.to_string()];
        return Ok(
            Html(pages::forgot_password(&form.userid, None, &FormErrors::new(), &notices))
                .into_response(),
        );
    };

    if !form.has_new_password() {
        return Ok(
            Html(pages::forgot_password(&form.userid, Some(&user), &FormErrors::new(), &[]))
                .into_response(),
        );
    }

    if let Err(errors) = validate(&form, state.users.as_ref()) {
        return Ok(
            Html(pages::forgot_password(&form.userid, Some(&user), &errors, &[])).into_response(),
        );
    }

    let password_hash = hash_password(&form.password, state.config.security.bcrypt_cost).await?;
    state.users.update(
        user.id,
        &UserUpdate {
            password_hash: Some(password_hash),
            ..Default::default()
        },
    )?;

    let revoked = state.sessions.revoke_user(user.id);
    info!(user_id = user.id, sessions_revoked = revoked, "Password reset");

    Ok(Redirect::to("/login").into_response())
}

/// GET /logout
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    state.sessions.remove(&current.token);

    let cookie = clear_session_cookie(state.config.session.cookie_secure)
        .map_err(|e| AppError::Internal(format!("Failed to build session cookie: {}", e)))?;

    info!(user_id = current.user.id, "User logged out");

    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, cookie);
    Ok((response_headers, Redirect::to("/index")).into_response())
}
