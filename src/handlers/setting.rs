use crate::core::error::{AppError, PictureError};
use crate::core::state::AppState;
use crate::handlers::session::CurrentUser;
use crate::models::user::{DegreeYear, User, UserUpdate};
use crate::utils::time::current_timestamp;
use crate::validation::forms::SettingForm;
use crate::validation::rules::{validate, FormErrors};
use crate::views::pages;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Parsed multipart body of the settings form
#[derive(Default)]
struct SettingSubmission {
    form: SettingForm,
    picture: Option<Bytes>,
}

/// Why a settings body could not be read
enum SubmissionError {
    /// The body ran past the request size limit
    TooLarge,
    Malformed(String),
}

impl SubmissionError {
    fn from_multipart(context: &str, err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            SubmissionError::TooLarge
        } else {
            SubmissionError::Malformed(format!("{}: {}", context, err))
        }
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<SettingSubmission, SubmissionError> {
    let mut submission = SettingSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SubmissionError::from_multipart("Malformed multipart body", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "username" | "degree_year" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| SubmissionError::from_multipart("Unreadable text field", e))?;
                if name == "username" {
                    submission.form.username = value;
                } else {
                    submission.form.degree_year = value;
                }
            }
            "picture" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| SubmissionError::from_multipart("Unreadable upload", e))?;
                // Browsers send an empty part when no file was chosen
                if !bytes.is_empty() {
                    submission.picture = Some(bytes);
                }
            }
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    Ok(submission)
}

fn render(user: &User, degree_year: &str, errors: &FormErrors, notice: Option<String>) -> Response {
    let notices: Vec<String> = notice.into_iter().collect();
    Html(pages::setting(user, degree_year, errors, &notices)).into_response()
}

/// GET /setting
pub async fn setting_page(current: CurrentUser) -> Html<String> {
    let degree_year = current.user.degree_year.as_str();
    Html(pages::setting(&current.user, degree_year, &FormErrors::new(), &[]))
}

/// POST /setting
///
/// A new picture is written before the row points at it; if the row update
/// fails the new file is removed again, and the previous file is only
/// removed once the row no longer references it.
pub async fn setting_handler(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let user = current.user;
    let SettingSubmission { form, picture } = match read_submission(multipart).await {
        Ok(submission) => submission,
        Err(SubmissionError::TooLarge) => {
            let limit = state.config.storage.max_upload_bytes;
            warn!(user_id = user.id, limit, "Settings body exceeded the upload limit");
            let message = PictureError::TooLarge { limit }.user_message();
            return Ok(render(
                &user,
                user.degree_year.as_str(),
                &FormErrors::new(),
                Some(message),
            ));
        }
        Err(SubmissionError::Malformed(detail)) => return Err(AppError::BadRequest(detail)),
    };

    if let Err(errors) = validate(&form, state.users.as_ref()) {
        return Ok(render(&user, &form.degree_year, &errors, None));
    }

    let degree_year: DegreeYear = form
        .degree_year
        .parse()
        .map_err(|e: anyhow::Error| AppError::BadRequest(e.to_string()))?;

    let now = current_timestamp();

    let new_picture = match picture {
        Some(bytes) => {
            let pictures = Arc::clone(&state.pictures);
            let user_id = user.id;
            let saved = tokio::task::spawn_blocking(move || pictures.save(user_id, now, &bytes))
                .await
                .map_err(|e| AppError::Internal(format!("Picture task failed: {}", e)))?;
            match saved {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(user_id = user.id, error = %e, "Rejected profile picture");
                    return Ok(render(
                        &user,
                        &form.degree_year,
                        &FormErrors::new(),
                        Some(e.user_message()),
                    ));
                }
            }
        }
        None => None,
    };

    let username = form.username.trim();
    let update = UserUpdate {
        username: (!username.is_empty()).then(|| username.to_string()),
        degree_year: Some(degree_year),
        picture_path: new_picture.clone(),
        updated_at: Some(now),
        ..Default::default()
    };

    let updated = match state.users.update(user.id, &update) {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(path) = &new_picture {
                discard_uncommitted_picture(&state, &user, path);
            }
            return Err(e.into());
        }
    };

    if let (Some(old), Some(new)) = (&user.picture_path, &new_picture) {
        if old != new {
            remove_picture(&state, user.id, old);
        }
    }

    info!(
        user_id = updated.id,
        degree_year = %updated.degree_year,
        picture_changed = new_picture.is_some(),
        "Settings updated"
    );

    Ok(Redirect::to("/index").into_response())
}

/// Remove a picture written for an update that never reached the row. A
/// same-second upload reuses the current file name, and that file stays.
fn discard_uncommitted_picture(state: &AppState, user: &User, path: &str) {
    if user.picture_path.as_deref() == Some(path) {
        debug!(user_id = user.id, path, "Keeping picture still referenced by the row");
        return;
    }
    remove_picture(state, user.id, path);
}

fn remove_picture(state: &AppState, user_id: u32, path: &str) {
    if let Err(e) = state.pictures.delete(path) {
        warn!(user_id, path, error = %e, "Failed to remove profile picture");
    }
}
