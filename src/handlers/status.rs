use crate::core::error::AppError;
use crate::core::state::AppState;
use crate::handlers::session::CurrentUser;
use crate::models::user::UserUpdate;
use crate::validation::forms::StatusForm;
use crate::validation::rules::{validate, FormErrors};
use crate::views::pages;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use std::sync::Arc;
use tracing::{debug, info};

/// GET /status
pub async fn status_page(current: CurrentUser) -> Html<String> {
    let form = StatusForm::for_current(&current.user.status);
    Html(pages::status(&current.user, &form, &FormErrors::new()))
}

/// POST /status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Form(form): Form<StatusForm>,
) -> Result<Response, AppError> {
    let resolved = validate(&form, state.users.as_ref()).and_then(|_| form.resolve());
    let status = match resolved {
        Ok(status) => status,
        Err(errors) => {
            debug!(user_id = current.user.id, "Status form rejected");
            return Ok(Html(pages::status(&current.user, &form, &errors)).into_response());
        }
    };

    let previous = current.user.presence();
    let user = state.users.update(
        current.user.id,
        &UserUpdate {
            status: Some(status),
            ..Default::default()
        },
    )?;

    info!(
        user_id = user.id,
        status = %user.status,
        presence_changed = previous != user.presence(),
        "Status updated"
    );

    Ok(Redirect::to("/index").into_response())
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{body_text, location, test_app};
    use crate::models::user::{DegreeYear, Presence, UserUpdate};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_status_requires_session() {
        let app = test_app();
        let response = app.get("/status", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/login"));

        let response = app.post_form("/status", &[("status", "present")], None).await;
        assert_eq!(location(&response), Some("/login"));
    }

    #[tokio::test]
    async fn test_set_canonical_status() {
        let app = test_app();
        let user = app.seed_user("alice1", "pw1234", DegreeYear::B4).await;
        let cookie = app.login("alice1", "pw1234").await;

        let response = app
            .post_form("/status", &[("status", "present")], Some(&cookie))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/index"));

        let stored = app.state.users.find_by_id(user.id).unwrap();
        assert_eq!(stored.status, "present");
        assert_eq!(stored.presence(), Presence::Entered);
        assert_eq!(
            app.state.users.list_by_presence(Presence::Entered)[0].id,
            user.id
        );
    }

    #[tokio::test]
    async fn test_set_custom_status() {
        let app = test_app();
        let user = app.seed_user("alice1", "pw1234", DegreeYear::B4).await;
        let cookie = app.login("alice1", "pw1234").await;

        let response = app
            .post_form(
                "/status",
                &[("status", "other"), ("othertext", "in a meeting")],
                Some(&cookie),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let stored = app.state.users.find_by_id(user.id).unwrap();
        assert_eq!(stored.status, "in a meeting");
        assert_eq!(stored.presence(), Presence::Entered);

        // The page pre-selects "other" with the text filled in
        let body = body_text(app.get("/status", Some(&cookie)).await).await;
        assert!(body.contains("value=\"in a meeting\""));
    }

    #[tokio::test]
    async fn test_other_without_text_keeps_status() {
        let app = test_app();
        let user = app.seed_user("alice1", "pw1234", DegreeYear::B4).await;
        let cookie = app.login("alice1", "pw1234").await;

        let response = app
            .post_form(
                "/status",
                &[("status", "other"), ("othertext", "   ")],
                Some(&cookie),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Please enter a status"));

        let stored = app.state.users.find_by_id(user.id).unwrap();
        assert_eq!(stored.status, "left");
    }

    #[tokio::test]
    async fn test_status_change_keeps_updated_at() {
        let app = test_app();
        let user = app.seed_user("alice1", "pw1234", DegreeYear::B4).await;
        app.state
            .users
            .update(
                user.id,
                &UserUpdate {
                    updated_at: Some(1000),
                    ..Default::default()
                },
            )
            .unwrap();
        let cookie = app.login("alice1", "pw1234").await;

        for (status, text) in [("present", ""), ("other", "at the library"), ("left", "")] {
            let response = app
                .post_form("/status", &[("status", status), ("othertext", text)], Some(&cookie))
                .await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
        }

        let stored = app.state.users.find_by_id(user.id).unwrap();
        assert_eq!(stored.status, "left");
        assert_eq!(stored.updated_at, 1000);
    }

    #[tokio::test]
    async fn test_unknown_status_choice_rejected() {
        let app = test_app();
        let user = app.seed_user("alice1", "pw1234", DegreeYear::B4).await;
        let cookie = app.login("alice1", "pw1234").await;

        let response = app
            .post_form("/status", &[("status", "asleep")], Some(&cookie))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Not a valid choice"));
        assert_eq!(app.state.users.find_by_id(user.id).unwrap().status, "left");
    }
}
