use crate::core::state::AppState;
use crate::handlers::session::session_user;
use crate::models::user::Presence;
use crate::views::pages;
use axum::{extract::State, http::HeaderMap, response::Html};
use std::sync::Arc;

/// GET / and /index
///
/// Public board of who is in and who is out. A logged-in viewer only
/// changes the navigation bar.
pub async fn index_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Html<String> {
    let viewer = session_user(&state, &headers).map(|(user, _)| user);
    let entered = state.users.list_by_presence(Presence::Entered);
    let exited = state.users.list_by_presence(Presence::Exited);
    Html(pages::index(viewer.as_ref(), &entered, &exited))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{body_text, test_app};
    use crate::models::user::{DegreeYear, UserUpdate};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_index_is_public() {
        let app = test_app();
        for uri in ["/", "/index"] {
            let response = app.get(uri, None).await;
            assert_eq!(response.status(), StatusCode::OK);
            let body = body_text(response).await;
            assert!(body.contains("In the lab (0)"));
            assert!(body.contains("Out (0)"));
        }
    }

    #[tokio::test]
    async fn test_index_groups_and_orders_members() {
        let app = test_app();
        let senior = app.seed_user("senior", "pw1234", DegreeYear::D).await;
        let junior = app.seed_user("junior", "pw1234", DegreeYear::B3).await;
        let alumnus = app.seed_user("alumnus", "pw1234", DegreeYear::OB).await;

        for user in [&junior, &senior] {
            app.state
                .users
                .update(
                    user.id,
                    &UserUpdate {
                        status: Some("present".to_string()),
                        ..Default::default()
                    },
                )
                .unwrap();
        }

        let body = body_text(app.get("/index", None).await).await;
        assert!(body.contains("In the lab (2)"));
        assert!(body.contains("Out (1)"));

        let senior_at = body.find(&senior.username).unwrap();
        let junior_at = body.find(&junior.username).unwrap();
        let alumnus_at = body.find(&alumnus.username).unwrap();
        assert!(senior_at < junior_at);
        assert!(junior_at < alumnus_at);
    }

    #[tokio::test]
    async fn test_index_shows_viewer_navigation() {
        let app = test_app();
        app.seed_user("alice1", "pw1234", DegreeYear::B4).await;
        let cookie = app.login("alice1", "pw1234").await;

        let body = body_text(app.get("/index", Some(&cookie)).await).await;
        assert!(body.contains("href=\"/logout\""));

        let body = body_text(app.get("/index", None).await).await;
        assert!(!body.contains("href=\"/logout\""));
    }
}
