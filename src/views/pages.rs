use crate::models::user::{DegreeYear, User};
use crate::validation::forms::{LoginForm, RegisterForm, StatusForm, STATUS_OTHER};
use crate::validation::rules::FormErrors;
use crate::views::layout::{form, input, page, radios, select};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

const STATUS_RADIOS: [(&str, &str); 4] = [
    ("present", "Present"),
    ("away", "Away"),
    ("left", "Left"),
    (STATUS_OTHER, "Other"),
];

fn member_list(users: &[User]) -> String {
    if users.is_empty() {
        return "<p>Nobody.</p>".to_string();
    }

    let mut html = String::from("<ul class=\"members\">");
    for user in users {
        html.push_str("<li>");
        if let Some(path) = &user.picture_path {
            let _ = write!(
                html,
                "<img class=\"avatar\" src=\"/static/{}\" alt=\"\">",
                encode_double_quoted_attribute(path)
            );
        }
        let _ = write!(
            html,
            "<strong>{}</strong> ({}) : {}</li>",
            encode_text(&user.username),
            user.degree_year,
            encode_text(&user.status)
        );
    }
    html.push_str("</ul>");
    html
}

pub fn index(viewer: Option<&User>, entered: &[User], exited: &[User]) -> String {
    let content = format!(
        "<h2>In the lab ({})</h2>{}<h2>Out ({})</h2>{}",
        entered.len(),
        member_list(entered),
        exited.len(),
        member_list(exited)
    );
    page("Board", viewer, &[], &content)
}

pub fn login(form_data: &LoginForm, errors: &FormErrors, notices: &[String]) -> String {
    let fields = [
        input("text", "userid", "User ID", &form_data.userid, errors),
        input("password", "password", "Password", "", errors),
    ]
    .concat();
    let content = format!(
        "{}<p><a href=\"/forgot_password\">Forgot your password?</a></p>",
        form("/login", false, &fields, "Log in")
    );
    page("Log in", None, notices, &content)
}

pub fn register(form_data: &RegisterForm, errors: &FormErrors) -> String {
    let selected = if form_data.degree_year.is_empty() {
        DegreeYear::REGISTRATION_CHOICES[0]
    } else {
        form_data.degree_year.as_str()
    };
    let fields = [
        input("text", "username", "Display name", &form_data.username, errors),
        input("text", "userid", "User ID", &form_data.userid, errors),
        input("password", "password", "Password", "", errors),
        input("password", "conf_password", "Confirm password", "", errors),
        select(
            "degree_year",
            "Degree year",
            &DegreeYear::REGISTRATION_CHOICES,
            selected,
            errors,
        ),
    ]
    .concat();
    page("Register", None, &[], &form("/register", false, &fields, "Register"))
}

/// Before a user is located only the userid box is shown; afterwards the
/// userid is carried in a hidden field next to the new password boxes.
pub fn forgot_password(
    userid: &str,
    located: Option<&User>,
    errors: &FormErrors,
    notices: &[String],
) -> String {
    let fields = match located {
        None => input("text", "userid", "User ID", userid, errors),
        Some(user) => [
            format!(
                "<p>Resetting the password of <strong>{}</strong> ({})</p>\
                 <input type=\"hidden\" name=\"userid\" value=\"{}\">",
                encode_text(&user.username),
                encode_text(&user.userid),
                encode_double_quoted_attribute(&user.userid)
            ),
            input("password", "password", "New password", "", errors),
            input("password", "conf_password", "Confirm password", "", errors),
        ]
        .concat(),
    };
    let submit = if located.is_some() { "Reset password" } else { "Find account" };
    page(
        "Reset password",
        None,
        notices,
        &form("/forgot_password", false, &fields, submit),
    )
}

pub fn status(viewer: &User, form_data: &StatusForm, errors: &FormErrors) -> String {
    let fields = [
        radios("status", &STATUS_RADIOS, &form_data.status, errors),
        input("text", "othertext", "Other status", &form_data.othertext, errors),
    ]
    .concat();
    page("Status", Some(viewer), &[], &form("/status", false, &fields, "Update"))
}

pub fn setting(viewer: &User, degree_year: &str, errors: &FormErrors, notices: &[String]) -> String {
    let current_picture = viewer
        .picture_path
        .as_ref()
        .map(|path| {
            format!(
                "<p><img class=\"avatar\" src=\"/static/{}\" alt=\"\"> current picture</p>",
                encode_double_quoted_attribute(path)
            )
        })
        .unwrap_or_default();

    let fields = [
        format!(
            "<p>Current display name: <strong>{}</strong></p>",
            encode_text(&viewer.username)
        ),
        input("text", "username", "New display name (leave blank to keep)", "", errors),
        select(
            "degree_year",
            "Degree year",
            &DegreeYear::SETTING_CHOICES,
            degree_year,
            errors,
        ),
        current_picture,
        "<p><label>Profile picture<br><input type=\"file\" name=\"picture\" accept=\"image/*\"></label></p>"
            .to_string(),
    ]
    .concat();
    page("Settings", Some(viewer), notices, &form("/setting", true, &fields, "Update"))
}

pub fn not_found(viewer: Option<&User>) -> String {
    page(
        "Not found",
        viewer,
        &[],
        "<p>There is nothing here. <a href=\"/index\">Back to the board</a></p>",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u32, name: &str, status: &str) -> User {
        let mut user = User::new(
            id,
            name.to_string(),
            format!("id{}", id),
            "hash".to_string(),
            DegreeYear::M1,
            0,
        );
        user.status = status.to_string();
        user
    }

    #[test]
    fn test_index_lists_both_groups() {
        let entered = vec![user(1, "Ann", "present")];
        let exited = vec![user(2, "Ben", "left"), user(3, "Cy", "left")];
        let html = index(None, &entered, &exited);
        assert!(html.contains("In the lab (1)"));
        assert!(html.contains("Out (2)"));
        assert!(html.contains("<strong>Ben</strong>"));
    }

    #[test]
    fn test_index_escapes_custom_status() {
        let entered = vec![user(1, "Ann", "<img src=x onerror=alert(1)>")];
        let html = index(None, &entered, &[]);
        assert!(!html.contains("<img src=x"));
    }

    #[test]
    fn test_forgot_password_shows_password_fields_once_located() {
        let located = user(4, "Dee", "left");
        let before = forgot_password("id4", None, &FormErrors::new(), &[]);
        assert!(!before.contains("name=\"password\""));

        let after = forgot_password("id4", Some(&located), &FormErrors::new(), &[]);
        assert!(after.contains("name=\"password\""));
        assert!(after.contains("type=\"hidden\" name=\"userid\" value=\"id4\""));
    }

    #[test]
    fn test_setting_uses_multipart() {
        let html = setting(&user(5, "Eve", "left"), "M1", &FormErrors::new(), &[]);
        assert!(html.contains("enctype=\"multipart/form-data\""));
        assert!(html.contains("<option value=\"M1\" selected>"));
        assert!(html.contains("<option value=\"OB\">"));
    }
}
