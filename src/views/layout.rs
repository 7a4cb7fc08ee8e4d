// Page chrome and form widgets shared by every page

use crate::models::user::User;
use crate::validation::rules::FormErrors;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;max-width:52rem;margin:1rem auto;padding:0 1rem}\
nav a{margin-right:1rem}.error{color:#b00020}.notice{background:#fff3cd;padding:.5rem}\
ul.members{list-style:none;padding:0}ul.members li{margin:.25rem 0}\
img.avatar{width:32px;height:32px;object-fit:cover;vertical-align:middle;margin-right:.5rem}";

/// Wrap page content in the shared layout
pub fn page(title: &str, viewer: Option<&User>, notices: &[String], content: &str) -> String {
    let mut html = String::with_capacity(content.len() + 1024);

    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{} | Presence Board</title>\
         <style>{}</style></head><body><nav><a href=\"/index\">Board</a>",
        encode_text(title),
        STYLE
    );

    match viewer {
        Some(user) => {
            let _ = write!(
                html,
                "<a href=\"/status\">Status</a><a href=\"/setting\">Settings</a>\
                 <a href=\"/logout\">Log out</a><span>{}</span>",
                encode_text(&user.username)
            );
        }
        None => html.push_str("<a href=\"/login\">Log in</a><a href=\"/register\">Register</a>"),
    }
    html.push_str("</nav>");

    for notice in notices {
        let _ = write!(html, "<p class=\"notice\">{}</p>", encode_text(notice));
    }

    let _ = write!(html, "<h1>{}</h1>{}</body></html>", encode_text(title), content);
    html
}

fn field_error(errors: &FormErrors, name: &str) -> String {
    errors
        .get(name)
        .map(|message| format!("<span class=\"error\">{}</span>", encode_text(message)))
        .unwrap_or_default()
}

/// `<input>` with label and inline error. Password inputs never echo a value.
pub fn input(kind: &str, name: &str, label: &str, value: &str, errors: &FormErrors) -> String {
    let value = if kind == "password" { "" } else { value };
    format!(
        "<p><label>{label}<br><input type=\"{kind}\" name=\"{name}\" value=\"{value}\"></label>{error}</p>",
        label = encode_text(label),
        kind = kind,
        name = name,
        value = encode_double_quoted_attribute(value),
        error = field_error(errors, name)
    )
}

/// `<select>` over fixed choices
pub fn select(name: &str, label: &str, choices: &[&str], selected: &str, errors: &FormErrors) -> String {
    let mut html = format!(
        "<p><label>{}<br><select name=\"{}\">",
        encode_text(label),
        name
    );
    for choice in choices {
        let marker = if *choice == selected { " selected" } else { "" };
        let _ = write!(html, "<option value=\"{0}\"{1}>{0}</option>", choice, marker);
    }
    let _ = write!(html, "</select></label>{}</p>", field_error(errors, name));
    html
}

/// Radio group where each choice is `(value, label)`
pub fn radios(name: &str, choices: &[(&str, &str)], checked: &str, errors: &FormErrors) -> String {
    let mut html = String::from("<p>");
    for (value, label) in choices {
        let marker = if *value == checked { " checked" } else { "" };
        let _ = write!(
            html,
            "<label><input type=\"radio\" name=\"{}\" value=\"{}\"{}> {}</label> ",
            name,
            value,
            marker,
            encode_text(label)
        );
    }
    let _ = write!(html, "{}</p>", field_error(errors, name));
    html
}

pub fn form(action: &str, multipart: bool, fields: &str, submit: &str) -> String {
    let enctype = if multipart {
        " enctype=\"multipart/form-data\""
    } else {
        ""
    };
    format!(
        "<form method=\"post\" action=\"{}\"{}>{}<button type=\"submit\">{}</button></form>",
        action,
        enctype,
        fields,
        encode_text(submit)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_escapes_notices_and_names() {
        let html = page("Board", None, &["<b>hi</b>".to_string()], "<p>x</p>");
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(html.contains("<p>x</p>"));
        assert!(html.contains("href=\"/login\""));
    }

    #[test]
    fn test_password_input_never_echoes() {
        let html = input("password", "password", "Password", "secret", &FormErrors::new());
        assert!(!html.contains("secret"));
    }

    #[test]
    fn test_input_escapes_value_and_shows_error() {
        let errors = FormErrors::single("userid", "User ID is required");
        let html = input("text", "userid", "User ID", "\"><script>", &errors);
        assert!(!html.contains("\"><script>"));
        assert!(html.contains("User ID is required"));
    }

    #[test]
    fn test_select_marks_choice() {
        let html = select("degree_year", "Year", &["B3", "B4"], "B4", &FormErrors::new());
        assert!(html.contains("<option value=\"B4\" selected>"));
        assert!(html.contains("<option value=\"B3\">"));
    }

    #[test]
    fn test_radios_marks_choice() {
        let html = radios("status", &[("present", "Present"), ("away", "Away")], "away", &FormErrors::new());
        assert!(html.contains("value=\"away\" checked"));
        assert!(!html.contains("value=\"present\" checked"));
    }
}
