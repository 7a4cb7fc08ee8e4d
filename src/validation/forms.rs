// Form bodies accepted by the HTML routes and their field rules

use crate::models::user::{DegreeYear, CANONICAL_STATUSES};
use crate::validation::rules::{FieldSpec, FormErrors, FormInput, Rule};
use serde::{Deserialize, Deserializer};

/// Shortest password accepted anywhere
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Radio value that switches the status page to free text
pub const STATUS_OTHER: &str = "other";

const STATUS_CHOICES: &[&str] = &[
    CANONICAL_STATUSES[0],
    CANONICAL_STATUSES[1],
    CANONICAL_STATUSES[2],
    STATUS_OTHER,
];

/// User IDs are compared and stored without surrounding whitespace
fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|value| value.trim().to_string())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    #[serde(deserialize_with = "trimmed")]
    pub userid: String,
    pub password: String,
}

impl FormInput for LoginForm {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec {
            name: "userid",
            label: "User ID",
            rules: &[Rule::Required],
        },
        FieldSpec {
            name: "password",
            label: "Password",
            rules: &[Rule::Required, Rule::MinLength(MIN_PASSWORD_LENGTH)],
        },
    ];

    fn value(&self, field: &str) -> &str {
        match field {
            "userid" => &self.userid,
            "password" => &self.password,
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    #[serde(deserialize_with = "trimmed")]
    pub userid: String,
    pub password: String,
    pub conf_password: String,
    pub degree_year: String,
}

impl FormInput for RegisterForm {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec {
            name: "username",
            label: "Display name",
            rules: &[Rule::Required],
        },
        FieldSpec {
            name: "userid",
            label: "User ID",
            rules: &[Rule::Required, Rule::UniqueUserId],
        },
        FieldSpec {
            name: "password",
            label: "Password",
            rules: &[Rule::Required, Rule::MinLength(MIN_PASSWORD_LENGTH)],
        },
        FieldSpec {
            name: "conf_password",
            label: "Confirm password",
            rules: &[Rule::Required, Rule::EqualTo("password")],
        },
        FieldSpec {
            name: "degree_year",
            label: "Degree year",
            rules: &[Rule::Required, Rule::OneOf(&DegreeYear::REGISTRATION_CHOICES)],
        },
    ];

    fn value(&self, field: &str) -> &str {
        match field {
            "username" => &self.username,
            "userid" => &self.userid,
            "password" => &self.password,
            "conf_password" => &self.conf_password,
            "degree_year" => &self.degree_year,
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordForm {
    #[serde(deserialize_with = "trimmed")]
    pub userid: String,
    pub password: String,
    pub conf_password: String,
}

impl ForgotPasswordForm {
    /// True once the user has typed into either password box
    pub fn has_new_password(&self) -> bool {
        !self.password.is_empty() || !self.conf_password.is_empty()
    }
}

impl FormInput for ForgotPasswordForm {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec {
            name: "userid",
            label: "User ID",
            rules: &[Rule::Required],
        },
        FieldSpec {
            name: "password",
            label: "New password",
            rules: &[Rule::Required, Rule::MinLength(MIN_PASSWORD_LENGTH)],
        },
        FieldSpec {
            name: "conf_password",
            label: "Confirm password",
            rules: &[Rule::Required, Rule::EqualTo("password")],
        },
    ];

    fn value(&self, field: &str) -> &str {
        match field {
            "userid" => &self.userid,
            "password" => &self.password,
            "conf_password" => &self.conf_password,
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatusForm {
    pub status: String,
    pub othertext: String,
}

impl StatusForm {
    /// Pre-filled form for a stored status. Non-canonical statuses select
    /// "other" with the text filled in.
    pub fn for_current(status: &str) -> Self {
        if CANONICAL_STATUSES.contains(&status) {
            Self {
                status: status.to_string(),
                othertext: String::new(),
            }
        } else {
            Self {
                status: STATUS_OTHER.to_string(),
                othertext: status.to_string(),
            }
        }
    }

    /// The status to store. Call after the form has validated.
    pub fn resolve(&self) -> Result<String, FormErrors> {
        if self.status != STATUS_OTHER {
            return Ok(self.status.clone());
        }

        let text = self.othertext.trim();
        if text.is_empty() {
            return Err(FormErrors::single("othertext", "Please enter a status"));
        }
        Ok(text.to_string())
    }
}

impl FormInput for StatusForm {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec {
            name: "status",
            label: "Status",
            rules: &[Rule::Required, Rule::OneOf(STATUS_CHOICES)],
        },
        FieldSpec {
            name: "othertext",
            label: "Other status",
            rules: &[],
        },
    ];

    fn value(&self, field: &str) -> &str {
        match field {
            "status" => &self.status,
            "othertext" => &self.othertext,
            _ => "",
        }
    }
}

/// Text fields of the settings page; the picture arrives as a separate part
#[derive(Debug, Clone, Default)]
pub struct SettingForm {
    pub username: String,
    pub degree_year: String,
}

impl FormInput for SettingForm {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec {
            name: "username",
            label: "Display name",
            rules: &[],
        },
        FieldSpec {
            name: "degree_year",
            label: "Degree year",
            rules: &[Rule::Required, Rule::OneOf(&DegreeYear::SETTING_CHOICES)],
        },
    ];

    fn value(&self, field: &str) -> &str {
        match field {
            "username" => &self.username,
            "degree_year" => &self.degree_year,
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::rules::{validate, UserLookup};

    struct NoUsers;

    impl UserLookup for NoUsers {
        fn userid_taken(&self, _userid: &str) -> bool {
            false
        }
    }

    struct EveryoneExists;

    impl UserLookup for EveryoneExists {
        fn userid_taken(&self, _userid: &str) -> bool {
            true
        }
    }

    fn register_form() -> RegisterForm {
        RegisterForm {
            username: "Alice".to_string(),
            userid: "alice1".to_string(),
            password: "pw1234".to_string(),
            conf_password: "pw1234".to_string(),
            degree_year: "B4".to_string(),
        }
    }

    #[test]
    fn test_register_form_valid() {
        assert!(validate(&register_form(), &NoUsers).is_ok());
    }

    #[test]
    fn test_register_rejects_taken_userid() {
        let errors = validate(&register_form(), &EveryoneExists).unwrap_err();
        assert_eq!(
            errors.get("userid"),
            Some("This user ID is already registered")
        );
    }

    #[test]
    fn test_register_rejects_alumni_cohort() {
        let mut form = register_form();
        form.degree_year = "OB".to_string();
        let errors = validate(&form, &NoUsers).unwrap_err();
        assert_eq!(errors.get("degree_year"), Some("Not a valid choice"));
    }

    #[test]
    fn test_register_confirmation_mismatch() {
        let mut form = register_form();
        form.conf_password = "pw9999".to_string();
        let errors = validate(&form, &NoUsers).unwrap_err();
        assert_eq!(errors.get("conf_password"), Some("Does not match password"));
    }

    #[test]
    fn test_login_short_password() {
        let form = LoginForm {
            userid: "alice1".to_string(),
            password: "pw1".to_string(),
        };
        let errors = validate(&form, &NoUsers).unwrap_err();
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 4 characters")
        );
    }

    #[test]
    fn test_forgot_password_new_password_detection() {
        let mut form = ForgotPasswordForm {
            userid: "alice1".to_string(),
            ..Default::default()
        };
        assert!(!form.has_new_password());
        form.conf_password = "x".to_string();
        assert!(form.has_new_password());
    }

    #[test]
    fn test_status_for_current_canonical() {
        let form = StatusForm::for_current("away");
        assert_eq!(form.status, "away");
        assert_eq!(form.othertext, "");
    }

    #[test]
    fn test_status_for_current_custom() {
        let form = StatusForm::for_current("in a meeting");
        assert_eq!(form.status, STATUS_OTHER);
        assert_eq!(form.othertext, "in a meeting");
    }

    #[test]
    fn test_status_resolve() {
        let form = StatusForm {
            status: "present".to_string(),
            othertext: "ignored".to_string(),
        };
        assert_eq!(form.resolve().unwrap(), "present");

        let form = StatusForm {
            status: STATUS_OTHER.to_string(),
            othertext: "  at the library ".to_string(),
        };
        assert_eq!(form.resolve().unwrap(), "at the library");

        let form = StatusForm {
            status: STATUS_OTHER.to_string(),
            othertext: String::new(),
        };
        let errors = form.resolve().unwrap_err();
        assert_eq!(errors.get("othertext"), Some("Please enter a status"));
    }

    #[test]
    fn test_status_rejects_unknown_choice() {
        let form = StatusForm {
            status: "asleep".to_string(),
            othertext: String::new(),
        };
        assert!(validate(&form, &NoUsers).is_err());
    }

    #[test]
    fn test_userid_is_trimmed_on_decode() {
        let login: LoginForm = serde_urlencoded::from_str("userid=+alice1%09&password=+pw+").unwrap();
        assert_eq!(login.userid, "alice1");
        assert_eq!(login.password, " pw ");

        let register: RegisterForm =
            serde_urlencoded::from_str("username=Alice&userid=%20alice1%20&degree_year=B4").unwrap();
        assert_eq!(register.userid, "alice1");

        let reset: ForgotPasswordForm = serde_urlencoded::from_str("userid=alice1++").unwrap();
        assert_eq!(reset.userid, "alice1");

        let missing: LoginForm = serde_urlencoded::from_str("password=pw1234").unwrap();
        assert_eq!(missing.userid, "");
    }

    #[test]
    fn test_setting_allows_blank_username() {
        let form = SettingForm {
            username: String::new(),
            degree_year: "OB".to_string(),
        };
        assert!(validate(&form, &NoUsers).is_ok());
    }
}
