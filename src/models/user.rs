use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};

/// Status stored for users who have not checked in
pub const STATUS_LEFT: &str = "left";
pub const STATUS_PRESENT: &str = "present";
pub const STATUS_AWAY: &str = "away";

/// The three canonical presence values, in radio-button order
pub const CANONICAL_STATUSES: [&str; 3] = [STATUS_PRESENT, STATUS_AWAY, STATUS_LEFT];

/// Academic cohort tag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DegreeYear {
    B3,
    B4,
    M1,
    M2,
    D,
    OB,
}

impl DegreeYear {
    /// Group order used by the index page. Alumni come last so that every
    /// user lands in exactly one group.
    pub const LISTING_ORDER: [DegreeYear; 6] = [
        DegreeYear::D,
        DegreeYear::M2,
        DegreeYear::M1,
        DegreeYear::B4,
        DegreeYear::B3,
        DegreeYear::OB,
    ];

    /// Cohorts offered at registration
    pub const REGISTRATION_CHOICES: [&'static str; 5] = ["B3", "B4", "M1", "M2", "D"];

    /// Cohorts offered on the settings page
    pub const SETTING_CHOICES: [&'static str; 6] = ["B3", "B4", "M1", "M2", "D", "OB"];

    pub fn as_str(&self) -> &'static str {
        match self {
            DegreeYear::B3 => "B3",
            DegreeYear::B4 => "B4",
            DegreeYear::M1 => "M1",
            DegreeYear::M2 => "M2",
            DegreeYear::D => "D",
            DegreeYear::OB => "OB",
        }
    }

    /// Position of this cohort in [`DegreeYear::LISTING_ORDER`]
    pub fn listing_rank(&self) -> usize {
        match self {
            DegreeYear::D => 0,
            DegreeYear::M2 => 1,
            DegreeYear::M1 => 2,
            DegreeYear::B4 => 3,
            DegreeYear::B3 => 4,
            DegreeYear::OB => 5,
        }
    }
}

impl fmt::Display for DegreeYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DegreeYear {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "B3" => Ok(DegreeYear::B3),
            "B4" => Ok(DegreeYear::B4),
            "M1" => Ok(DegreeYear::M1),
            "M2" => Ok(DegreeYear::M2),
            "D" => Ok(DegreeYear::D),
            "OB" => Ok(DegreeYear::OB),
            other => bail!("Unknown degree year '{}'", other),
        }
    }
}

/// Which side of the index page a user is listed on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    /// Any status other than "left"
    Entered,
    /// Status is exactly "left"
    Exited,
}

impl Presence {
    pub fn of(status: &str) -> Self {
        if status == STATUS_LEFT {
            Presence::Exited
        } else {
            Presence::Entered
        }
    }
}

/// A registered member
#[derive(Clone, PartialEq)]
pub struct User {
    /// Row identity, never reused
    pub id: u32,
    /// Display name
    pub username: String,
    /// Login handle, unique and immutable
    pub userid: String,
    /// bcrypt hash of the password
    pub password_hash: String,
    /// Free-text presence status
    pub status: String,
    pub degree_year: DegreeYear,
    /// Path relative to the static directory
    pub picture_path: Option<String>,
    /// Soft-disable flag
    pub is_active: bool,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds, bumped by profile edits only
    pub updated_at: i64,
}

impl User {
    pub fn new(
        id: u32,
        username: String,
        userid: String,
        password_hash: String,
        degree_year: DegreeYear,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            username,
            userid,
            password_hash,
            status: STATUS_LEFT.to_string(),
            degree_year,
            picture_path: None,
            is_active: true,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn presence(&self) -> Presence {
        Presence::of(&self.status)
    }
}

// Hand-written so the hash never reaches a log line.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("userid", &self.userid)
            .field("password_hash", &"<redacted>")
            .field("status", &self.status)
            .field("degree_year", &self.degree_year)
            .field("picture_path", &self.picture_path)
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Fields required to register a user
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub userid: String,
    pub password_hash: String,
    pub degree_year: DegreeYear,
}

/// A partial update of a user row. `None` leaves the column unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub status: Option<String>,
    pub degree_year: Option<DegreeYear>,
    pub picture_path: Option<String>,
    pub is_active: Option<bool>,
    /// New `updated_at`, set only by profile edits
    pub updated_at: Option<i64>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        *self == UserUpdate::default()
    }

    /// Apply the present fields to `user`
    pub fn apply_to(&self, user: &mut User) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(hash) = &self.password_hash {
            user.password_hash = hash.clone();
        }
        if let Some(status) = &self.status {
            user.status = status.clone();
        }
        if let Some(degree_year) = self.degree_year {
            user.degree_year = degree_year;
        }
        if let Some(path) = &self.picture_path {
            user.picture_path = Some(path.clone());
        }
        if let Some(active) = self.is_active {
            user.is_active = active;
        }
        if let Some(ts) = self.updated_at {
            user.updated_at = ts;
        }
    }
}
