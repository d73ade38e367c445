use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::login::errors::DobError;
use crate::login::errors::PortalTypeError;

/// Student record as held by the backing store.
///
/// Created and maintained by administrative staff; the login flow only reads
/// it and, on first login, sets the `account_id` back-reference.
#[derive(Debug, Clone)]
pub struct Student {
    pub id: StudentId,
    pub roll_number: String,
    pub register_number: Option<String>,
    pub date_of_birth: Dob,
    pub is_active: bool,
    pub account_id: Option<AccountId>,
}

/// Student unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StudentId(pub Uuid);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of an account held by the backing identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub Uuid);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Portal selector. Only the student portal authenticates through this
/// service; faculty and admin sign in with regular email credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalType {
    Student,
}

impl PortalType {
    pub fn parse(raw: &str) -> Result<Self, PortalTypeError> {
        match raw {
            "student" => Ok(Self::Student),
            other => Err(PortalTypeError::Unsupported(other.to_string())),
        }
    }
}

/// A date-of-birth format rule: a pattern capturing year, month and day,
/// paired with the capture index of each component.
struct DobRule {
    pattern: &'static LazyLock<Regex>,
    year: usize,
    month: usize,
    day: usize,
}

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap());

static DMY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4})$").unwrap());

/// Accepted formats, tried in order. First match wins.
static DOB_RULES: [DobRule; 2] = [
    DobRule {
        pattern: &ISO_DATE,
        year: 1,
        month: 2,
        day: 3,
    },
    DobRule {
        pattern: &DMY_DATE,
        year: 3,
        month: 2,
        day: 1,
    },
];

/// Date of birth in canonical `YYYY-MM-DD` form.
///
/// The canonical string doubles as the password of the provisioned backing
/// account, so normalization must be stable across logins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dob(NaiveDate);

impl Dob {
    /// Parse a date of birth through the ordered format rules.
    ///
    /// Accepts ISO `YYYY-MM-DD` and day/month/year with `/` or `-`
    /// separators. Components are checked against the calendar, so an
    /// impossible date like `31-13-2020` is rejected even though it matches
    /// the day/month/year shape.
    ///
    /// # Errors
    /// * `Unrecognized` - Input matches none of the accepted formats
    /// * `InvalidDate` - Shape matched but components are not a real date
    pub fn parse(raw: &str) -> Result<Self, DobError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DobError::Unrecognized);
        }

        for rule in &DOB_RULES {
            if let Some(captures) = rule.pattern.captures(raw) {
                let year: i32 = captures[rule.year]
                    .parse()
                    .map_err(|_| DobError::Unrecognized)?;
                let month: u32 = captures[rule.month]
                    .parse()
                    .map_err(|_| DobError::Unrecognized)?;
                let day: u32 = captures[rule.day]
                    .parse()
                    .map_err(|_| DobError::Unrecognized)?;

                return NaiveDate::from_ymd_opt(year, month, day)
                    .map(Dob)
                    .ok_or_else(|| DobError::InvalidDate(raw.to_string()));
            }
        }

        Err(DobError::Unrecognized)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Canonical `YYYY-MM-DD` rendering, used both for store comparison and
    /// as the backing-account password.
    pub fn canonical(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl From<NaiveDate> for Dob {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for Dob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

const EMAIL_LOCAL_PART_MAX: usize = 48;

/// Deterministic synthetic address representing a student inside the
/// email-shaped identity system.
///
/// Same roll number always yields the same address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalEmail(String);

impl CanonicalEmail {
    /// Derive the canonical account email from a roll number.
    ///
    /// Local part is the roll number lowercased and trimmed, with whitespace
    /// and any character outside `[a-z0-9._-]` replaced by `-`, runs of `-`
    /// collapsed, leading/trailing `.`/`-` trimmed, and the result truncated
    /// to 48 characters.
    pub fn for_student(roll_number: &str) -> Self {
        let mut local = String::with_capacity(roll_number.len());
        for c in roll_number.trim().to_lowercase().chars() {
            let c = match c {
                'a'..='z' | '0'..='9' | '.' | '_' => c,
                _ => '-',
            };
            if c == '-' && local.ends_with('-') {
                continue;
            }
            local.push(c);
        }

        let local: String = local
            .trim_matches(|c| c == '-' || c == '.')
            .chars()
            .take(EMAIL_LOCAL_PART_MAX)
            .collect();

        Self(format!("student.{local}@portal.local"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validated login command with domain types
#[derive(Debug)]
pub struct LoginCommand {
    pub portal: PortalType,
    pub identifier: String,
    pub dob: Dob,
}

/// Token payload returned by the identity provider's password grant.
///
/// Passed through to the client unchanged; fields the provider adds beyond
/// the standard four are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
