use crate::errors::ValidationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Job Models
// ============================================================================

/// Normalized projection of a provider posting, keyed by `external_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub external_id: String,
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub is_remote: bool,
    pub description: String,
    pub posting_url: String,
    pub date_posted: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_deadline: Option<Deadline>,
    /// Full provider payload, replaced wholesale on every upsert
    #[serde(default)]
    pub raw_payload: serde_json::Value,
}

/// A posting as persisted, with the store's own identifier as an opaque handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    #[serde(flatten)]
    pub posting: JobPosting,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn external_id(&self) -> &str {
        &self.posting.external_id
    }
}

/// Application deadline as found in the provider payload.
///
/// Structured values deserialize into `Timestamp` or `Date`; anything else is kept
/// verbatim and only interpreted when a date is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Deadline {
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Text(String),
}

impl Deadline {
    /// Resolve the deadline to a calendar date (UTC).
    pub fn to_date(&self) -> Result<NaiveDate, ValidationError> {
        match self {
            Deadline::Timestamp(ts) => Ok(ts.date_naive()),
            Deadline::Date(date) => Ok(*date),
            Deadline::Text(text) => parse_deadline_text(text),
        }
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

fn parse_deadline_text(text: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = text.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc).date_naive());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts.date());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|e| {
        ValidationError::InvalidFieldValue {
            field: "application_deadline".to_string(),
            reason: format!("'{}': {}", trimmed, e),
        }
    })
}

/// Read-side filter for listing stored jobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFilter {
    /// Case-insensitive substring of the title
    pub keyword: Option<String>,
    /// `remote` selects remote jobs, anything else is a location substring
    pub location: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl JobFilter {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn effective_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn wants_remote(&self) -> bool {
        self.location
            .as_deref()
            .map(|l| l.trim().eq_ignore_ascii_case("remote"))
            .unwrap_or(false)
    }

    /// Apply the filter to a single record (used by the in-memory store)
    pub fn matches(&self, job: &JobPosting) -> bool {
        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.is_empty()) {
            if !contains_ignore_case(&job.title, keyword) {
                return false;
            }
        }

        match self.location.as_deref().filter(|l| !l.is_empty()) {
            None => true,
            Some(_) if self.wants_remote() => job.is_remote,
            Some(location) => contains_ignore_case(&job.location, location),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

// ============================================================================
// Saved Job Models
// ============================================================================

/// A job a user saved to apply to later, keyed by `(user_id, external_id)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedForLater {
    pub id: String,
    pub user_id: String,
    pub external_id: String,
    pub saved_at: DateTime<Utc>,
    pub status: SavedStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reminded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavedStatus {
    Pending,
    Applied,
}

impl SavedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SavedStatus::Pending => "pending",
            SavedStatus::Applied => "applied",
        }
    }
}

impl std::str::FromStr for SavedStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SavedStatus::Pending),
            "applied" => Ok(SavedStatus::Applied),
            other => Err(ValidationError::InvalidFieldValue {
                field: "status".to_string(),
                reason: format!("unknown saved status '{}'", other),
            }),
        }
    }
}

/// Result of saving a job for later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved,
    AlreadyExists,
}

/// Result of an upsert by external id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

// ============================================================================
// Application Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub user_id: String,
    pub external_id: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Rejected,
    Accepted,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Accepted => "accepted",
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewing" => Ok(ApplicationStatus::Reviewing),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "accepted" => Ok(ApplicationStatus::Accepted),
            other => Err(ValidationError::InvalidFieldValue {
                field: "status".to_string(),
                reason: format!("unknown application status '{}'", other),
            }),
        }
    }
}

// ============================================================================
// User Models
// ============================================================================

/// Read-only view of a user profile owned by the authentication collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
}

/// Lowercased, trimmed, de-duplicated skills in their original order
pub fn normalize_skills(skills: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let skill = skill.trim().to_lowercase();
        if !skill.is_empty() && !normalized.contains(&skill) {
            normalized.push(skill);
        }
    }
    normalized
}

/// JWT claims issued by the authentication collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

// ============================================================================
// Recommendation & Notification Models
// ============================================================================

/// A job enriched with its match against a user's skills. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredJob {
    #[serde(flatten)]
    pub job: JobRecord,
    pub matched_skills: Vec<String>,
    pub match_score: u8,
    pub match_reason: String,
}

impl ScoredJob {
    pub fn is_matched(&self) -> bool {
        !self.matched_skills.is_empty()
    }
}

/// A reminder handed to the push-delivery collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationEvent {
    pub user_id: String,
    pub external_id: String,
    pub title: String,
    pub body: String,
}

impl NotificationEvent {
    pub const REMINDER_TITLE: &'static str = "Apply Reminder";

    pub fn deadline_reminder(user_id: &str, job: &JobPosting) -> Self {
        Self {
            user_id: user_id.to_string(),
            external_id: job.external_id.clone(),
            title: Self::REMINDER_TITLE.to_string(),
            body: format!(
                "Deadline for {} at {} is approaching.",
                job.title, job.company_name
            ),
        }
    }
}
