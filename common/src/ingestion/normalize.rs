// Projection of provider payloads onto `JobPosting`.
// All field defaulting for stored jobs happens here and nowhere else.

use crate::errors::ValidationError;
use crate::models::{Deadline, JobPosting};
use serde_json::Value;

pub const DEFAULT_TITLE: &str = "No Title";
pub const DEFAULT_COMPANY: &str = "Unknown Company";
pub const DEFAULT_LOCATION: &str = "Remote";

/// Payload keys that may carry an application deadline, in priority order
const DEADLINE_KEYS: &[&str] = &["last_date", "deadline", "application_deadline"];

/// Build a `JobPosting` from one raw provider record.
///
/// The provider id (string or number) becomes `external_id`; a record without one
/// is rejected. The title prefers `role` over `title`.
pub fn normalize_posting(raw: &Value) -> Result<JobPosting, ValidationError> {
    let object = raw
        .as_object()
        .ok_or_else(|| ValidationError::InvalidJson("posting is not a JSON object".to_string()))?;

    let external_id = match object.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ValidationError::MissingField("id".to_string())),
    };

    let title = non_empty_str(raw, "role")
        .or_else(|| non_empty_str(raw, "title"))
        .unwrap_or(DEFAULT_TITLE)
        .to_string();

    Ok(JobPosting {
        external_id,
        title,
        company_name: non_empty_str(raw, "company_name")
            .unwrap_or(DEFAULT_COMPANY)
            .to_string(),
        location: non_empty_str(raw, "location")
            .unwrap_or(DEFAULT_LOCATION)
            .to_string(),
        is_remote: raw.get("remote").and_then(Value::as_bool).unwrap_or(false),
        description: non_empty_str(raw, "description").unwrap_or("").to_string(),
        posting_url: non_empty_str(raw, "url").unwrap_or("").to_string(),
        date_posted: non_empty_str(raw, "created_at").unwrap_or("").to_string(),
        application_deadline: extract_deadline(raw),
        raw_payload: raw.clone(),
    })
}

fn non_empty_str<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn extract_deadline(raw: &Value) -> Option<Deadline> {
    DEADLINE_KEYS
        .iter()
        .filter_map(|key| non_empty_str(raw, key))
        .next()
        .and_then(|value| serde_json::from_value(Value::String(value.to_string())).ok())
}
