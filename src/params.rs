//! Request-parameter encoding and formatting helpers.
//!
//! Canvas write endpoints expect Rails-style nested form fields
//! (`course[name]`), list endpoints take `include[0..n]` arrays, and
//! timestamps must be ISO-8601 with millisecond precision. The helpers
//! here are pure transforms shared by the resource operations.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::{CanvasError, Result};

/// A loosely-shaped JSON object, used for request bodies and queries.
pub type Params = Map<String, Value>;

/// Normalize a configured Canvas domain.
///
/// Accepts values with a scheme, trailing slash, or `/api/v1` suffix and
/// reduces them to the bare host (plus any mount path).
pub fn format_domain(domain: &str) -> String {
    let mut formatted = domain.trim();
    formatted = formatted
        .strip_prefix("https://")
        .or_else(|| formatted.strip_prefix("http://"))
        .unwrap_or(formatted);
    formatted = formatted.strip_suffix('/').unwrap_or(formatted);
    formatted = formatted.strip_suffix("/api/v1").unwrap_or(formatted);
    formatted.to_string()
}

/// Build a `prefix[field]` parameter map from a flat field map.
///
/// Fields whose value is `null` or the empty string are dropped so that
/// server-side defaults are not cleared unintentionally.
pub fn nested_params(prefix: &str, fields: &Params) -> Params {
    let mut result = Params::new();
    for (key, value) in fields {
        if value.is_null() {
            continue;
        }
        if matches!(value.as_str(), Some("")) {
            continue;
        }
        result.insert(format!("{prefix}[{key}]"), value.clone());
    }
    result
}

/// Encode an `include` list as `include[0..n]` query keys.
pub fn include_query(includes: &[String]) -> Params {
    let mut query = Params::new();
    for (index, include) in includes.iter().enumerate() {
        query.insert(format!("include[{index}]"), Value::String(include.clone()));
    }
    query
}

/// Flatten a query map into wire pairs.
///
/// Scalars become one pair; arrays repeat the key with a `[]` suffix
/// (unless the caller already wrote one).
pub fn to_query_pairs(query: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in query {
        match value {
            Value::Array(values) => {
                let key = if key.ends_with("[]") {
                    key.clone()
                } else {
                    format!("{key}[]")
                };
                for value in values {
                    pairs.push((key.clone(), scalar_to_string(value)));
                }
            }
            other => pairs.push((key.clone(), scalar_to_string(other))),
        }
    }
    pairs
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Format a date input for Canvas: ISO-8601 with millisecond precision.
///
/// Accepts RFC 3339, offset-less datetimes, and bare dates; returns `None`
/// when the input is not a recognizable date (the caller passes the value
/// through untouched in that case).
pub fn format_date(input: &str) -> Option<String> {
    let parsed: DateTime<Utc> = if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        dt.with_timezone(&Utc)
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
        dt.and_utc()
    } else if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)?.and_utc()
    } else {
        return None;
    };
    Some(parsed.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Rename camelCase date fields to their snake_case wire names, formatting
/// the value on the way.
///
/// Mirrors how attribute maps arrive from callers (`startAt`) versus what
/// Canvas expects (`start_at`). Unparseable values keep the original text.
pub fn normalize_date_fields(fields: &mut Params, renames: &[(&str, &str)]) {
    for (from, to) in renames {
        if let Some(value) = fields.remove(*from) {
            let formatted = value
                .as_str()
                .and_then(format_date)
                .map(Value::String)
                .unwrap_or(value);
            fields.insert((*to).to_string(), formatted);
        }
    }
}

/// Flatten a nested response object with `_`-joined keys. Arrays are
/// preserved as-is.
pub fn flatten_record(record: &Params) -> Params {
    let mut result = Params::new();
    flatten_into(&mut result, record, "");
    result
}

fn flatten_into(result: &mut Params, record: &Params, prefix: &str) {
    for (key, value) in record {
        let new_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}_{key}")
        };
        match value {
            Value::Object(nested) => flatten_into(result, nested, &new_key),
            other => {
                result.insert(new_key, other.clone());
            }
        }
    }
}

/// Check a SIS ID for characters Canvas rejects.
pub fn validate_sis_id(sis_id: &str) -> bool {
    !sis_id
        .chars()
        .any(|c| matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
}

/// SIS ID reference types usable in place of numeric IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SisIdType {
    User,
    Course,
    Section,
    Account,
}

impl SisIdType {
    fn as_str(self) -> &'static str {
        match self {
            SisIdType::User => "user",
            SisIdType::Course => "course",
            SisIdType::Section => "section",
            SisIdType::Account => "account",
        }
    }
}

/// Build a `sis_{type}_id:{id}` reference for path interpolation.
pub fn sis_id_reference(id_type: SisIdType, sis_id: &str) -> Result<String> {
    if !validate_sis_id(sis_id) {
        return Err(CanvasError::InvalidSisId(sis_id.to_string()));
    }
    Ok(format!("sis_{}_id:{}", id_type.as_str(), sis_id))
}

/// Human-readable label for a Canvas enrollment type.
pub fn enrollment_type_label(enrollment_type: &str) -> &str {
    match enrollment_type {
        "StudentEnrollment" => "Student",
        "TeacherEnrollment" => "Teacher",
        "TaEnrollment" => "Teaching Assistant",
        "DesignerEnrollment" => "Designer",
        "ObserverEnrollment" => "Observer",
        other => other,
    }
}

/// Workflow state values selectable for a resource.
pub fn workflow_state_options(resource: &str) -> &'static [(&'static str, &'static str)] {
    match resource {
        "course" => &[
            ("Unpublished", "unpublished"),
            ("Available", "available"),
            ("Completed", "completed"),
            ("Deleted", "deleted"),
        ],
        "assignment" => &[("Published", "published"), ("Unpublished", "unpublished")],
        "enrollment" => &[
            ("Active", "active"),
            ("Invited", "invited"),
            ("Inactive", "inactive"),
            ("Completed", "completed"),
            ("Rejected", "rejected"),
            ("Deleted", "deleted"),
        ],
        "module" => &[("Active", "active"), ("Unpublished", "unpublished")],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_format_domain() {
        assert_eq!(
            format_domain("https://school.instructure.com"),
            "school.instructure.com"
        );
        assert_eq!(
            format_domain("http://school.instructure.com"),
            "school.instructure.com"
        );
        assert_eq!(
            format_domain("school.instructure.com/"),
            "school.instructure.com"
        );
        assert_eq!(
            format_domain("school.instructure.com/api/v1"),
            "school.instructure.com"
        );
        assert_eq!(
            format_domain("school.instructure.com"),
            "school.instructure.com"
        );
    }

    #[test]
    fn test_nested_params_prefixes_keys() {
        let fields = object(json!({"name": "Test Course", "code": "TC101"}));
        let result = nested_params("course", &fields);
        assert_eq!(result["course[name]"], json!("Test Course"));
        assert_eq!(result["course[code]"], json!("TC101"));
    }

    #[test]
    fn test_nested_params_skips_null_and_empty() {
        let fields = object(json!({"name": "Test", "empty": null, "blank": ""}));
        let result = nested_params("user", &fields);
        assert_eq!(result.len(), 1);
        assert_eq!(result["user[name]"], json!("Test"));
    }

    #[test]
    fn test_nested_params_keeps_false_and_zero() {
        let fields = object(json!({"published": false, "position": 0}));
        let result = nested_params("module", &fields);
        assert_eq!(result["module[published]"], json!(false));
        assert_eq!(result["module[position]"], json!(0));
    }

    #[test]
    fn test_include_query_indexes_entries() {
        let result = include_query(&["total_students".to_string(), "teachers".to_string()]);
        assert_eq!(result["include[0]"], json!("total_students"));
        assert_eq!(result["include[1]"], json!("teachers"));
        assert!(include_query(&[]).is_empty());
    }

    #[test]
    fn test_to_query_pairs_repeats_arrays() {
        let query = object(json!({"per_page": 10, "student_ids": ["4", "5"]}));
        let pairs = to_query_pairs(&query);
        assert!(pairs.contains(&("per_page".to_string(), "10".to_string())));
        assert!(pairs.contains(&("student_ids[]".to_string(), "4".to_string())));
        assert!(pairs.contains(&("student_ids[]".to_string(), "5".to_string())));
    }

    #[test]
    fn test_format_date_millisecond_precision() {
        assert_eq!(
            format_date("2025-01-15T12:00:00Z").as_deref(),
            Some("2025-01-15T12:00:00.000Z")
        );
        assert_eq!(
            format_date("2025-01-15T07:00:00-05:00").as_deref(),
            Some("2025-01-15T12:00:00.000Z")
        );
        assert_eq!(
            format_date("2025-01-15").as_deref(),
            Some("2025-01-15T00:00:00.000Z")
        );
        assert_eq!(format_date("not a date"), None);
    }

    #[test]
    fn test_normalize_date_fields_renames_and_formats() {
        let mut fields = object(json!({"startAt": "2025-01-15T12:00:00Z", "name": "X"}));
        normalize_date_fields(&mut fields, &[("startAt", "start_at"), ("endAt", "end_at")]);
        assert_eq!(fields["start_at"], json!("2025-01-15T12:00:00.000Z"));
        assert!(!fields.contains_key("startAt"));
        assert!(!fields.contains_key("end_at"));
        assert_eq!(fields["name"], json!("X"));
    }

    #[test]
    fn test_flatten_record() {
        let record = object(json!({
            "user": {"name": "Test", "email": "test@example.com"},
            "items": [1, 2, 3],
            "value": 123,
        }));
        let result = flatten_record(&record);
        assert_eq!(result["user_name"], json!("Test"));
        assert_eq!(result["user_email"], json!("test@example.com"));
        assert_eq!(result["items"], json!([1, 2, 3]));
        assert_eq!(result["value"], json!(123));
    }

    #[test]
    fn test_validate_sis_id() {
        assert!(validate_sis_id("12345"));
        assert!(validate_sis_id("student_001"));
        assert!(validate_sis_id("ABC-123"));
        assert!(!validate_sis_id("path/to/id"));
        assert!(!validate_sis_id("file:id"));
        assert!(!validate_sis_id("query?id"));
    }

    #[test]
    fn test_sis_id_reference() {
        assert_eq!(
            sis_id_reference(SisIdType::User, "12345").unwrap(),
            "sis_user_id:12345"
        );
        assert_eq!(
            sis_id_reference(SisIdType::Course, "CS101").unwrap(),
            "sis_course_id:CS101"
        );
        assert!(sis_id_reference(SisIdType::Section, "a/b").is_err());
    }

    #[test]
    fn test_enrollment_type_label() {
        assert_eq!(enrollment_type_label("StudentEnrollment"), "Student");
        assert_eq!(enrollment_type_label("TaEnrollment"), "Teaching Assistant");
        assert_eq!(enrollment_type_label("CustomEnrollment"), "CustomEnrollment");
    }

    #[test]
    fn test_workflow_state_options() {
        let course = workflow_state_options("course");
        assert!(course.contains(&("Unpublished", "unpublished")));
        assert!(course.contains(&("Available", "available")));
        assert!(workflow_state_options("unknown").is_empty());
    }
}
