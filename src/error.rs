//! Error types for Canvas API operations.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during Canvas API operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Configuration is missing or incomplete.
    #[error("Canvas configuration required: {0}")]
    ConfigMissing(String),

    /// API request failed (non-2xx status or upstream error payload).
    #[error("Canvas API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Local I/O error (reading an upload payload).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The upload negotiation response did not carry an upload target.
    #[error("Upload negotiation failed: {0}")]
    UploadNegotiation(String),

    /// Pagination followed more `next` links than the defensive cap allows.
    #[error("Pagination exceeded {pages} pages without exhausting the next chain")]
    PageLimitExceeded { pages: u32 },

    /// The resource name is not recognized.
    #[error("Unknown resource '{0}'")]
    UnknownResource(String),

    /// The (resource, operation) pair is not recognized.
    #[error("Operation '{operation}' is not supported for resource '{resource}'")]
    UnsupportedOperation {
        resource: String,
        operation: String,
    },

    /// A required dispatcher parameter is missing from the input item.
    #[error("Required parameter '{0}' is missing")]
    MissingParameter(&'static str),

    /// An upload operation was invoked on an item without binary data.
    #[error("No binary data found on input item")]
    MissingBinaryData,

    /// SIS ID contains characters Canvas rejects.
    #[error("Invalid SIS ID '{0}'")]
    InvalidSisId(String),

    /// A batch item failed; carries the index of the failing item.
    #[error("Item {index} failed: {source}")]
    Item {
        index: usize,
        #[source]
        source: Box<CanvasError>,
    },
}

/// Result type alias for Canvas operations.
pub type Result<T> = core::result::Result<T, CanvasError>;

/// Extract a human-readable message from a Canvas error payload.
///
/// Canvas reports validation failures as `{"errors": {field: [{"message": ..}]}}`;
/// those are concatenated as `field: message` pairs. A top-level `message`
/// is used verbatim. Anything else yields the generic fallback.
pub fn api_error_message(payload: &Value) -> String {
    if let Some(errors) = payload.get("errors").and_then(Value::as_object) {
        let mut messages = Vec::new();
        for (field, entries) in errors {
            if let Some(entries) = entries.as_array() {
                for entry in entries {
                    match entry.get("message").and_then(Value::as_str) {
                        Some(msg) => messages.push(format!("{field}: {msg}")),
                        None => {
                            if let Some(msg) = entry.as_str() {
                                messages.push(format!("{field}: {msg}"));
                            }
                        }
                    }
                }
            }
        }
        if !messages.is_empty() {
            return messages.join("; ");
        }
    }

    if let Some(message) = payload.get("message").and_then(Value::as_str) {
        return message.to_string();
    }

    "Unknown Canvas API error".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_errors_are_concatenated() {
        let payload = json!({
            "errors": {
                "name": [{"message": "Name is required"}],
                "email": [{"message": "Invalid email format"}],
            }
        });
        let message = api_error_message(&payload);
        assert!(message.contains("name: Name is required"));
        assert!(message.contains("email: Invalid email format"));
    }

    #[test]
    fn test_plain_string_entries() {
        let payload = json!({"errors": {"course_code": ["is too long"]}});
        assert_eq!(api_error_message(&payload), "course_code: is too long");
    }

    #[test]
    fn test_top_level_message() {
        let payload = json!({"message": "Something went wrong"});
        assert_eq!(api_error_message(&payload), "Something went wrong");
    }

    #[test]
    fn test_unknown_payload_falls_back() {
        assert_eq!(api_error_message(&json!({})), "Unknown Canvas API error");
    }
}
