//! Request and response shapes shared by the stores, plus field checks.
//!
//! Every string field is trimmed before it is checked or stored. Lengths are
//! counted in characters, not bytes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// `{"id": "..."}`: the request of every lookup-by-id operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRequest {
    #[serde(default)]
    pub id: String,
}

impl IdRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The id, or an error naming what it identifies.
    pub fn id(&self, kind: &str) -> Result<&str> {
        required(&format!("{kind} id"), &self.id)
    }
}

/// `{"id": "..."}`: the confirmation returned by mutating operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: String,
}

impl IdResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Decode a JSON request body, reporting failures as caller errors.
pub fn parse_request<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let raw = raw.trim();
    let raw = if raw.is_empty() { "{}" } else { raw };
    serde_json::from_str(raw).map_err(|err| Error::InvalidArgument(format!("invalid request: {err}")))
}

/// A field that must be present and non-blank, returned trimmed.
pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidArgument(format!("{field} is required")));
    }
    Ok(value)
}

pub fn max_chars(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(Error::InvalidArgument(format!(
            "{field} must be {max} characters or less (got {len})"
        )));
    }
    Ok(())
}

/// `required` followed by `max_chars` on the trimmed value.
pub fn text<'a>(field: &str, value: &'a str, max: usize) -> Result<&'a str> {
    let value = required(field, value)?;
    max_chars(field, value, max)?;
    Ok(value)
}

/// Same checks for a field that may be omitted.
pub fn optional_text<'a>(
    field: &str,
    value: Option<&'a str>,
    max: usize,
) -> Result<Option<&'a str>> {
    value.map(|value| text(field, value, max)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank() {
        assert!(required("name", "alice").is_ok());
        let err = required("name", "   ").unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: name is required");
    }

    #[test]
    fn text_returns_trimmed_value() {
        assert_eq!(required("name", "  alice\t").unwrap(), "alice");
        assert_eq!(text("title", " T ", 1).unwrap(), "T");
        assert_eq!(optional_text("name", Some(" bob "), 8).unwrap(), Some("bob"));
        assert_eq!(optional_text("name", None, 8).unwrap(), None);
    }

    #[test]
    fn max_chars_counts_characters() {
        assert!(max_chars("name", &"é".repeat(64), 64).is_ok());
        assert!(max_chars("name", &"a".repeat(65), 64).is_err());
    }

    #[test]
    fn optional_text_skips_missing() {
        assert!(optional_text("description", None, 4).is_ok());
        assert!(optional_text("description", Some(""), 4).is_err());
        assert!(optional_text("description", Some("hello"), 4).is_err());
    }

    #[test]
    fn id_request_requires_id() {
        assert_eq!(IdRequest::new(" 4 ").id("board").unwrap(), "4");
        let err = IdRequest::default().id("board").unwrap_err();
        assert!(err.to_string().contains("board id is required"));
    }

    #[test]
    fn parse_request_maps_to_invalid_argument() {
        #[derive(serde::Deserialize)]
        #[allow(dead_code)]
        struct Req {
            id: String,
        }
        assert!(matches!(
            parse_request::<Req>("{\"id\": 7}"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(parse_request::<Req>("{\"id\": \"7\"}").is_ok());
    }
}
