use crate::error::StoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bookmark {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub notes: String,
    pub code_snippet: String,
    pub created_at: String,
    pub updated_at: String,
    pub tags: Vec<String>,
}

/// Bookmark record as the extension sends it, over either transport.
///
/// Every field is optional at the wire level so that a missing `url` or
/// `title` surfaces as a store failure instead of a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkPayload {
    pub url: Option<String>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub code_snippet: Option<String>,
    pub created_at: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBookmark {
    pub url: String,
    pub title: String,
    pub notes: String,
    pub code_snippet: String,
    pub created_at: Option<String>,
    pub tags: Vec<String>,
}

impl BookmarkPayload {
    pub fn validate(self) -> Result<NewBookmark, StoreError> {
        let url = required(self.url, "url")?;
        let title = required(self.title, "title")?;
        let created_at = self.created_at.filter(|s| !s.trim().is_empty());

        Ok(NewBookmark {
            url,
            title,
            notes: self.notes.unwrap_or_default(),
            code_snippet: self.code_snippet.unwrap_or_default(),
            created_at,
            tags: normalize_tags(self.tags.unwrap_or_default()),
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, StoreError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(StoreError::MissingField(field)),
    }
}

// Trimmed, non-empty, first occurrence wins.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || out.iter().any(|t| t == tag) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> BookmarkPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_payload_uses_camel_case_fields() {
        let p = payload(
            r#"{"url":"https://x","title":"T","codeSnippet":"fn main() {}","createdAt":"2024-01-01T00:00:00Z"}"#,
        );
        let b = p.validate().unwrap();
        assert_eq!(b.code_snippet, "fn main() {}");
        assert_eq!(b.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(b.notes, "");
        assert!(b.tags.is_empty());
    }

    #[test]
    fn test_missing_or_blank_required_fields() {
        let err = payload(r#"{"title":"T"}"#).validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: url");

        let err = payload(r#"{"url":"https://x","title":"   "}"#).validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: title");
    }

    #[test]
    fn test_tags_are_trimmed_and_deduplicated_in_order() {
        let p = payload(r#"{"url":"u","title":"t","tags":["rust"," web ","","rust","web","cli"]}"#);
        assert_eq!(p.validate().unwrap().tags, vec!["rust", "web", "cli"]);
    }

    #[test]
    fn test_null_optionals_fall_back_to_defaults() {
        let p = payload(r#"{"url":"u","title":"t","notes":null,"tags":null,"createdAt":""}"#);
        let b = p.validate().unwrap();
        assert_eq!(b.notes, "");
        assert!(b.tags.is_empty());
        assert_eq!(b.created_at, None);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let p = payload(r#"{"url":"u","title":"t","favicon":"data:","id":"local-1"}"#);
        assert!(p.validate().is_ok());
    }
}
