// src/report/result.rs
// =============================================================================
// The record we produce for every member.
//
// On disk a result looks like:
//   {"name": "alice", "url": "https://alice.example", "status": "Valid"}
//
// `status` is a plain string so the file stays readable by humans and by
// older tooling:
//   "Valid"            evidence found
//   "Invalid"          every reachable page checked, no evidence
//   "Error: <detail>"  liveness check failed or the crawl blew up
// =============================================================================

use crate::registry::MemberEntry;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Outcome of checking one member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Valid,
    Invalid,
    Error(String),
}

impl Status {
    pub fn is_valid(&self) -> bool {
        matches!(self, Status::Valid)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Valid => write!(f, "Valid"),
            Status::Invalid => write!(f, "Invalid"),
            Status::Error(detail) => write!(f, "Error: {}", detail),
        }
    }
}

// Parses the on-disk form back into a Status
//
// Older result files wrote "Invalid: Links not found" and bare exception
// text without the "Error: " prefix, both are accepted.
impl From<&str> for Status {
    fn from(raw: &str) -> Self {
        match raw {
            "Valid" => Status::Valid,
            "Invalid" => Status::Invalid,
            _ if raw.starts_with("Invalid:") => Status::Invalid,
            _ => match raw.strip_prefix("Error: ") {
                Some(detail) => Status::Error(detail.to_string()),
                None => Status::Error(raw.to_string()),
            },
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Status::from(raw.as_str()))
    }
}

/// One member's verdict. Created once per member and never changed.
///
/// Field order here is the key order in the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub name: String,
    pub url: String,
    pub status: Status,
    /// Page the evidence was found on, when it was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found_at: Option<String>,
}

impl CrawlResult {
    pub fn valid(member: &MemberEntry, found_at: String) -> Self {
        Self {
            name: member.name.clone(),
            url: member.url.clone(),
            status: Status::Valid,
            found_at: Some(found_at),
        }
    }

    pub fn invalid(member: &MemberEntry) -> Self {
        Self::with_status(member, Status::Invalid)
    }

    pub fn error(member: &MemberEntry, detail: impl Into<String>) -> Self {
        Self::with_status(member, Status::Error(detail.into()))
    }

    fn with_status(member: &MemberEntry, status: Status) -> Self {
        Self {
            name: member.name.clone(),
            url: member.url.clone(),
            status,
            found_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> MemberEntry {
        MemberEntry {
            name: "alice".to_string(),
            url: "https://alice.example".to_string(),
        }
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(Status::Valid.to_string(), "Valid");
        assert_eq!(Status::Invalid.to_string(), "Invalid");
        assert_eq!(Status::Error("404".to_string()).to_string(), "Error: 404");
    }

    #[test]
    fn test_legacy_status_strings() {
        assert_eq!(Status::from("Invalid: Links not found"), Status::Invalid);
        assert_eq!(
            Status::from("Message: Reached error page"),
            Status::Error("Message: Reached error page".to_string())
        );
    }

    #[test]
    fn test_error_result_shape() {
        let json = serde_json::to_string(&CrawlResult::error(&member(), "404")).unwrap();
        assert_eq!(
            json,
            r#"{"name":"alice","url":"https://alice.example","status":"Error: 404"}"#
        );
    }

    #[test]
    fn test_valid_result_records_page() {
        let result = CrawlResult::valid(&member(), "https://alice.example/links".to_string());
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.ends_with(r#""status":"Valid","found_at":"https://alice.example/links"}"#));

        let back: CrawlResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
