//! Analysis request and report types
//!
//! The provider hands back free-form text that is supposed to be a JSON
//! object. [`AnalysisResponse`] only exists once that text has passed the
//! strict shape check in [`AnalysisResponse::from_json_str`]; there is no
//! partially populated report.

use crate::domain::target::DomainName;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const SUMMARY_FIELD: &str = "summary";
pub const ADJECTIVES_FIELD: &str = "adjectives";
pub const COMPETITORS_FIELD: &str = "competitors";

/// Body of `POST /api/analyze`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub domain: DomainName,
}

impl AnalysisRequest {
    pub fn new(domain: DomainName) -> Self {
        Self { domain }
    }
}

/// Reasons a provider reply is not a usable report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseShapeError {
    #[error("response is not valid JSON: {0}")]
    NotJson(String),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("field `{field}` has an empty entry at index {index}")]
    EmptyItem { field: &'static str, index: usize },
}

/// Brand perception report for one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct AnalysisResponse {
    summary: String,
    adjectives: Vec<String>,
    competitors: Vec<String>,
}

impl AnalysisResponse {
    /// Build a report, enforcing that every part is present and non-empty.
    pub fn try_new(
        summary: impl Into<String>,
        adjectives: Vec<String>,
        competitors: Vec<String>,
    ) -> Result<Self, ResponseShapeError> {
        let summary = summary.into();
        if summary.trim().is_empty() {
            return Err(ResponseShapeError::EmptyField(SUMMARY_FIELD));
        }
        check_entries(ADJECTIVES_FIELD, &adjectives)?;
        check_entries(COMPETITORS_FIELD, &competitors)?;

        Ok(Self {
            summary,
            adjectives,
            competitors,
        })
    }

    /// Parse and validate raw provider output.
    pub fn from_json_str(text: &str) -> Result<Self, ResponseShapeError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ResponseShapeError::NotJson(e.to_string()))?;
        Self::try_from(value)
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn adjectives(&self) -> &[String] {
        &self.adjectives
    }

    pub fn competitors(&self) -> &[String] {
        &self.competitors
    }
}

impl TryFrom<Value> for AnalysisResponse {
    type Error = ResponseShapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(object) = value else {
            return Err(ResponseShapeError::NotAnObject);
        };

        let summary = match object.get(SUMMARY_FIELD) {
            None | Some(Value::Null) => return Err(ResponseShapeError::MissingField(SUMMARY_FIELD)),
            Some(Value::String(text)) => text.clone(),
            Some(_) => {
                return Err(ResponseShapeError::WrongType {
                    field: SUMMARY_FIELD,
                    expected: "a string",
                })
            }
        };
        let adjectives = string_list(&object, ADJECTIVES_FIELD)?;
        let competitors = string_list(&object, COMPETITORS_FIELD)?;

        Self::try_new(summary, adjectives, competitors)
    }
}

fn string_list(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Vec<String>, ResponseShapeError> {
    let items = match object.get(field) {
        None | Some(Value::Null) => return Err(ResponseShapeError::MissingField(field)),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ResponseShapeError::WrongType {
                field,
                expected: "an array of strings",
            })
        }
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(text) => Ok(text.clone()),
            _ => Err(ResponseShapeError::WrongType {
                field,
                expected: "an array of strings",
            }),
        })
        .collect()
}

fn check_entries(field: &'static str, entries: &[String]) -> Result<(), ResponseShapeError> {
    if entries.is_empty() {
        return Err(ResponseShapeError::EmptyField(field));
    }
    match entries.iter().position(|entry| entry.trim().is_empty()) {
        Some(index) => Err(ResponseShapeError::EmptyItem { field, index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_formed_reply_is_accepted_unchanged() {
        let text = r#"{"summary":"A trusted name.","adjectives":["a","b"],"competitors":["c.com"]}"#;
        let report = AnalysisResponse::from_json_str(text).unwrap();

        assert_eq!(report.summary(), "A trusted name.");
        assert_eq!(report.adjectives(), ["a", "b"]);
        assert_eq!(report.competitors(), ["c.com"]);
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"summary": "A trusted name.", "adjectives": ["a", "b"], "competitors": ["c.com"]})
        );
    }

    #[test]
    fn test_extra_fields_are_dropped() {
        let report = AnalysisResponse::try_from(json!({
            "summary": "s",
            "adjectives": ["bold"],
            "competitors": ["rival.io"],
            "confidence": 0.9
        }))
        .unwrap();

        let serialized = serde_json::to_value(&report).unwrap();
        assert!(serialized.get("confidence").is_none());
    }

    #[test]
    fn test_missing_adjectives_is_rejected() {
        let result = AnalysisResponse::from_json_str(r#"{"summary":"s","competitors":["c.com"]}"#);
        assert_eq!(
            result,
            Err(ResponseShapeError::MissingField(ADJECTIVES_FIELD))
        );
    }

    #[test]
    fn test_non_json_is_rejected() {
        let result = AnalysisResponse::from_json_str("Sure! Here is your analysis:");
        assert!(matches!(result, Err(ResponseShapeError::NotJson(_))));
    }

    #[test]
    fn test_array_root_is_rejected() {
        let result = AnalysisResponse::from_json_str("[1, 2, 3]");
        assert_eq!(result, Err(ResponseShapeError::NotAnObject));
    }

    #[test]
    fn test_wrong_container_type_is_rejected() {
        let result = AnalysisResponse::try_from(json!({
            "summary": "s",
            "adjectives": "bold, modern",
            "competitors": ["c.com"]
        }));
        assert_eq!(
            result,
            Err(ResponseShapeError::WrongType {
                field: ADJECTIVES_FIELD,
                expected: "an array of strings"
            })
        );
    }

    #[test]
    fn test_non_string_entries_are_rejected() {
        let result = AnalysisResponse::try_from(json!({
            "summary": "s",
            "adjectives": ["bold"],
            "competitors": [42]
        }));
        assert!(matches!(
            result,
            Err(ResponseShapeError::WrongType {
                field: COMPETITORS_FIELD,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_lists_and_entries_are_rejected() {
        assert_eq!(
            AnalysisResponse::try_new("s", vec![], vec!["c.com".into()]),
            Err(ResponseShapeError::EmptyField(ADJECTIVES_FIELD))
        );
        assert_eq!(
            AnalysisResponse::try_new("s", vec!["bold".into()], vec!["c.com".into(), " ".into()]),
            Err(ResponseShapeError::EmptyItem {
                field: COMPETITORS_FIELD,
                index: 1
            })
        );
        assert_eq!(
            AnalysisResponse::try_new("", vec!["bold".into()], vec!["c.com".into()]),
            Err(ResponseShapeError::EmptyField(SUMMARY_FIELD))
        );
    }

    #[test]
    fn test_deserialize_enforces_shape() {
        let result: Result<AnalysisResponse, _> =
            serde_json::from_str(r#"{"summary":"s","adjectives":[],"competitors":["c.com"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_analysis_request_serializes_domain_as_string() {
        let domain = DomainName::try_new("example.com".to_string()).unwrap();
        let body = serde_json::to_value(AnalysisRequest::new(domain)).unwrap();
        assert_eq!(body, json!({"domain": "example.com"}));
    }
}
