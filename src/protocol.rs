use serde::{Deserialize, Deserializer, Serialize};

/// A missing or `null` query reads as empty, so it is rejected by the
/// gateway's blank check rather than by the JSON extractor.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub query: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of one query: exactly one of `{"answer": ..}` or `{"error": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GatewayResult {
    Answer { answer: String },
    Error { error: String },
}

impl GatewayResult {
    pub fn answer(answer: impl Into<String>) -> Self {
        Self::Answer {
            answer: answer.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    pub fn error_text(&self) -> Option<&str> {
        match self {
            Self::Error { error } => Some(error),
            Self::Answer { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Answer { answer } => answer,
            Self::Error { error } => error,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn answer_serializes_without_error_field() {
        let value = serde_json::to_value(GatewayResult::answer("On time")).unwrap();
        assert_eq!(value, json!({"answer": "On time"}));
    }

    #[test]
    fn error_serializes_without_answer_field() {
        let value = serde_json::to_value(GatewayResult::error("Please enter a query.")).unwrap();
        assert_eq!(value, json!({"error": "Please enter a query."}));
    }

    #[test]
    fn missing_or_null_query_reads_as_empty() {
        let missing: QueryRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.query, "");

        let null: QueryRequest = serde_json::from_str(r#"{"query":null}"#).unwrap();
        assert_eq!(null.query, "");

        assert!(serde_json::from_str::<QueryRequest>(r#"{"query":42}"#).is_err());
    }

    #[test]
    fn deserializes_either_shape() {
        let answer: GatewayResult = serde_json::from_str(r#"{"answer":"Platform 2"}"#).unwrap();
        assert_eq!(answer.message(), "Platform 2");
        assert!(!answer.is_error());
        assert_eq!(answer.error_text(), None);

        let error: GatewayResult = serde_json::from_str(r#"{"error":"nope"}"#).unwrap();
        assert!(error.is_error());
        assert_eq!(error.message(), "nope");
    }
}
