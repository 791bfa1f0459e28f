use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct RequestBody<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseFraming {
    Json,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub status: u16,
    pub duration_ms: f64,
    pub framing: ResponseFraming,
    pub payload: Value,
}

impl ExecutionResult {
    pub fn data(&self) -> Option<&Value> {
        self.payload.get("data").filter(|data| !data.is_null())
    }

    pub fn has_errors(&self) -> bool {
        self.payload
            .get("errors")
            .map(|errors| !errors.is_null())
            .unwrap_or(false)
    }

    pub fn errors(&self) -> Vec<GraphQLError> {
        match self.payload.get("errors") {
            Some(Value::Array(items)) => items.iter().map(GraphQLError::from_value).collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![GraphQLError::from_value(other)],
        }
    }

    pub fn first_error_json(&self) -> Option<String> {
        first_error_json(&self.payload)
    }
}

pub fn first_error_json(payload: &Value) -> Option<String> {
    let first = match payload.get("errors")? {
        Value::Array(items) => items.first()?,
        Value::Null => return None,
        other => other,
    };
    serde_json::to_string_pretty(first).ok()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl GraphQLError {
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|_| Self {
            message: match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            },
            locations: Vec::new(),
            path: None,
            extensions: None,
            extra: serde_json::Map::new(),
        })
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(path) = &self.path {
            write!(f, " (at ")?;
            for (i, segment) in path.iter().enumerate() {
                if i > 0 {
                    write!(f, ".")?;
                }
                match segment {
                    PathSegment::Field(name) => write!(f, "{name}")?,
                    PathSegment::Index(idx) => write!(f, "[{idx}]")?,
                }
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Field(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn result(payload: Value) -> ExecutionResult {
        ExecutionResult {
            status: 200,
            duration_ms: 1.0,
            framing: ResponseFraming::Json,
            payload,
        }
    }

    #[test]
    fn request_body_omits_absent_variables() {
        let body = RequestBody {
            query: "{ a }",
            variables: None,
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"query": "{ a }"}));
    }

    #[test]
    fn data_only_payload_has_no_errors() {
        let r = result(json!({"data": {"x": 1}}));
        assert!(!r.has_errors());
        assert_eq!(r.data(), Some(&json!({"x": 1})));
        assert!(r.errors().is_empty());
    }

    #[test]
    fn partial_data_and_errors_are_both_visible() {
        let r = result(json!({
            "data": {"user": null},
            "errors": [{
                "message": "Permission denied",
                "locations": [{"line": 1, "column": 3}],
                "path": ["user", 0, "email"],
                "extensions": {"code": "FORBIDDEN"}
            }]
        }));

        assert!(r.has_errors());
        assert!(r.data().is_some());
        let errors = r.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "Permission denied (at user.[0].email)");
        assert_eq!(errors[0].extensions, Some(json!({"code": "FORBIDDEN"})));
    }

    #[test]
    fn empty_or_malformed_errors_still_count() {
        assert!(result(json!({"errors": []})).has_errors());
        assert!(!result(json!({"errors": null, "data": {}})).has_errors());

        let odd = result(json!({"errors": [{"code": 1}, "plain"]}));
        let errors = odd.errors();
        assert_eq!(errors[0].message, r#"{"code":1}"#);
        assert_eq!(errors[1].message, "plain");
    }

    #[test]
    fn first_error_json_keeps_original_members() {
        let r = result(json!({"errors": [{"message": "bad field", "code": "X"}]}));
        let text = r.first_error_json().unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({"message": "bad field", "code": "X"}));
        assert!(result(json!({"data": 1})).first_error_json().is_none());
    }
}
