use serde_json::{json, Value};

use super::{error::ExecutionError, models::ResponseFraming};

pub fn parse_variables(variables: Option<&str>) -> Result<Option<Value>, ExecutionError> {
    match variables {
        Some(text) if !text.trim().is_empty() => serde_json::from_str(text)
            .map(Some)
            .map_err(|err| ExecutionError::VariablesParse(err.to_string())),
        _ => Ok(None),
    }
}

/// Interprets a response body independently of its HTTP framing.
///
/// JSON bodies come back untouched whatever the status, because GraphQL
/// servers report errors inside 200 responses and sometimes send JSON with
/// 4xx/5xx. Non-JSON bodies fail only on non-2xx statuses; a 2xx text body
/// is wrapped as `{"data": <text>}`.
pub fn normalize_response(
    status: u16,
    body: &str,
) -> Result<(Value, ResponseFraming), ExecutionError> {
    match serde_json::from_str::<Value>(body) {
        Ok(payload) => Ok((payload, ResponseFraming::Json)),
        Err(_) if !is_success(status) => Err(ExecutionError::HttpStatus {
            status,
            body: body.to_string(),
        }),
        Err(_) => Ok((json!({ "data": body }), ResponseFraming::Text)),
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
