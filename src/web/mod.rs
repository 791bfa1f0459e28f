use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::{
    ai::ExplainErrorInput,
    environment::Environment,
    executor::{
        normalize_response, parse_variables, prepare_request, ExecutionResult, RequestBody,
        ResponseFraming,
    },
    introspection::{extract_schema, Schema, INTROSPECTION_QUERY},
    operation::{display_name, inspect, OperationKind},
};

#[derive(Debug, Error)]
pub enum WebProcessError {
    #[error("{0}")]
    Message(String),
}

pub type WebResult<T> = Result<T, WebProcessError>;

fn message(err: impl ToString) -> WebProcessError {
    WebProcessError::Message(err.to_string())
}

#[derive(Debug, Serialize)]
pub struct WebHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct WebRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<WebHeader>,
    pub body: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebOperation {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebResponse {
    pub status: u16,
    pub framing: ResponseFraming,
    pub has_errors: bool,
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<ExplainErrorInput>,
}

pub fn describe_operation(query: &str) -> WebOperation {
    let info = inspect(query);
    WebOperation {
        kind: info.kind,
        display_name: display_name(info.name.as_deref()).to_string(),
        name: info.name,
    }
}

/// Builds the POST an environment would send for `query`. Fails on an
/// unusable URL or invalid variables, before anything goes out.
pub fn build_request(
    environment: &Environment,
    query: &str,
    variables: Option<&str>,
) -> WebResult<WebRequest> {
    let prepared = prepare_request(environment).map_err(message)?;
    let variables = parse_variables(variables).map_err(message)?;
    let body = serde_json::to_string(&RequestBody { query, variables }).map_err(message)?;

    Ok(WebRequest {
        method: "POST".to_string(),
        url: prepared.url.to_string(),
        headers: prepared
            .headers
            .into_iter()
            .map(|(name, value)| WebHeader { name, value })
            .collect(),
        body,
    })
}

pub fn build_introspection_request(environment: &Environment) -> WebResult<WebRequest> {
    build_request(environment, INTROSPECTION_QUERY, None)
}

pub fn process_response(
    status: u16,
    body: &str,
    query: &str,
    duration_ms: f64,
) -> WebResult<WebResponse> {
    let result = to_result(status, body, duration_ms)?;
    Ok(WebResponse {
        status,
        framing: result.framing,
        has_errors: result.has_errors(),
        explain: ExplainErrorInput::from_result(&result, query),
        payload: result.payload,
    })
}

pub fn process_introspection_response(status: u16, body: &str) -> WebResult<Schema> {
    let result = to_result(status, body, 0.0)?;
    extract_schema(&result).map_err(message)
}

fn to_result(status: u16, body: &str, duration_ms: f64) -> WebResult<ExecutionResult> {
    let (payload, framing) = normalize_response(status, body).map_err(message)?;
    Ok(ExecutionResult {
        status,
        duration_ms,
        framing,
        payload,
    })
}
