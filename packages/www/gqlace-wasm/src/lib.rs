use gqlace::{
    environment::Environment,
    web::{
        build_introspection_request as core_build_introspection_request,
        build_request as core_build_request, describe_operation as core_describe_operation,
        process_introspection_response as core_process_introspection_response,
        process_response as core_process_response, WebProcessError,
    },
};
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn describe_operation(query: &str) -> Result<JsValue, JsValue> {
    serialize(&core_describe_operation(query))
}

#[wasm_bindgen]
pub fn build_request(
    environment: JsValue,
    query: &str,
    variables: Option<String>,
) -> Result<JsValue, JsValue> {
    let environment = parse_environment(environment)?;
    convert_result(core_build_request(&environment, query, variables.as_deref()))
}

#[wasm_bindgen]
pub fn build_introspection_request(environment: JsValue) -> Result<JsValue, JsValue> {
    let environment = parse_environment(environment)?;
    convert_result(core_build_introspection_request(&environment))
}

#[wasm_bindgen]
pub fn process_response(
    status: u16,
    body: &str,
    query: &str,
    duration_ms: f64,
) -> Result<JsValue, JsValue> {
    convert_result(core_process_response(status, body, query, duration_ms))
}

#[wasm_bindgen]
pub fn process_introspection_response(status: u16, body: &str) -> Result<JsValue, JsValue> {
    convert_result(core_process_introspection_response(status, body))
}

fn parse_environment(value: JsValue) -> Result<Environment, JsValue> {
    from_value(value).map_err(|err| JsValue::from_str(&format!("Invalid environment: {err}")))
}

fn serialize<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|err| JsValue::from_str(&format!("Serialization error: {err}")))
}

fn convert_result<T: Serialize>(result: Result<T, WebProcessError>) -> Result<JsValue, JsValue> {
    match result {
        Ok(value) => serialize(&value),
        Err(err) => Err(JsValue::from_str(&err.to_string())),
    }
}
