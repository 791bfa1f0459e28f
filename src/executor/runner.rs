use std::time::Instant;

use reqwest::Client;
use tracing::Instrument;

use crate::{environment::Environment, operation::operation_name};

use super::{
    error::ExecutionError,
    headers::prepare_request,
    models::{ExecutionResult, RequestBody},
    normalize::{normalize_response, parse_variables},
};

#[derive(Debug, Clone, Default)]
pub struct Executor {
    client: Client,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn execute(
        &self,
        environment: &Environment,
        query: &str,
        variables: Option<&str>,
    ) -> Result<ExecutionResult, ExecutionError> {
        let span = tracing::debug_span!(
            "execute",
            env = %environment.id,
            operation = operation_name(query).as_deref().unwrap_or("anonymous"),
        );
        self.send(environment, query, variables)
            .instrument(span)
            .await
    }

    async fn send(
        &self,
        environment: &Environment,
        query: &str,
        variables: Option<&str>,
    ) -> Result<ExecutionResult, ExecutionError> {
        let variables = parse_variables(variables)?;
        let prepared = prepare_request(environment)?;

        let mut request_builder = self.client.post(prepared.url.clone());
        for (name, value) in &prepared.headers {
            request_builder = request_builder.header(name, value);
        }
        request_builder = request_builder.json(&RequestBody { query, variables });

        tracing::debug!(url = %prepared.url, "sending GraphQL request");
        let start = Instant::now();
        let response = request_builder.send().await.map_err(|err| {
            tracing::debug!(error = %err, "request failed");
            ExecutionError::from(err)
        })?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(status, bytes = body.len(), duration_ms, "received response");

        let (payload, framing) = normalize_response(status, &body)?;
        Ok(ExecutionResult {
            status,
            duration_ms,
            framing,
            payload,
        })
    }
}
