use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    executor::{first_error_json, ExecutionResult},
    operation::OperationKind,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainErrorInput {
    pub graphql_error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphql_query: Option<String>,
}

impl ExplainErrorInput {
    pub fn from_result(result: &ExecutionResult, query: &str) -> Option<Self> {
        Self::from_response(&result.payload, query)
    }

    pub fn from_response(response: &Value, query: &str) -> Option<Self> {
        let graphql_error = first_error_json(response)?;
        Some(Self {
            graphql_error,
            graphql_query: Some(query.to_string()).filter(|q| !q.trim().is_empty()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainErrorOutput {
    pub explanation: String,
    pub suggested_fix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratedOperationType {
    Query,
    Mutation,
}

impl TryFrom<OperationKind> for GeneratedOperationType {
    type Error = AiError;

    fn try_from(kind: OperationKind) -> Result<Self, Self::Error> {
        match kind {
            OperationKind::Query => Ok(GeneratedOperationType::Query),
            OperationKind::Mutation => Ok(GeneratedOperationType::Mutation),
            OperationKind::Subscription => Err(AiError::Unsupported(
                "subscriptions cannot be generated".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOperationInput {
    pub description: String,
    pub operation_type: GeneratedOperationType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOperationOutput {
    pub graphql_operation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeSchemaInput {
    pub schema: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeSchemaOutput {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    #[error("no text generator is configured")]
    NotConfigured,
    #[error("{0}")]
    Unsupported(String),
    #[error("text generation failed: {0}")]
    Failed(String),
}

pub trait TextGenerator {
    fn explain_error(
        &self,
        input: ExplainErrorInput,
    ) -> impl Future<Output = Result<ExplainErrorOutput, AiError>> + Send;

    fn generate_operation(
        &self,
        input: GenerateOperationInput,
    ) -> impl Future<Output = Result<GenerateOperationOutput, AiError>> + Send;

    fn summarize_schema(
        &self,
        input: SummarizeSchemaInput,
    ) -> impl Future<Output = Result<SummarizeSchemaOutput, AiError>> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl TextGenerator for Unconfigured {
    async fn explain_error(&self, _input: ExplainErrorInput) -> Result<ExplainErrorOutput, AiError> {
        Err(AiError::NotConfigured)
    }

    async fn generate_operation(
        &self,
        _input: GenerateOperationInput,
    ) -> Result<GenerateOperationOutput, AiError> {
        Err(AiError::NotConfigured)
    }

    async fn summarize_schema(
        &self,
        _input: SummarizeSchemaInput,
    ) -> Result<SummarizeSchemaOutput, AiError> {
        Err(AiError::NotConfigured)
    }
}
