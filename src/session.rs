use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::{
    ai::{
        AiError, ExplainErrorInput, ExplainErrorOutput, GenerateOperationInput,
        GeneratedOperationType, SummarizeSchemaInput, TextGenerator,
    },
    environment::{Environment, EnvironmentProfile, EnvironmentStore, StoreError},
    executor::{ExecutionError, ExecutionResult, Executor},
    history::{History, HistoryItem},
    introspection::{fetch_schema, Commit, FetchTicket, Schema, SchemaError, SchemaState},
    settings::Settings,
    storage::{KeyValueStore, StorageError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug)]
pub enum SessionEvent {
    SchemaFetched {
        ticket: FetchTicket,
        outcome: Result<Schema, SchemaError>,
    },
}

pub struct Session<S> {
    environments: EnvironmentStore<S>,
    history: History<S>,
    settings: Settings,
    storage: S,
    executor: Executor,
    schema: SchemaState,
    query: String,
    variables: String,
    response: Option<Value>,
    explanation: Option<ExplainErrorOutput>,
    notices: Vec<Notice>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl<S: KeyValueStore + Clone> Session<S> {
    pub fn open(storage: S, executor: Executor) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            environments: EnvironmentStore::load(storage.clone()),
            history: History::load(storage.clone()),
            settings: Settings::load(&storage),
            storage,
            executor,
            schema: SchemaState::default(),
            query: String::new(),
            variables: String::new(),
            response: None,
            explanation: None,
            notices: Vec::new(),
            events_tx,
            events_rx,
        }
    }
}

impl<S: KeyValueStore> Session<S> {
    pub fn environments(&self) -> &EnvironmentStore<S> {
        &self.environments
    }

    pub fn current_environment(&self) -> Option<&Environment> {
        self.environments.current()
    }

    pub fn history(&self) -> &History<S> {
        &self.history
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.schema()
    }

    pub fn is_schema_loading(&self) -> bool {
        self.schema.is_loading()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn variables(&self) -> &str {
        &self.variables
    }

    pub fn response(&self) -> Option<&Value> {
        self.response.as_ref()
    }

    pub fn explanation(&self) -> Option<&ExplainErrorOutput> {
        self.explanation.as_ref()
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn set_variables(&mut self, variables: impl Into<String>) {
        self.variables = variables.into();
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn update_settings(&mut self, settings: Settings) -> Result<(), StorageError> {
        settings.save(&self.storage)?;
        self.settings = settings;
        Ok(())
    }

    pub fn clear_history(&mut self) -> Result<(), StorageError> {
        self.history.clear()?;
        self.notices
            .push(Notice::info("History cleared", "All saved runs were removed."));
        Ok(())
    }

    /// A failed run leaves `{"errors": [{"message": ..}]}` as the response.
    pub async fn run_query(&mut self) -> Result<ExecutionResult, ExecutionError> {
        let Some(environment) = self.environments.current().cloned() else {
            self.notices.push(Notice::error(
                "No Environment Selected",
                "Please select or configure an environment first.",
            ));
            return Err(ExecutionError::Configuration);
        };
        self.execute_in(environment).await
    }

    pub async fn run_query_in(
        &mut self,
        environment_id: &str,
    ) -> Result<ExecutionResult, ExecutionError> {
        let Some(environment) = self.environments.get(environment_id).cloned() else {
            self.notices.push(Notice::error(
                "Environment not found",
                format!("No environment with id {environment_id}."),
            ));
            return Err(ExecutionError::Configuration);
        };
        self.execute_in(environment).await
    }

    async fn execute_in(
        &mut self,
        environment: Environment,
    ) -> Result<ExecutionResult, ExecutionError> {
        self.response = None;
        self.explanation = None;

        let variables = Some(self.variables.as_str()).filter(|v| !v.trim().is_empty());
        match self
            .executor
            .execute(&environment, &self.query, variables)
            .await
        {
            Ok(result) => {
                self.response = Some(result.payload.clone());
                if let Err(err) = self
                    .history
                    .record(&environment.id, &self.query, variables, &result)
                {
                    tracing::warn!(error = %err, "could not save history");
                }
                Ok(result)
            }
            Err(err) => {
                let message = err.to_string();
                self.response = Some(json!({ "errors": [{ "message": message }] }));
                self.notices.push(Notice::error("Request Failed", message));
                Err(err)
            }
        }
    }

    pub async fn explain_error<G: TextGenerator>(
        &mut self,
        generator: &G,
    ) -> Option<&ExplainErrorOutput> {
        let input = ExplainErrorInput::from_response(self.response.as_ref()?, &self.query)?;
        self.explanation = None;
        match generator.explain_error(input).await {
            Ok(output) => {
                self.explanation = Some(output);
                self.explanation.as_ref()
            }
            Err(err) => {
                self.notices.push(Notice::error(
                    "AI Explanation Failed",
                    explanation_failure(&err),
                ));
                None
            }
        }
    }

    pub async fn generate_operation<G: TextGenerator>(
        &mut self,
        generator: &G,
        description: &str,
        operation_type: GeneratedOperationType,
    ) -> bool {
        if description.trim().is_empty() {
            self.notices.push(Notice::error(
                "Description is empty",
                "Describe the data the operation should fetch or change.",
            ));
            return false;
        }

        let input = GenerateOperationInput {
            description: description.trim().to_string(),
            operation_type,
        };
        match generator.generate_operation(input).await {
            Ok(output) => {
                self.query = output.graphql_operation;
                true
            }
            Err(err) => {
                self.notices
                    .push(Notice::error("AI Generation Failed", err.to_string()));
                false
            }
        }
    }

    pub async fn summarize_schema<G: TextGenerator>(&mut self, generator: &G) -> Option<String> {
        let schema = self.schema.schema()?.digest();
        match generator
            .summarize_schema(SummarizeSchemaInput { schema })
            .await
        {
            Ok(output) => Some(output.summary),
            Err(err) => {
                self.notices
                    .push(Notice::error("AI Summary Failed", err.to_string()));
                None
            }
        }
    }

    pub fn load_history(&mut self, id: &str) -> Result<Option<HistoryItem>, StoreError> {
        let Some(item) = self.history.get(id).cloned() else {
            return Ok(None);
        };
        self.query = item.query.clone();
        self.variables = item.variables.clone().unwrap_or_default();
        self.response = Some(item.response.clone());
        self.explanation = None;

        if self.environments.contains(&item.environment_id) {
            self.select_environment(Some(item.environment_id.as_str()))?;
        } else {
            self.notices.push(Notice::error(
                "Environment not found",
                "The environment for this history item no longer exists.",
            ));
        }
        Ok(Some(item))
    }

    pub fn create_environment(&mut self, profile: EnvironmentProfile) -> Result<String, StoreError> {
        let id = self.environments.create(profile)?.id.clone();
        self.selection_changed();
        Ok(id)
    }

    pub fn update_environment(
        &mut self,
        id: &str,
        profile: EnvironmentProfile,
    ) -> Result<bool, StoreError> {
        let updated = self.environments.update(id, profile)?;
        if updated && self.environments.current_id() == Some(id) {
            self.selection_changed();
        }
        Ok(updated)
    }

    pub fn delete_environment(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.environments.current_id().map(str::to_string);
        let deleted = self.environments.delete(id)?;
        if self.environments.current_id() != before.as_deref() {
            self.selection_changed();
        }
        Ok(deleted)
    }

    pub fn select_environment(&mut self, id: Option<&str>) -> Result<(), StoreError> {
        self.environments.select(id)?;
        self.selection_changed();
        Ok(())
    }

    pub fn refresh_schema(&mut self) -> Option<FetchTicket> {
        let Some(environment) = self.environments.current().cloned() else {
            self.schema.clear();
            return None;
        };

        let ticket = self.schema.begin(&environment.id);
        let executor = self.executor.clone();
        let tx = self.events_tx.clone();
        let event_ticket = ticket.clone();
        tokio::spawn(async move {
            let outcome = fetch_schema(&executor, &environment).await;
            let _ = tx.send(SessionEvent::SchemaFetched {
                ticket: event_ticket,
                outcome,
            });
        });
        Some(ticket)
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SchemaFetched { ticket, outcome } => {
                let current = self.environments.current_id().map(str::to_string);
                match self.schema.commit(&ticket, current.as_deref(), outcome) {
                    Commit::Applied => tracing::debug!(seq = ticket.seq, "schema loaded"),
                    Commit::Stale => {}
                    Commit::Failed(err) => {
                        tracing::warn!(error = %err, "introspection failed");
                        self.notices
                            .push(Notice::error("Schema Introspection Failed", err.to_string()));
                    }
                }
            }
        }
    }

    pub async fn settle(&mut self) {
        while self.schema.is_loading() {
            match self.events_rx.recv().await {
                Some(event) => self.apply(event),
                None => break,
            }
        }
    }

    fn selection_changed(&mut self) {
        self.refresh_schema();
    }
}

fn explanation_failure(err: &AiError) -> String {
    match err {
        AiError::NotConfigured => "Could not get explanation from AI.".to_string(),
        other => other.to_string(),
    }
}
