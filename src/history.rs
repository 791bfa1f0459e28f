use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    executor::ExecutionResult,
    operation::{display_name, operation_name},
    storage::{load_or_default, save, KeyValueStore, StorageError, HISTORY_KEY},
};

pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<String>,
    pub response: Value,
    pub timestamp: i64,
    pub environment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl HistoryItem {
    pub fn new(
        environment_id: impl Into<String>,
        query: impl Into<String>,
        variables: Option<String>,
        response: Value,
    ) -> Self {
        let query = query.into();
        Self {
            id: Uuid::new_v4().to_string(),
            operation_name: operation_name(&query),
            query,
            variables: variables.filter(|text| !text.trim().is_empty()),
            response,
            timestamp: Utc::now().timestamp_millis(),
            environment_id: environment_id.into(),
        }
    }

    pub fn label(&self) -> &str {
        display_name(self.operation_name.as_deref())
    }

    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

#[derive(Debug)]
pub struct History<S> {
    storage: S,
    items: Vec<HistoryItem>,
}

impl<S: KeyValueStore> History<S> {
    pub fn load(storage: S) -> Self {
        let mut items: Vec<HistoryItem> = load_or_default(&storage, HISTORY_KEY, Vec::new());
        items.truncate(HISTORY_LIMIT);
        Self { storage, items }
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn record(
        &mut self,
        environment_id: &str,
        query: &str,
        variables: Option<&str>,
        result: &ExecutionResult,
    ) -> Result<Option<&HistoryItem>, StorageError> {
        if result.has_errors() {
            tracing::debug!("response has GraphQL errors; not recorded");
            return Ok(None);
        }
        let item = HistoryItem::new(
            environment_id,
            query,
            variables.map(str::to_string),
            result.payload.clone(),
        );
        self.push(item)?;
        Ok(self.items.first())
    }

    pub fn push(&mut self, item: HistoryItem) -> Result<(), StorageError> {
        self.items.insert(0, item);
        self.items.truncate(HISTORY_LIMIT);
        save(&self.storage, HISTORY_KEY, &self.items)
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.items.clear();
        save(&self.storage, HISTORY_KEY, &self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{executor::ResponseFraming, storage::MemoryStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn result(payload: Value) -> ExecutionResult {
        ExecutionResult {
            status: 200,
            duration_ms: 3.0,
            framing: ResponseFraming::Json,
            payload,
        }
    }

    #[test]
    fn keeps_fifty_most_recent_first() {
        let mut history = History::load(MemoryStore::new());
        for i in 0..51 {
            let query = format!("query Q{i} {{ a }}");
            history
                .record("env", &query, None, &result(json!({"data": {"a": i}})))
                .unwrap();
        }

        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.items()[0].operation_name.as_deref(), Some("Q50"));
        assert_eq!(history.items()[49].operation_name.as_deref(), Some("Q1"));
        assert!(history.items().iter().all(|item| item.operation_name.as_deref() != Some("Q0")));
    }

    #[test]
    fn responses_with_errors_are_not_recorded() {
        let mut history = History::load(MemoryStore::new());
        let written = history
            .record(
                "env",
                "{ a }",
                None,
                &result(json!({"errors": [{"message": "bad field"}]})),
            )
            .unwrap();
        assert!(written.is_none());
        assert!(history.is_empty());

        history
            .record("env", "{ a }", None, &result(json!({"data": null, "errors": []})))
            .unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn record_captures_run_details() {
        let mut history = History::load(MemoryStore::new());
        let item = history
            .record(
                "env-1",
                "query GetUser { user { id } }",
                Some(r#"{"id": 1}"#),
                &result(json!({"data": {"user": {"id": 1}}})),
            )
            .unwrap()
            .unwrap()
            .clone();

        assert_eq!(item.environment_id, "env-1");
        assert_eq!(item.label(), "GetUser");
        assert_eq!(item.variables.as_deref(), Some(r#"{"id": 1}"#));
        assert_eq!(item.response, json!({"data": {"user": {"id": 1}}}));
        assert!(item.recorded_at().is_some());
        assert_eq!(history.get(&item.id), Some(&item));
    }

    #[test]
    fn anonymous_runs_get_a_placeholder_label() {
        let item = HistoryItem::new("env", "{ a }", Some("  ".to_string()), json!({}));
        assert_eq!(item.label(), "Anonymous Operation");
        assert_eq!(item.variables, None);
    }

    #[test]
    fn persists_with_camel_case_keys_and_reloads() {
        let storage = Arc::new(MemoryStore::new());
        let mut history = History::load(Arc::clone(&storage));
        history
            .record("env", "query A { a }", None, &result(json!({"data": {}})))
            .unwrap();

        let raw: Value = serde_json::from_str(&storage.get(HISTORY_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(raw[0]["environmentId"], "env");
        assert_eq!(raw[0]["operationName"], "A");

        let reloaded = History::load(Arc::clone(&storage));
        assert_eq!(reloaded.items(), history.items());

        let mut reloaded = reloaded;
        reloaded.clear().unwrap();
        assert!(History::load(storage).is_empty());
    }
}
