use super::{schema::Schema, SchemaError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub environment_id: String,
}

#[derive(Debug)]
pub enum Commit {
    Applied,
    Failed(SchemaError),
    Stale,
}

#[derive(Debug, Default)]
pub struct SchemaState {
    next_seq: u64,
    latest: Option<FetchTicket>,
    schema: Option<Schema>,
}

impl SchemaState {
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.latest.is_some()
    }

    pub fn begin(&mut self, environment_id: &str) -> FetchTicket {
        self.next_seq += 1;
        let ticket = FetchTicket {
            seq: self.next_seq,
            environment_id: environment_id.to_string(),
        };
        self.schema = None;
        self.latest = Some(ticket.clone());
        ticket
    }

    pub fn clear(&mut self) {
        self.schema = None;
        self.latest = None;
    }

    /// Applies a finished fetch if `ticket` is still the latest one and was
    /// issued for the environment that is current now.
    pub fn commit(
        &mut self,
        ticket: &FetchTicket,
        current_environment: Option<&str>,
        outcome: Result<Schema, SchemaError>,
    ) -> Commit {
        let is_latest = self.latest.as_ref() == Some(ticket);
        let still_current = current_environment == Some(ticket.environment_id.as_str());
        if !is_latest || !still_current {
            tracing::debug!(seq = ticket.seq, env = %ticket.environment_id, "discarding stale schema fetch");
            return Commit::Stale;
        }

        self.latest = None;
        match outcome {
            Ok(schema) => {
                self.schema = Some(schema);
                Commit::Applied
            }
            Err(err) => {
                self.schema = None;
                Commit::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(root: &str) -> Schema {
        serde_json::from_value(serde_json::json!({
            "queryType": {"name": root},
            "types": []
        }))
        .unwrap()
    }

    #[test]
    fn begin_clears_displayed_schema() {
        let mut state = SchemaState::default();
        let ticket = state.begin("a");
        assert!(matches!(state.commit(&ticket, Some("a"), Ok(schema("Query"))), Commit::Applied));
        assert!(state.schema().is_some());

        state.begin("a");
        assert!(state.schema().is_none());
        assert!(state.is_loading());
    }

    #[test]
    fn only_latest_ticket_is_applied() {
        let mut state = SchemaState::default();
        let first = state.begin("a");
        let second = state.begin("a");

        assert!(matches!(state.commit(&second, Some("a"), Ok(schema("New"))), Commit::Applied));
        assert!(matches!(state.commit(&first, Some("a"), Ok(schema("Old"))), Commit::Stale));
        assert_eq!(
            state.schema().and_then(|s| s.query_type.as_ref()).map(|t| t.name.as_str()),
            Some("New")
        );
    }

    #[test]
    fn result_for_previous_environment_is_discarded() {
        let mut state = SchemaState::default();
        let ticket = state.begin("a");
        assert!(matches!(state.commit(&ticket, Some("b"), Ok(schema("Query"))), Commit::Stale));
        assert!(state.schema().is_none());
    }

    #[test]
    fn failure_leaves_schema_cleared() {
        let mut state = SchemaState::default();
        let ticket = state.begin("a");
        let commit = state.commit(&ticket, Some("a"), Err(SchemaError::MissingSchema));
        assert!(matches!(commit, Commit::Failed(SchemaError::MissingSchema)));
        assert!(state.schema().is_none());
        assert!(!state.is_loading());
    }

    #[test]
    fn clear_invalidates_in_flight_fetch() {
        let mut state = SchemaState::default();
        let ticket = state.begin("a");
        state.clear();
        assert!(matches!(state.commit(&ticket, Some("a"), Ok(schema("Query"))), Commit::Stale));
    }
}
