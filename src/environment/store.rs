use thiserror::Error;
use uuid::Uuid;

use crate::storage::{
    load_or_default, save, KeyValueStore, StorageError, CURRENT_ENVIRONMENT_KEY,
    ENVIRONMENTS_KEY,
};

use super::model::{Environment, EnvironmentProfile};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("environment name must not be empty")]
    MissingName,
    #[error("environment URL must not be empty")]
    MissingUrl,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug)]
pub struct EnvironmentStore<S> {
    storage: S,
    environments: Vec<Environment>,
    current_id: Option<String>,
}

impl<S: KeyValueStore> EnvironmentStore<S> {
    pub fn load(storage: S) -> Self {
        let environments = load_or_default(&storage, ENVIRONMENTS_KEY, Vec::new());
        let current_id = load_or_default(&storage, CURRENT_ENVIRONMENT_KEY, None);
        Self {
            storage,
            environments,
            current_id,
        }
    }

    pub fn list(&self) -> &[Environment] {
        &self.environments
    }

    pub fn get(&self, id: &str) -> Option<&Environment> {
        self.environments.iter().find(|env| env.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Environment> {
        self.environments
            .iter()
            .find(|env| env.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn current(&self) -> Option<&Environment> {
        self.current_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn create(&mut self, profile: EnvironmentProfile) -> Result<&Environment, StoreError> {
        validate(&profile)?;
        let environment = Environment {
            id: Uuid::new_v4().to_string(),
            name: profile.name,
            url: profile.url,
            auth: profile.auth,
        };
        let id = environment.id.clone();
        tracing::debug!(id = %id, name = %environment.name, "creating environment");
        self.environments.push(environment);
        self.persist_environments()?;
        self.select(Some(id.as_str()))?;

        let index = self.environments.len() - 1;
        Ok(&self.environments[index])
    }

    pub fn update(&mut self, id: &str, profile: EnvironmentProfile) -> Result<bool, StoreError> {
        validate(&profile)?;
        let Some(existing) = self.environments.iter_mut().find(|env| env.id == id) else {
            return Ok(false);
        };
        existing.name = profile.name;
        existing.url = profile.url;
        existing.auth = profile.auth;
        tracing::debug!(id, "updated environment");
        self.persist_environments()?;
        Ok(true)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.environments.len();
        self.environments.retain(|env| env.id != id);
        if self.environments.len() == before {
            return Ok(false);
        }
        tracing::debug!(id, "deleted environment");
        self.persist_environments()?;

        if self.current_id.as_deref() == Some(id) {
            let fallback = self.environments.first().map(|env| env.id.clone());
            self.select(fallback.as_deref())?;
        }
        Ok(true)
    }

    pub fn select(&mut self, id: Option<&str>) -> Result<(), StoreError> {
        self.current_id = id.map(str::to_string);
        save(&self.storage, CURRENT_ENVIRONMENT_KEY, &self.current_id)?;
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist_environments(&self) -> Result<(), StoreError> {
        save(&self.storage, ENVIRONMENTS_KEY, &self.environments)?;
        Ok(())
    }
}

fn validate(profile: &EnvironmentProfile) -> Result<(), StoreError> {
    if profile.name.trim().is_empty() {
        return Err(StoreError::MissingName);
    }
    if profile.url.trim().is_empty() {
        return Err(StoreError::MissingUrl);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Auth;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn store() -> EnvironmentStore<Arc<MemoryStore>> {
        EnvironmentStore::load(Arc::new(MemoryStore::new()))
    }

    fn profile(name: &str) -> EnvironmentProfile {
        EnvironmentProfile::new(name, format!("https://{name}.example.com/graphql"))
    }

    #[test]
    fn create_assigns_unique_ids_and_selects() {
        let mut store = store();
        let first = store.create(profile("alpha")).unwrap().id.clone();
        let second = store.create(profile("beta")).unwrap().id.clone();

        assert_ne!(first, second);
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.current_id(), Some(second.as_str()));
    }

    #[test]
    fn create_rejects_blank_name_or_url() {
        let mut store = store();
        assert!(matches!(
            store.create(EnvironmentProfile::new(" ", "https://x")),
            Err(StoreError::MissingName)
        ));
        assert!(matches!(
            store.create(EnvironmentProfile::new("x", "")),
            Err(StoreError::MissingUrl)
        ));
        assert!(store.list().is_empty());
    }

    #[test]
    fn update_replaces_in_place_and_ignores_unknown_ids() {
        let mut store = store();
        store.create(profile("alpha")).unwrap();
        let id = store.create(profile("beta")).unwrap().id.clone();

        let edited = profile("beta-2").with_auth(Auth::bearer("t"));
        assert!(store.update(&id, edited.clone()).unwrap());
        assert_eq!(store.list()[1].profile(), edited);
        assert_eq!(store.list()[1].id, id);

        assert!(!store.update("missing", profile("gamma")).unwrap());
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn deleting_selected_environment_falls_back_to_first_remaining() {
        let mut store = store();
        let a = store.create(profile("a")).unwrap().id.clone();
        store.create(profile("b")).unwrap();
        let c = store.create(profile("c")).unwrap().id.clone();

        assert!(store.delete(&c).unwrap());
        assert_eq!(store.current_id(), Some(a.as_str()));
    }

    #[test]
    fn deleting_last_environment_clears_selection() {
        let mut store = store();
        let only = store.create(profile("only")).unwrap().id.clone();

        assert!(store.delete(&only).unwrap());
        assert_eq!(store.current_id(), None);
        assert!(store.current().is_none());
    }

    #[test]
    fn deleting_unselected_environment_keeps_selection() {
        let mut store = store();
        let a = store.create(profile("a")).unwrap().id.clone();
        let b = store.create(profile("b")).unwrap().id.clone();

        assert!(store.delete(&a).unwrap());
        assert_eq!(store.current_id(), Some(b.as_str()));
        assert!(!store.delete("missing").unwrap());
    }

    #[test]
    fn dangling_selection_resolves_to_none() {
        let mut store = store();
        store.create(profile("a")).unwrap();
        store.select(Some("ghost")).unwrap();

        assert_eq!(store.current_id(), Some("ghost"));
        assert!(store.current().is_none());
    }

    #[test]
    fn state_survives_reload_from_same_storage() {
        let storage = Arc::new(MemoryStore::new());
        let id = {
            let mut store = EnvironmentStore::load(Arc::clone(&storage));
            store.create(profile("persisted")).unwrap().id.clone()
        };

        let reloaded = EnvironmentStore::load(storage);
        assert_eq!(reloaded.list().len(), 1);
        assert_eq!(reloaded.current().map(|env| env.id.as_str()), Some(id.as_str()));
        assert_eq!(reloaded.find_by_name("PERSISTED").map(|env| &env.id), Some(&id));
    }

    #[test]
    fn mutations_notify_storage_subscribers() {
        let storage = Arc::new(MemoryStore::new());
        let rx = storage.subscribe();
        let mut store = EnvironmentStore::load(Arc::clone(&storage));
        store.create(profile("a")).unwrap();

        let keys: Vec<String> = rx.try_iter().collect();
        assert_eq!(keys, vec![ENVIRONMENTS_KEY, CURRENT_ENVIRONMENT_KEY]);
    }
}
