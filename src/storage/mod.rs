use std::sync::{
    mpsc::{channel, Receiver, Sender},
    Arc, Mutex, PoisonError,
};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[cfg(feature = "cli")]
mod file;
mod memory;

#[cfg(feature = "cli")]
pub use file::FileStore;
pub use memory::MemoryStore;

pub const ENVIRONMENTS_KEY: &str = "gql-environments";
pub const CURRENT_ENVIRONMENT_KEY: &str = "gql-current-env-id";
pub const HISTORY_KEY: &str = "gql-history";
pub const SETTINGS_KEY: &str = "gql-settings";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("serializing value for key {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Implementations synchronize internally; one store is shared by every component.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    fn subscribe(&self) -> Receiver<String>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn subscribe(&self) -> Receiver<String> {
        (**self).subscribe()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    senders: Mutex<Vec<Sender<String>>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&self) -> Receiver<String> {
        let (tx, rx) = channel();
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub(crate) fn notify(&self, key: &str) {
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(key.to_string()).is_ok());
    }
}

/// Reads and decodes `key`, falling back to `default` when the key is absent,
/// unreadable, or holds something that does not decode.
pub fn load_or_default<T, S>(store: &S, key: &str, default: T) -> T
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return default,
        Err(err) => {
            tracing::warn!(key, error = %err, "error reading stored value");
            return default;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding malformed stored value");
            default
        }
    }
}

pub fn save<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        count: u32,
    }

    #[test]
    fn load_or_default_returns_default_for_missing_key() {
        let store = MemoryStore::new();
        let value: Sample = load_or_default(&store, "missing", Sample { count: 7 });
        assert_eq!(value, Sample { count: 7 });
    }

    #[test]
    fn load_or_default_ignores_malformed_json() {
        let store = MemoryStore::new();
        store.set("sample", "{not json".to_string()).unwrap();
        let value: Sample = load_or_default(&store, "sample", Sample::default());
        assert_eq!(value, Sample::default());
    }

    #[test]
    fn save_then_load_uses_json_encoding() {
        let store = MemoryStore::new();
        save(&store, "sample", &Sample { count: 3 }).unwrap();
        assert_eq!(store.get("sample").unwrap().as_deref(), Some(r#"{"count":3}"#));

        let value: Sample = load_or_default(&store, "sample", Sample::default());
        assert_eq!(value.count, 3);
    }

    #[test]
    fn subscribers_receive_written_keys() {
        let store = Arc::new(MemoryStore::new());
        let rx = store.subscribe();
        save(&store, SETTINGS_KEY, &Sample::default()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), SETTINGS_KEY);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let subscribers = Subscribers::default();
        let rx = subscribers.subscribe();
        drop(rx);
        subscribers.notify("key");
        assert!(subscribers.senders.lock().unwrap().is_empty());
    }
}
