use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::mpsc::Receiver,
};

use super::{KeyValueStore, StorageError, Subscribers};

#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    subscribers: Subscribers,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            subscribers: Subscribers::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        fs::write(self.path_for(key), value).map_err(io_err)?;
        tracing::trace!(key, dir = %self.dir.display(), "stored value");
        self.subscribers.notify(key);
        Ok(())
    }

    fn subscribe(&self) -> Receiver<String> {
        self.subscribers.subscribe()
    }
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => ch,
            _ => '-',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn get_returns_none_for_missing_file() -> Result<()> {
        let temp = tempdir()?;
        let store = FileStore::new(temp.path());
        assert_eq!(store.get("gql-history")?, None);
        Ok(())
    }

    #[test]
    fn set_creates_directory_and_file() -> Result<()> {
        let temp = tempdir()?;
        let data_dir = temp.path().join("nested").join(".gqlace");
        let store = FileStore::new(&data_dir);

        store.set("gql-settings", r#"{"autoFormat":true}"#.to_string())?;

        let written = fs::read_to_string(data_dir.join("gql-settings.json"))?;
        assert_eq!(written, r#"{"autoFormat":true}"#);
        assert_eq!(store.get("gql-settings")?.as_deref(), Some(r#"{"autoFormat":true}"#));
        Ok(())
    }

    #[test]
    fn sanitize_key_replaces_path_separators() {
        assert_eq!(sanitize_key("../escape"), "---escape");
        assert_eq!(sanitize_key("gql-current-env-id"), "gql-current-env-id");
    }
}
