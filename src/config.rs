use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    environment::EnvironmentStore,
    storage::{FileStore, KeyValueStore},
};

pub const CONFIG_FILE_NAME: &str = "gqlace.json";
pub const DEFAULT_DATA_DIR: &str = ".gqlace";

fn resolve_relative(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GqlaceConfig {
    #[serde(rename = "dataDir")]
    pub data_dir: Option<String>,
    #[serde(rename = "defaultEnvironment")]
    pub default_environment: Option<String>,
    #[serde(flatten)]
    pub extras: HashMap<String, Value>,
}

impl GqlaceConfig {
    pub fn unknown_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.extras.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: GqlaceConfig,
    pub path: PathBuf,
    pub dir: PathBuf,
}

/// Loads `gqlace.json` from `target`, which is either the file itself or the
/// directory holding it. A missing file is not an error.
pub fn load_config(target: &Path) -> Result<Option<LoadedConfig>> {
    let resolved = if target.is_absolute() {
        target.to_path_buf()
    } else {
        std::env::current_dir()?.join(target)
    };

    let (file_path, dir) = if resolved.is_dir() {
        (resolved.join(CONFIG_FILE_NAME), resolved)
    } else {
        let dir = match resolved.parent() {
            Some(parent) => parent.to_path_buf(),
            None => std::env::current_dir()?,
        };
        (resolved.clone(), dir)
    };

    if !file_path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&file_path)
        .with_context(|| format!("reading config {}", file_path.display()))?;

    let config: GqlaceConfig = serde_json::from_str(&contents)
        .with_context(|| format!("parsing config {}", file_path.display()))?;

    for key in config.unknown_keys() {
        tracing::warn!(path = %file_path.display(), key, "ignoring unknown config key");
    }
    tracing::debug!(path = %file_path.display(), "loaded config");
    Ok(Some(LoadedConfig {
        config,
        path: file_path,
        dir,
    }))
}

#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    pub base_dir: PathBuf,
    pub config_path: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub default_environment: Option<String>,
}

impl WorkspaceContext {
    pub fn open_store(&self) -> Result<Arc<FileStore>> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("creating data directory {}", self.data_dir.display()))?;
        Ok(Arc::new(FileStore::new(self.data_dir.clone())))
    }

    pub fn apply_default_environment<S: KeyValueStore>(
        &self,
        store: &mut EnvironmentStore<S>,
    ) -> Result<bool> {
        if store.current().is_some() {
            return Ok(false);
        }
        let Some(name) = self.default_environment.as_deref() else {
            return Ok(false);
        };
        let Some(id) = store.find_by_name(name).map(|env| env.id.clone()) else {
            tracing::warn!(name, "default environment not found");
            return Ok(false);
        };
        store
            .select(Some(id.as_str()))
            .context("selecting default environment")?;
        Ok(true)
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceBuilder {
    base_dir: PathBuf,
    config: Option<LoadedConfig>,
    explicit_data_dir: Option<PathBuf>,
}

impl WorkspaceBuilder {
    pub fn new(
        base_dir: PathBuf,
        config: Option<LoadedConfig>,
        explicit_data_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            base_dir,
            config,
            explicit_data_dir,
        }
    }

    pub fn build(&self) -> WorkspaceContext {
        let data_dir = match (&self.explicit_data_dir, &self.config) {
            (Some(explicit), _) => resolve_relative(&self.base_dir, explicit),
            (None, Some(cfg)) => match &cfg.config.data_dir {
                Some(dir) => resolve_relative(&cfg.dir, Path::new(dir)),
                None => cfg.dir.join(DEFAULT_DATA_DIR),
            },
            (None, None) => self.base_dir.join(DEFAULT_DATA_DIR),
        };

        WorkspaceContext {
            base_dir: self.base_dir.clone(),
            config_path: self.config.as_ref().map(|cfg| cfg.path.clone()),
            data_dir,
            default_environment: self
                .config
                .as_ref()
                .and_then(|cfg| cfg.config.default_environment.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::EnvironmentProfile;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn returns_none_when_config_missing() -> Result<()> {
        let temp = tempdir()?;
        let result = load_config(temp.path())?;
        assert!(result.is_none());
        Ok(())
    }

    #[test]
    fn loads_config_from_directory() -> Result<()> {
        let temp = tempdir()?;
        let config_path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &config_path,
            r#"{"dataDir":"state","defaultEnvironment":"Staging","theme":"dark"}"#,
        )?;

        let result = load_config(temp.path())?.expect("config should load");
        assert_eq!(result.path, config_path);
        assert_eq!(result.dir, temp.path());
        assert_eq!(result.config.data_dir.as_deref(), Some("state"));
        assert_eq!(result.config.default_environment.as_deref(), Some("Staging"));
        assert_eq!(result.config.unknown_keys(), vec!["theme"]);
        Ok(())
    }

    #[test]
    fn invalid_config_reports_path() -> Result<()> {
        let temp = tempdir()?;
        let config_path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "{ nope")?;
        let err = load_config(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
        Ok(())
    }

    #[test]
    fn data_dir_resolution_order() -> Result<()> {
        let temp = tempdir()?;
        let base = temp.path().to_path_buf();

        let plain = WorkspaceBuilder::new(base.clone(), None, None).build();
        assert_eq!(plain.data_dir, base.join(DEFAULT_DATA_DIR));

        let config_dir = base.join("project");
        let loaded = LoadedConfig {
            config: GqlaceConfig {
                data_dir: Some("state".to_string()),
                ..GqlaceConfig::default()
            },
            path: config_dir.join(CONFIG_FILE_NAME),
            dir: config_dir.clone(),
        };
        let configured = WorkspaceBuilder::new(base.clone(), Some(loaded.clone()), None).build();
        assert_eq!(configured.data_dir, config_dir.join("state"));

        let explicit =
            WorkspaceBuilder::new(base.clone(), Some(loaded), Some(PathBuf::from("custom"))).build();
        assert_eq!(explicit.data_dir, base.join("custom"));
        Ok(())
    }

    #[test]
    fn default_environment_fills_empty_selection() -> Result<()> {
        let temp = tempdir()?;
        let context = WorkspaceContext {
            base_dir: temp.path().to_path_buf(),
            config_path: None,
            data_dir: temp.path().join(DEFAULT_DATA_DIR),
            default_environment: Some("staging".to_string()),
        };
        let storage = context.open_store()?;
        let mut store = EnvironmentStore::load(storage);
        let staging = store
            .create(EnvironmentProfile::new("Staging", "http://staging/graphql"))?
            .id
            .clone();
        store.select(None)?;

        assert!(context.apply_default_environment(&mut store)?);
        assert_eq!(store.current_id(), Some(staging.as_str()));
        assert!(!context.apply_default_environment(&mut store)?);
        Ok(())
    }
}
