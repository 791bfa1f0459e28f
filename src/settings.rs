use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::storage::{load_or_default, save, KeyValueStore, StorageError, SETTINGS_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Light, Theme::Dark, Theme::System];
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("light"),
            Theme::Dark => f.write_str("dark"),
            Theme::System => f.write_str("system"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(format!("unknown theme '{other}' (expected light, dark or system)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub auto_format: bool,
    pub theme: Theme,
}

impl Settings {
    pub fn load<S: KeyValueStore + ?Sized>(storage: &S) -> Self {
        load_or_default(storage, SETTINGS_KEY, Settings::default())
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, storage: &S) -> Result<(), StorageError> {
        save(storage, SETTINGS_KEY, self)
    }
}
