//! Runtime settings, layered from defaults, an optional config file and
//! `LABELCOMMIT_*` environment variables (nested keys use `__`, e.g.
//! `LABELCOMMIT_DATABASE__PATH`).

use std::env;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::label::{ProjectId, UserId};
use crate::persist::PersistenceMode;

pub const DEFAULT_CONFIG_FILE: &str = "labelcommit";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
    pub project: ProjectSettings,
    pub user: UserSettings,
    pub log_filter: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    // no path means an in-memory database
    pub path: Option<String>,
}
impl DatabaseSettings {
    pub fn mode(&self) -> PersistenceMode {
        match &self.path {
            Some(path) => PersistenceMode::File(path.clone()),
            None => PersistenceMode::InMemory,
        }
    }
}

/// The project a batch is imported into, and the settings its cleaners read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectSettings {
    pub id: ProjectId,
    #[serde(default)]
    pub allow_overlapping: bool,
    #[serde(default)]
    pub single_class_classification: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserSettings {
    pub id: UserId,
}

impl Settings {
    /// Reads the file named by `LABELCOMMIT_CONFIG`, or `labelcommit.*` in
    /// the working directory. A missing file is not an error.
    pub fn load() -> Result<Self> {
        let file = env::var("LABELCOMMIT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_file(&file)
    }
    pub fn from_file(file: &str) -> Result<Self> {
        let settings = Config::builder()
            .set_default("log_filter", "info")?
            .set_default("project.id", 1)?
            .set_default("user.id", 1)?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("LABELCOMMIT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
