//! # Database configuration
//!
//! Which database files make up the corpus, which element tables and citation
//! keys go with them, and the default state point of logK queries. Stored as
//! pretty JSON in `database_config.json`:
//! ```json
//! {
//!   "database_files": ["base.db", "local.txt"],
//!   "element_files": [],
//!   "reference_keys_file": null,
//!   "default_temperature_c": 25.0,
//!   "default_pressure_bar": 1.01325
//! }
//! ```
//! With no `element_files` the element tables next to the databases are used
//! (`base.db` -> `base.elb`, `local.txt` -> `local.elt`).
use crate::Checker::consistency_checker::sibling_element_table;
use crate::Database::db_errors::DbError;
use crate::Database::elements::{ElementTable, is_binary_element_file};
use crate::Database::references::load_reference_keys;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "database_config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access the configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("file does not exist: {0}")]
    MissingFile(String),
    #[error("{0} is not in the database list")]
    NotConfigured(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// corpus in reading order
    pub database_files: Vec<String>,
    #[serde(default)]
    pub element_files: Vec<String>,
    #[serde(default)]
    pub reference_keys_file: Option<String>,
    pub default_temperature_c: f64,
    pub default_pressure_bar: f64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_files: Vec::new(),
            element_files: Vec::new(),
            reference_keys_file: None,
            default_temperature_c: 25.0,
            default_pressure_bar: 1.01325,
        }
    }
}

impl DatabaseConfig {
    /// Explicit element files merged in order, or the sibling tables of the
    /// databases when none are configured.
    pub fn load_element_table(&self) -> Result<Option<ElementTable>, DbError> {
        if self.element_files.is_empty() {
            return sibling_element_table(&self.database_files);
        }
        let mut table = ElementTable::new();
        for f in &self.element_files {
            let path = Path::new(f);
            if is_binary_element_file(path) {
                table.merge(&ElementTable::from_binary_file(path)?);
            } else {
                let content = fs::read_to_string(path).map_err(|e| DbError::io(f, e))?;
                table.apply_text(&content, f)?;
            }
        }
        Ok(Some(table))
    }

    pub fn load_references(&self) -> Result<Option<HashSet<String>>, DbError> {
        self.reference_keys_file
            .as_deref()
            .map(|f| load_reference_keys(Path::new(f)))
            .transpose()
    }
}

/// Owns the configuration and the file it is persisted to.
#[derive(Debug, Clone)]
pub struct DatabaseConfigManager {
    config: DatabaseConfig,
    config_file: String,
}

impl DatabaseConfigManager {
    /// Loads `database_config.json` from the working directory; defaults when
    /// the file is missing or unreadable.
    pub fn new() -> Self {
        Self::with_config_file(DEFAULT_CONFIG_FILE)
    }

    pub fn with_config_file(config_file: &str) -> Self {
        let config = match Self::load_config(config_file) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}: {}, using defaults", config_file, e);
                DatabaseConfig::default()
            }
        };
        Self {
            config,
            config_file: config_file.to_string(),
        }
    }

    fn load_config(config_file: &str) -> Result<DatabaseConfig, ConfigError> {
        if !Path::new(config_file).exists() {
            return Ok(DatabaseConfig::default());
        }
        let content = fs::read_to_string(config_file)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_config(&self) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(&self.config)?;
        fs::write(&self.config_file, content)?;
        info!("configuration saved to {}", self.config_file);
        Ok(())
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    fn require_existing(path: &str) -> Result<(), ConfigError> {
        if Path::new(path).exists() {
            Ok(())
        } else {
            Err(ConfigError::MissingFile(path.to_string()))
        }
    }

    /// Replaces the corpus; all files must exist, otherwise nothing changes.
    pub fn set_database_files(&mut self, files: &[&str]) -> Result<(), ConfigError> {
        for f in files {
            Self::require_existing(f)?;
        }
        self.config.database_files = files.iter().map(|f| f.to_string()).collect();
        self.save_config()
    }

    /// appends a file at the end of the reading order
    pub fn add_database_file(&mut self, file: &str) -> Result<(), ConfigError> {
        Self::require_existing(file)?;
        if !self.config.database_files.iter().any(|f| f == file) {
            self.config.database_files.push(file.to_string());
        }
        self.save_config()
    }

    pub fn remove_database_file(&mut self, file: &str) -> Result<(), ConfigError> {
        let before = self.config.database_files.len();
        self.config.database_files.retain(|f| f != file);
        if self.config.database_files.len() == before {
            return Err(ConfigError::NotConfigured(file.to_string()));
        }
        self.save_config()
    }

    pub fn set_element_files(&mut self, files: &[&str]) -> Result<(), ConfigError> {
        for f in files {
            Self::require_existing(f)?;
        }
        self.config.element_files = files.iter().map(|f| f.to_string()).collect();
        self.save_config()
    }

    pub fn set_reference_keys_file(&mut self, file: Option<&str>) -> Result<(), ConfigError> {
        if let Some(f) = file {
            Self::require_existing(f)?;
        }
        self.config.reference_keys_file = file.map(String::from);
        self.save_config()
    }

    pub fn set_default_state(&mut self, t_c: f64, p_bar: f64) -> Result<(), ConfigError> {
        self.config.default_temperature_c = t_c;
        self.config.default_pressure_bar = p_bar;
        self.save_config()
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), ConfigError> {
        self.config = DatabaseConfig::default();
        self.save_config()
    }
}

impl Default for DatabaseConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn test_missing_config_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let manager = DatabaseConfigManager::with_config_file(path.to_str().unwrap());
        assert_eq!(manager.config(), &DatabaseConfig::default());
        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_config_gives_defaults() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"{ not json").unwrap();
        let manager = DatabaseConfigManager::with_config_file(f.path().to_str().unwrap());
        assert_eq!(manager.config().default_temperature_c, 25.0);
    }

    #[test]
    fn test_edit_and_reload() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let config_file = config_path.to_str().unwrap();
        let db1 = dir.path().join("a.txt");
        let db2 = dir.path().join("b.db");
        fs::write(&db1, "").unwrap();
        fs::write(&db2, "").unwrap();
        let (db1, db2) = (db1.to_str().unwrap(), db2.to_str().unwrap());

        let mut manager = DatabaseConfigManager::with_config_file(config_file);
        manager.set_database_files(&[db1]).unwrap();
        manager.add_database_file(db2).unwrap();
        manager.add_database_file(db2).unwrap();
        manager.set_default_state(100.0, 10.0).unwrap();

        let reloaded = DatabaseConfigManager::with_config_file(config_file);
        assert_eq!(reloaded.config().database_files, vec![db1, db2]);
        assert_eq!(reloaded.config().default_pressure_bar, 10.0);

        manager.remove_database_file(db1).unwrap();
        assert!(matches!(
            manager.remove_database_file(db1),
            Err(ConfigError::NotConfigured(_))
        ));
        manager.reset_to_defaults().unwrap();
        let reloaded = DatabaseConfigManager::with_config_file(config_file);
        assert!(reloaded.config().database_files.is_empty());
    }

    #[test]
    fn test_missing_database_is_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let mut manager = DatabaseConfigManager::with_config_file(config_path.to_str().unwrap());
        let result = manager.set_database_files(&["/definitely/not/here.db"]);
        assert!(matches!(result, Err(ConfigError::MissingFile(_))));
        assert!(manager.config().database_files.is_empty());
    }

    #[test]
    fn test_element_tables_from_config() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("base.txt");
        fs::write(&db, "").unwrap();
        fs::write(dir.path().join("base.elt"), "Fe;2;Fe+2;;Fe+3;\n").unwrap();
        let extra = dir.path().join("extra.elt");
        fs::write(&extra, "Fe;1;@Fe+3;\nCa;1;Ca+2;\n").unwrap();

        let mut config = DatabaseConfig {
            database_files: vec![db.to_str().unwrap().to_string()],
            ..Default::default()
        };
        let siblings = config.load_element_table().unwrap().unwrap();
        assert_eq!(siblings.known_reactants().len(), 2);

        config.element_files = vec![
            dir.path().join("base.elt").to_str().unwrap().to_string(),
            extra.to_str().unwrap().to_string(),
        ];
        let explicit = config.load_element_table().unwrap().unwrap();
        assert!(explicit.is_known("Ca+2"));
        assert!(!explicit.is_known("Fe+3"));
        assert!(config.load_references().unwrap().is_none());
    }
}
