// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error as TeError;

use crate::i18n_file::gettext::DuplicateStyle;

const CONFIG_FILE_NAME: &str = "config.yaml";
const STATS_DB_DIR_NAME: &str = "stats.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory of the persistent statistics database.
    pub stats_db_path: PathBuf,
    pub front_cache: FrontCacheConfig,
    pub checks: CheckerConfig,
    /// Used by `dedup` when no style is given.
    pub duplicate_style: DuplicateStyle,
    /// Written to `Last-Translator` when editing units.
    pub translator: Option<Translator>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            stats_db_path: default_stats_db_path(),
            front_cache: FrontCacheConfig::default(),
            checks: CheckerConfig::default(),
            duplicate_style: DuplicateStyle::default(),
            translator: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontCacheConfig {
    pub capacity: usize,
    /// When full, `capacity / cull_frequency` entries are evicted at once.
    pub cull_frequency: usize,
}

impl Default for FrontCacheConfig {
    fn default() -> Self {
        FrontCacheConfig {
            capacity: 256,
            cull_frequency: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Only run these checks, all of them when unset.
    pub enabled: Option<Vec<String>>,
    pub disabled: Vec<String>,
}

impl CheckerConfig {
    pub fn is_enabled(&self, check_name: &str) -> bool {
        let picked = match &self.enabled {
            Some(enabled) => enabled.iter().any(|name| name == check_name),
            None => true,
        };
        picked && !self.disabled.iter().any(|name| name == check_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translator {
    pub name: String,
    pub email: Option<String>,
}

impl Translator {
    /// `Name <email>` as used in PO headers.
    pub fn header_value(&self) -> String {
        match &self.email {
            Some(email) => format!("{} <{}>", self.name, email),
            None => self.name.clone(),
        }
    }
}

#[derive(TeError, Debug)]
pub enum ConfigError {
    #[error("Config file {0:?} not found")]
    FileNotFound(PathBuf),
    #[error("Fail to read config file {0:?}: {1}")]
    ReadFile(PathBuf, #[source] std::io::Error),
    #[error("Fail to parse config file {0:?}: {1}")]
    Parse(PathBuf, #[source] serde_yml::Error),
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", env!("CARGO_PKG_NAME"))
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

pub fn default_stats_db_path() -> PathBuf {
    match project_dirs() {
        Some(dirs) => dirs.cache_dir().join(STATS_DB_DIR_NAME),
        None => PathBuf::from(concat!(".", env!("CARGO_PKG_NAME"))).join(STATS_DB_DIR_NAME),
    }
}

impl Config {
    pub fn from_yaml_str(content: &str, origin: &Path) -> Result<Config, ConfigError> {
        serde_yml::from_str::<Config>(content).map_err(|e| ConfigError::Parse(origin.to_path_buf(), e))
    }

    pub fn load_from_file(config_file: &Path) -> Result<Config, ConfigError> {
        if !config_file.is_file() {
            return Err(ConfigError::FileNotFound(config_file.to_path_buf()));
        }
        let content = fs::read_to_string(config_file).map_err(|e| ConfigError::ReadFile(config_file.to_path_buf(), e))?;
        Self::from_yaml_str(&content, config_file)
    }

    /// Load the given file, else the default config file if there is one,
    /// else the defaults.
    pub fn load(config_file: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(config_file) = config_file {
            return Self::load_from_file(config_file);
        }
        match default_config_path() {
            Some(default_file) if default_file.is_file() => Self::load_from_file(&default_file),
            _ => Ok(Config::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub const TEST_CONFIG_CONTENT: &str = r#"
stats_db_path: /tmp/postats-test.db
front_cache:
  capacity: 10
checks:
  disabled:
    - unchanged
duplicate_style: msgid_comment
translator:
  name: Jane Doe
  email: jane@example.com
"#;

    #[test]
    fn tst_parse_config() {
        let config = Config::from_yaml_str(TEST_CONFIG_CONTENT, Path::new("test.yaml")).unwrap();
        assert_eq!(config.stats_db_path, PathBuf::from("/tmp/postats-test.db"));
        assert_eq!(config.front_cache.capacity, 10);
        assert_eq!(config.front_cache.cull_frequency, 4);
        assert!(config.checks.is_enabled("variables"));
        assert!(!config.checks.is_enabled("unchanged"));
        assert_eq!(config.duplicate_style, DuplicateStyle::MsgidComment);
        assert_eq!(
            config.translator.unwrap().header_value(),
            "Jane Doe <jane@example.com>"
        );
    }

    #[test]
    fn tst_empty_config_uses_defaults() {
        let config = Config::from_yaml_str("{}", Path::new("empty.yaml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(Config::from_yaml_str("front_cache: [1, 2]", Path::new("bad.yaml")).is_err());
    }

    #[test]
    fn tst_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        assert!(matches!(Config::load(Some(&path)), Err(ConfigError::FileNotFound(_))));
        fs::write(&path, TEST_CONFIG_CONTENT).unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap().front_cache.capacity, 10);
    }
}
