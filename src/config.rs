//! Configuration loading and management
//!
//! Handles parsing of `.teamboard.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::storage::{Storage, StorageOptions};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = ".teamboard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the collection documents, relative to the working directory
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory receiving board exports
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Field limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            out_dir: default_out_dir(),
            storage: StorageConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("db")
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("out")
}

/// Storage-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// How long a writer waits for a collection lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Pretty-print collection documents
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            pretty: true,
        }
    }
}

/// Field length and batch limits enforced on requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Max chars for user, team and board names and task titles
    #[serde(default = "default_name_max")]
    pub name_max: usize,

    /// Max chars for team, board and task descriptions
    #[serde(default = "default_description_max")]
    pub description_max: usize,

    /// Max chars for a display name on user creation
    #[serde(default = "default_name_max")]
    pub display_name_max: usize,

    /// Max chars for a display name on user update
    #[serde(default = "default_description_max")]
    pub display_name_update_max: usize,

    /// Max entries in one add-users request
    #[serde(default = "default_max_users_per_add")]
    pub max_users_per_add: usize,
}

fn default_name_max() -> usize {
    64
}

fn default_description_max() -> usize {
    128
}

fn default_max_users_per_add() -> usize {
    50
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            name_max: default_name_max(),
            description_max: default_description_max(),
            display_name_max: default_name_max(),
            display_name_update_max: default_description_max(),
            max_users_per_add: default_max_users_per_add(),
        }
    }
}

impl LimitsConfig {
    fn validate(&self) -> crate::error::Result<()> {
        let fields = [
            ("limits.name_max", self.name_max),
            ("limits.description_max", self.description_max),
            ("limits.display_name_max", self.display_name_max),
            ("limits.display_name_update_max", self.display_name_update_max),
            ("limits.max_users_per_add", self.max_users_per_add),
        ];
        for (field, value) in fields {
            if value == 0 {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "{field} must be > 0"
                )));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a `.teamboard.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a working directory, or return defaults
    ///
    /// A present but invalid file is an error rather than a silent fallback.
    pub fn load_from_dir(dir: &Path) -> crate::error::Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Storage layout rooted at `dir`
    pub fn storage(&self, dir: &Path) -> Storage {
        Storage::new(
            dir.join(&self.data_dir),
            dir.join(&self.out_dir),
            StorageOptions {
                lock_timeout_ms: self.storage.lock_timeout_ms,
                pretty: self.storage.pretty,
            },
        )
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "data_dir cannot be empty".to_string(),
            ));
        }
        if self.out_dir.as_os_str().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "out_dir cannot be empty".to_string(),
            ));
        }
        if self.storage.lock_timeout_ms == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "storage.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        self.limits.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.data_dir, PathBuf::from("db"));
        assert_eq!(cfg.out_dir, PathBuf::from("out"));
        assert_eq!(cfg.storage.lock_timeout_ms, 5000);
        assert!(cfg.storage.pretty);
        assert_eq!(cfg.limits.name_max, 64);
        assert_eq!(cfg.limits.description_max, 128);
        assert_eq!(cfg.limits.display_name_max, 64);
        assert_eq!(cfg.limits.display_name_update_max, 128);
        assert_eq!(cfg.limits.max_users_per_add, 50);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
data_dir = "state"
out_dir = "exports"

[storage]
lock_timeout_ms = 250
pretty = false

[limits]
name_max = 32
max_users_per_add = 10
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.data_dir, PathBuf::from("state"));
        assert_eq!(cfg.out_dir, PathBuf::from("exports"));
        assert_eq!(cfg.storage.lock_timeout_ms, 250);
        assert!(!cfg.storage.pretty);
        assert_eq!(cfg.limits.name_max, 32);
        assert_eq!(cfg.limits.description_max, 128);
        assert_eq!(cfg.limits.max_users_per_add, 10);

        let storage = cfg.storage(dir.path());
        assert_eq!(storage.users_file(), dir.path().join("state/users.json"));
        assert_eq!(storage.out_dir(), dir.path().join("exports"));
    }

    #[test]
    fn zero_limits_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[limits]\nname_max = 0\n").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(message) => {
                assert!(message.contains("limits.name_max"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_lock_timeout_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[storage]\nlock_timeout_ms = 0\n").expect("write config");

        assert!(matches!(
            Config::load(&path),
            Err(crate::error::Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path()).expect("defaults");
        assert_eq!(cfg.data_dir, PathBuf::from("db"));
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        Config::default().save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("data_dir = \"db\""));

        let reloaded = Config::load(&path).expect("reload");
        assert_eq!(reloaded.limits, LimitsConfig::default());
    }
}
