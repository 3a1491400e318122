use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Category label to open straight into, e.g. "Lei TVDE".
    pub default_category: Option<String>,
    /// Ask before throwing away a half-done session.
    pub confirm_restart: bool,
    /// Show the explanation box after each answer.
    pub show_explanations: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_category: None,
            confirm_restart: true,
            show_explanations: true,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("tvde_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    /// Loads the config, writing the defaults out on first run so there is a
    /// file to edit. A failed write is logged and the defaults still apply.
    pub fn load_or_create(&self) -> Config {
        if self.path.exists() {
            return self.load();
        }

        let cfg = Config::default();
        match self.save(&cfg) {
            Ok(()) => tracing::info!(path = %self.path.display(), "wrote default config"),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "could not write default config")
            }
        }
        cfg
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            default_category: Some("Lei TVDE".into()),
            confirm_restart: false,
            show_explanations: false,
        };
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"[1, 2").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn first_run_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tvde-quiz").join("config.json");
        let store = FileConfigStore::with_path(&path);

        assert_eq!(store.load_or_create(), Config::default());
        assert!(path.exists());
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"show_explanations": false}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load_or_create();
        assert!(!cfg.show_explanations);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            r#"{"show_explanations": false}"#
        );
    }

    #[test]
    fn unwritable_location_still_gives_defaults() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();

        let store = FileConfigStore::with_path(blocker.join("config.json"));
        assert_eq!(store.load_or_create(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"confirm_restart": false}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert!(!cfg.confirm_restart);
        assert!(cfg.show_explanations);
        assert_eq!(cfg.default_category, None);
    }
}
