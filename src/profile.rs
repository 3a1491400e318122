use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::app_dirs::AppDirs;
use crate::error::{ProfileError, StorageError};

/// Key under which the active profile is stored.
pub const PROFILE_KEY: &str = "tvde_pro_user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(rename = "isPremium")]
    pub is_premium: bool,
}

impl UserProfile {
    fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            is_premium: false,
        }
    }
}

/// Host-provided string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Stores each key as `<key>.json` inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Uses the platform data directory, falling back to the working
    /// directory when none can be resolved.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            dir: AppDirs::data_dir().unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store. Clones share the same contents, and it can be switched
/// off to behave like storage the host refuses to give access to.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Rc<RefCell<HashMap<String, String>>>,
    unavailable: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.unavailable.get() {
            Err(StorageError::Unavailable("memory store disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Result of a profile change.
#[derive(Debug)]
pub enum PersistOutcome {
    /// Applied in memory and written to the store.
    Succeeded,
    /// Applied in memory only; the store rejected the write.
    Degraded(StorageError),
    /// Nothing changed.
    Failed(ProfileError),
}

impl PersistOutcome {
    pub fn is_durable(&self) -> bool {
        matches!(self, PersistOutcome::Succeeded)
    }
}

/// Owns the single active [`UserProfile`] and mirrors it into a
/// [`KeyValueStore`].
///
/// Store failures are logged and never returned as errors; every store call
/// is attempted once.
#[derive(Debug)]
pub struct ProfileManager<S: KeyValueStore> {
    store: S,
    profile: Option<UserProfile>,
    loading: bool,
}

impl<S: KeyValueStore> ProfileManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            profile: None,
            loading: true,
        }
    }

    /// True until the first [`ProfileManager::load`] completes.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the persisted profile. Missing, unreadable or malformed data all
    /// mean "no profile".
    pub fn load(&mut self) -> Option<&UserProfile> {
        self.profile = match self.read() {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "could not load stored profile");
                None
            }
        };
        self.loading = false;
        self.profile.as_ref()
    }

    pub fn login(&mut self, name: &str) -> PersistOutcome {
        let name = name.trim();
        if name.is_empty() {
            return PersistOutcome::Failed(ProfileError::EmptyName);
        }

        let profile = UserProfile::new(name);
        info!(id = %profile.id, "logged in");
        let outcome = self.write(&profile);
        self.profile = Some(profile);
        outcome
    }

    pub fn logout(&mut self) -> PersistOutcome {
        if let Some(profile) = self.profile.take() {
            info!(id = %profile.id, "logged out");
        }
        match self.store.remove(PROFILE_KEY) {
            Ok(()) => PersistOutcome::Succeeded,
            Err(e) => {
                warn!(error = %e, "could not remove stored profile");
                PersistOutcome::Degraded(e)
            }
        }
    }

    pub fn upgrade_to_premium(&mut self) -> PersistOutcome {
        let Some(profile) = self.profile.as_mut() else {
            return PersistOutcome::Failed(ProfileError::NoActiveProfile);
        };
        profile.is_premium = true;
        info!(id = %profile.id, "upgraded to premium");

        let profile = profile.clone();
        self.write(&profile)
    }

    fn read(&self) -> Result<Option<UserProfile>, StorageError> {
        let Some(raw) = self.store.get(PROFILE_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: PROFILE_KEY.to_string(),
                reason: e.to_string(),
            })
    }

    fn write(&self, profile: &UserProfile) -> PersistOutcome {
        let result = serde_json::to_string(profile)
            .map_err(|source| StorageError::Encode {
                key: PROFILE_KEY.to_string(),
                source,
            })
            .and_then(|json| self.store.set(PROFILE_KEY, &json));

        match result {
            Ok(()) => PersistOutcome::Succeeded,
            Err(e) => {
                warn!(error = %e, "could not persist profile, keeping it for this run only");
                PersistOutcome::Degraded(e)
            }
        }
    }
}
