use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "tvde-quiz";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    /// Where the profile store keeps its keys.
    pub fn data_dir() -> Option<PathBuf> {
        Self::project().map(|pd| pd.data_local_dir().to_path_buf())
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::project().map(|pd| pd.config_dir().join("config.json"))
    }

    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME);
            Some(state_dir.join("tvde.log"))
        } else {
            Self::project().map(|pd| pd.data_local_dir().join("tvde.log"))
        }
    }
}
