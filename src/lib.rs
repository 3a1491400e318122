// Library surface for the binary, headless integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod bank;
pub mod celebration;
pub mod config;
pub mod error;
pub mod logging;
pub mod profile;
pub mod quiz;
pub mod runtime;
pub mod ui;

pub use app::{App, AppState, Flow};
pub use bank::{Category, CategoryFilter, QuestionBank};
pub use error::{BankError, ProfileError, QuizError, StorageError};
pub use profile::{PersistOutcome, ProfileManager, UserProfile};
pub use quiz::{QuizEngine, Summary, Verdict};
