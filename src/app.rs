//! The context object the terminal front end drives: it owns the profile
//! manager and the quiz engine, and maps key presses onto their operations.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::bank::{Category, CategoryFilter, QuestionBank};
use crate::celebration::Celebration;
use crate::config::Config;
use crate::error::{ProfileError, QuizError};
use crate::profile::{KeyValueStore, PersistOutcome, ProfileManager};
use crate::quiz::{Advance, AnswerFeedback, Phase, QuizEngine, Summary, Verdict};

pub const EMPTY_CATEGORY_NOTICE: &str = "Sem perguntas disponíveis para esta categoria.";
pub const PREMIUM_NOTICE: &str =
    "Conta atualizada para PREMIUM! Acesso ilimitado desbloqueado.";
pub const PREMIUM_NOT_SAVED_NOTICE: &str =
    "Conta atualizada (sessão atual), mas não foi possível guardar permanentemente.";
pub const LOGIN_NOT_SAVED_NOTICE: &str =
    "Sessão iniciada, mas não foi possível guardar o perfil neste dispositivo.";
pub const LOGOUT_NOT_SAVED_NOTICE: &str =
    "Sessão terminada, mas não foi possível apagar o perfil guardado.";
pub const EMPTY_NAME_NOTICE: &str = "Indique o seu nome para continuar.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Loading,
    Login,
    Menu,
    Question,
    ConfirmRestart,
    Summary,
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    fn info(text: &str) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.to_string(),
        }
    }

    fn warning(text: &str) -> Self {
        Self {
            kind: NoticeKind::Warning,
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Everything the presentation layer needs, owned in one place.
pub struct App {
    pub profiles: ProfileManager<Box<dyn KeyValueStore>>,
    pub quiz: QuizEngine,
    pub config: Config,
    pub state: AppState,
    pub menu: Vec<CategoryFilter>,
    pub menu_index: usize,
    pub counts: HashMap<Category, usize>,
    pub name_input: String,
    pub feedback: Option<AnswerFeedback>,
    pub summary: Option<Summary>,
    pub notice: Option<Notice>,
    pub celebration: Celebration,
    /// Opened as soon as a profile is available.
    pub pending_category: Option<CategoryFilter>,
    /// Last known terminal size, used to lay out the celebration.
    pub area: (u16, u16),
}

impl App {
    pub fn new(
        bank: &QuestionBank,
        store: Box<dyn KeyValueStore>,
        config: Config,
        seed: Option<u64>,
    ) -> Self {
        let quiz = match seed {
            Some(seed) => QuizEngine::seeded(bank, seed),
            None => QuizEngine::new(bank),
        };

        Self {
            profiles: ProfileManager::new(store),
            quiz,
            config,
            state: AppState::Loading,
            menu: CategoryFilter::menu(),
            menu_index: 0,
            counts: bank.category_counts(),
            name_input: String::new(),
            feedback: None,
            summary: None,
            notice: None,
            celebration: Celebration::new(),
            pending_category: None,
            area: (80, 24),
        }
    }

    /// Loads the stored profile and picks the first screen.
    pub fn start(&mut self) {
        let has_profile = self.profiles.load().is_some();
        if has_profile {
            self.enter_menu();
        } else {
            self.state = AppState::Login;
        }
    }

    pub fn total_questions(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn count_for(&self, filter: CategoryFilter) -> usize {
        match filter {
            CategoryFilter::All => self.total_questions(),
            CategoryFilter::Only(c) => self.counts.get(&c).copied().unwrap_or(0),
        }
    }

    pub fn on_tick(&mut self, dt: f64) {
        self.celebration.update(dt);
    }

    pub fn on_resize(&mut self, width: u16, height: u16) {
        self.area = (width, height);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        self.notice = None;
        match self.state {
            AppState::Loading => Flow::Continue,
            AppState::Login => self.on_login_key(key),
            AppState::Menu => self.on_menu_key(key),
            AppState::Question => self.on_question_key(key),
            AppState::ConfirmRestart => self.on_confirm_key(key),
            AppState::Summary => self.on_summary_key(key),
            AppState::Profile => self.on_profile_key(key),
        }
    }

    /// Starts a session, or reports that the category has nothing to ask.
    pub fn open_category(&mut self, filter: CategoryFilter) -> Result<(), QuizError> {
        match self.quiz.start_session(filter) {
            Ok(_) => {
                self.feedback = None;
                self.summary = None;
                self.celebration.stop();
                self.state = AppState::Question;
                Ok(())
            }
            Err(e) => {
                if matches!(e, QuizError::EmptyResultSet(_)) {
                    self.notice = Some(Notice::warning(EMPTY_CATEGORY_NOTICE));
                }
                Err(e)
            }
        }
    }

    fn enter_menu(&mut self) {
        self.state = AppState::Menu;
        if let Some(filter) = self.pending_category.take() {
            let _ = self.open_category(filter);
        }
    }

    fn on_login_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Backspace => {
                self.name_input.pop();
            }
            KeyCode::Enter => match self.profiles.login(&self.name_input) {
                PersistOutcome::Failed(_) => {
                    self.notice = Some(Notice::warning(EMPTY_NAME_NOTICE));
                }
                outcome => {
                    self.name_input.clear();
                    self.enter_menu();
                    // takes precedence over an empty-category notice
                    if !outcome.is_durable() {
                        self.notice = Some(Notice::warning(LOGIN_NOT_SAVED_NOTICE));
                    }
                }
            },
            KeyCode::Char(c) => self.name_input.push(c),
            _ => {}
        }
        Flow::Continue
    }

    fn on_menu_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_index = self.menu_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.menu_index = (self.menu_index + 1).min(self.menu.len() - 1);
            }
            KeyCode::Enter => {
                let _ = self.open_category(self.menu[self.menu_index]);
            }
            KeyCode::Char(c @ '1'..='9') => {
                let idx = c as usize - '1' as usize;
                if let Some(filter) = self.menu.get(idx).copied() {
                    self.menu_index = idx;
                    let _ = self.open_category(filter);
                }
            }
            KeyCode::Char('p') => self.state = AppState::Profile,
            _ => {}
        }
        Flow::Continue
    }

    fn on_question_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc => {
                self.quiz.abandon();
                self.feedback = None;
                self.state = AppState::Menu;
            }
            KeyCode::Enter | KeyCode::Right => self.advance(),
            KeyCode::Char('r') => self.request_restart(),
            KeyCode::Char(c) => {
                if let Some(option) = option_for_key(c) {
                    self.answer(option);
                }
            }
            _ => {}
        }
        Flow::Continue
    }

    fn on_confirm_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Char('s') | KeyCode::Char('y') | KeyCode::Enter => self.restart_same(),
            KeyCode::Char('n') | KeyCode::Esc => self.state = AppState::Question,
            _ => {}
        }
        Flow::Continue
    }

    fn on_summary_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Char('r') => self.restart_same(),
            KeyCode::Char('m') | KeyCode::Enter | KeyCode::Esc => {
                let _ = self.quiz.restart(false);
                self.summary = None;
                self.celebration.stop();
                self.state = AppState::Menu;
            }
            KeyCode::Char('q') => return Flow::Quit,
            _ => {}
        }
        Flow::Continue
    }

    fn on_profile_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Char('u') => match self.profiles.upgrade_to_premium() {
                PersistOutcome::Succeeded => self.notice = Some(Notice::info(PREMIUM_NOTICE)),
                PersistOutcome::Degraded(_) => {
                    self.notice = Some(Notice::warning(PREMIUM_NOT_SAVED_NOTICE))
                }
                PersistOutcome::Failed(ProfileError::NoActiveProfile) => {
                    self.state = AppState::Login
                }
                PersistOutcome::Failed(_) => {}
            },
            KeyCode::Char('o') => {
                let outcome = self.profiles.logout();
                self.quiz.abandon();
                self.name_input.clear();
                self.state = AppState::Login;
                if !outcome.is_durable() {
                    self.notice = Some(Notice::warning(LOGOUT_NOT_SAVED_NOTICE));
                }
            }
            KeyCode::Esc | KeyCode::Char('b') => self.state = AppState::Menu,
            _ => {}
        }
        Flow::Continue
    }

    fn answer(&mut self, option: usize) {
        match self.quiz.answer(option) {
            Ok(feedback) => self.feedback = Some(feedback),
            // the first answer stands
            Err(e) => debug!(error = %e, "answer ignored"),
        }
    }

    fn advance(&mut self) {
        match self.quiz.advance() {
            Ok(Advance::Next) => self.feedback = None,
            Ok(Advance::Finished(summary)) => {
                if summary.verdict == Verdict::Pass {
                    self.celebration.start(self.area.0, self.area.1);
                }
                self.summary = Some(summary);
                self.feedback = None;
                self.state = AppState::Summary;
            }
            Err(e) => debug!(error = %e, "advance ignored"),
        }
    }

    fn request_restart(&mut self) {
        let mid_session = self
            .quiz
            .session()
            .is_some_and(|s| s.position() > 0 && !s.is_finished());
        if self.config.confirm_restart && mid_session {
            self.state = AppState::ConfirmRestart;
        } else {
            self.restart_same();
        }
    }

    fn restart_same(&mut self) {
        if self.quiz.phase() == Phase::CategorySelection {
            self.state = AppState::Menu;
            return;
        }
        match self.quiz.restart(true) {
            Ok(()) => {
                self.feedback = None;
                self.summary = None;
                self.celebration.stop();
                self.state = AppState::Question;
            }
            Err(e) => debug!(error = %e, "restart ignored"),
        }
    }
}

/// `a`..`i` and `1`..`9` pick options by position.
fn option_for_key(c: char) -> Option<usize> {
    match c.to_ascii_lowercase() {
        c @ 'a'..='i' => Some(c as usize - 'a' as usize),
        c @ '1'..='9' => Some(c as usize - '1' as usize),
        _ => None,
    }
}
