use ratatui::Frame;

use crate::app::{App, AppState};
use crate::ui;

/// A UI screen boundary, one per [`AppState`].
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

pub struct LoadingScreen;

impl Screen for LoadingScreen {
    fn render(&self, _app: &App, f: &mut Frame) {
        ui::render_loading(f);
    }
}

pub struct LoginScreen;

impl Screen for LoginScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        ui::render_login(app, f);
    }
}

/// Category selection, the home screen once logged in
pub struct MenuScreen;

impl Screen for MenuScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        ui::render_menu(app, f);
    }
}

pub struct QuestionScreen;

impl Screen for QuestionScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        ui::render_question(app, f);
    }
}

/// The question screen with a confirmation dialog on top
pub struct ConfirmRestartScreen;

impl Screen for ConfirmRestartScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        ui::render_confirm_restart(app, f);
    }
}

pub struct SummaryScreen;

impl Screen for SummaryScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        ui::render_summary(app, f);
    }
}

pub struct ProfileScreen;

impl Screen for ProfileScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        ui::render_profile(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Loading => Box::new(LoadingScreen),
        AppState::Login => Box::new(LoginScreen),
        AppState::Menu => Box::new(MenuScreen),
        AppState::Question => Box::new(QuestionScreen),
        AppState::ConfirmRestart => Box::new(ConfirmRestartScreen),
        AppState::Summary => Box::new(SummaryScreen),
        AppState::Profile => Box::new(ProfileScreen),
    }
}
