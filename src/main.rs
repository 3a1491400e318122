use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    time::{Duration, Instant},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};
use tvde_quiz::{
    app::{App, Flow},
    app_dirs::AppDirs,
    bank::{CategoryFilter, QuestionBank},
    config::{Config, FileConfigStore},
    logging,
    profile::{FileStore, KeyValueStore, MemoryStore},
    runtime::{CrosstermEventSource, FixedTicker, QuizEvent, QuizEventSource, Runner, Ticker},
    ui,
};

const TICK_RATE_MS: u64 = 100;

/// exam practice for TVDE drivers, in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Practice the TVDE driver certification exam by topic: answer multiple-choice questions, get immediate feedback and a pass/review verdict at the end of each session."
)]
pub struct Cli {
    /// start a session in this category right after login ("todos", "lei-tvde", ...)
    #[clap(short, long)]
    category: Option<CategoryFilter>,

    /// question bank JSON file to use instead of the built-in one
    #[clap(short, long)]
    bank: Option<PathBuf>,

    /// seed for question shuffling, for reproducible sessions
    #[clap(long)]
    seed: Option<u64>,

    /// directory holding the saved profile
    #[clap(long, conflicts_with = "ephemeral")]
    data_dir: Option<PathBuf>,

    /// keep the profile in memory only
    #[clap(long)]
    ephemeral: bool,

    /// print the number of questions per category and exit
    #[clap(long)]
    list_categories: bool,
}

impl Cli {
    fn load_bank(&self) -> Result<QuestionBank, tvde_quiz::BankError> {
        match &self.bank {
            Some(path) => QuestionBank::from_path(path),
            None => QuestionBank::builtin(),
        }
    }

    fn store(&self) -> Box<dyn KeyValueStore> {
        if self.ephemeral {
            Box::new(MemoryStore::new())
        } else if let Some(dir) = &self.data_dir {
            Box::new(FileStore::with_dir(dir))
        } else {
            Box::new(FileStore::new())
        }
    }

    /// The flag wins over the configured default.
    fn start_category(&self, config: &Config) -> Option<CategoryFilter> {
        self.category.or_else(|| {
            let configured = config.default_category.as_deref()?;
            match configured.parse() {
                Ok(filter) => Some(filter),
                Err(e) => {
                    warn!(error = %e, "ignoring configured default category");
                    None
                }
            }
        })
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let bank = cli.load_bank()?;

    if cli.list_categories {
        list_categories(&bank, &mut io::stdout())?;
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = AppDirs::log_path() {
        if let Err(e) = logging::init(&path) {
            eprintln!("warning: could not open log file {}: {e}", path.display());
        }
    }

    let config = FileConfigStore::new().load_or_create();
    let category = cli.start_category(&config);
    info!(questions = bank.len(), ?category, seed = ?cli.seed, "starting");

    let mut app = App::new(&bank, cli.store(), config, cli.seed);
    app.pending_category = category;
    app.start();

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = run(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    info!("bye");
    Ok(())
}

/// Draws, then feeds events to the app until it asks to quit.
fn run<B: Backend, E: QuizEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> io::Result<()> {
    let size = terminal.size()?;
    app.on_resize(size.width, size.height);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::ui(app, f))?;

        match runner.step() {
            QuizEvent::Key(key) => {
                if app.handle_key(key) == Flow::Quit {
                    return Ok(());
                }
            }
            QuizEvent::Resize => {
                let size = terminal.size()?;
                app.on_resize(size.width, size.height);
            }
            QuizEvent::Tick => {
                let now = Instant::now();
                app.on_tick(now.duration_since(last_tick).as_secs_f64());
                last_tick = now;
            }
        }
    }
}

fn list_categories<W: Write>(bank: &QuestionBank, out: &mut W) -> io::Result<()> {
    let counts = bank.category_counts();
    for filter in CategoryFilter::menu() {
        let count = match filter {
            CategoryFilter::All => bank.len(),
            CategoryFilter::Only(c) => counts.get(&c).copied().unwrap_or(0),
        };
        writeln!(out, "{filter}: {count}")?;
    }
    Ok(())
}
