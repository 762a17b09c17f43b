use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use timestables::{
    app::App,
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, FixedTicker, QuizEvent, Runner},
    settings::Settings,
    stats::{SessionStats, TrendConfig},
    storage::GameStorage,
};
use tracing::{debug, warn};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, EnvFilter};

const TICK_RATE_MS: u64 = 100;

/// multiplication tables practice in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Practice multiplication tables with randomized quizzes, instant feedback, per-table breakdowns and progress tracking across sessions."
)]
pub struct Cli {
    /// number of questions for this run (not saved)
    #[clap(short = 'q', long = "questions")]
    questions: Option<usize>,

    /// comma-separated tables to practice for this run, e.g. 3,4,7 (not saved)
    #[clap(short = 't', long = "tables", value_delimiter = ',')]
    tables: Option<Vec<u32>>,

    /// seed the random source for a repeatable quiz
    #[clap(long)]
    seed: Option<u64>,

    /// database file to keep settings and history in
    #[clap(long, conflicts_with = "memory")]
    db: Option<PathBuf>,

    /// keep everything in memory; nothing is written to disk
    #[clap(long)]
    memory: bool,

    /// print statistics and exit
    #[clap(long, conflicts_with_all = ["clear", "results"])]
    stats: bool,

    /// erase settings and session history, then exit
    #[clap(long, conflicts_with = "results")]
    clear: bool,

    /// open the results screen for an encoded session
    #[clap(long, value_name = "PAYLOAD")]
    results: Option<String>,
}

impl Cli {
    fn interactive(&self) -> bool {
        !(self.stats || self.clear)
    }

    /// One-off settings built from `--questions`/`--tables` over the stored ones
    fn settings_override(&self, stored: &Settings) -> Option<Result<Settings, String>> {
        if self.questions.is_none() && self.tables.is_none() {
            return None;
        }
        let count = self.questions.unwrap_or(stored.number_of_questions());
        let tables = self
            .tables
            .clone()
            .unwrap_or_else(|| stored.selected_tables().to_vec());
        Some(Settings::new(count, tables).map_err(|e| e.to_string()))
    }
}

fn init_logging(cli: &Cli, db_path: Option<&Path>) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "timestables=info".into());

    let writer = if cli.memory {
        if cli.interactive() {
            BoxMakeWriter::new(io::sink)
        } else {
            BoxMakeWriter::new(io::stderr)
        }
    } else {
        let log_path = db_path
            .and_then(Path::parent)
            .map(|dir| dir.join("timestables.log"))
            .or_else(AppDirs::log_path);
        match log_path.and_then(|p| open_log(&p).ok()) {
            Some(file) => BoxMakeWriter::new(Mutex::new(file)),
            None => BoxMakeWriter::new(io::sink),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(writer)
        .init();
}

fn open_log(path: &Path) -> io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn table_label(table: Option<u32>) -> String {
    table.map(|t| format!("× {t}")).unwrap_or_else(|| "-".into())
}

fn print_stats(stats: &SessionStats, trend_config: &TrendConfig) {
    if stats.total_sessions == 0 {
        println!("No sessions yet");
        return;
    }

    let trend = stats.trend(trend_config);
    println!("Sessions:        {}", stats.total_sessions);
    println!(
        "Questions:       {} ({:.1} per session)",
        stats.total_questions,
        stats.average_questions_per_session()
    );
    println!("Correct:         {}", stats.total_correct_answers);
    println!("Incorrect:       {}", stats.total_incorrect_answers);
    println!("Average score:   {:.0}%", stats.average_score);
    println!("Trend:           {} {trend}", trend.arrow());
    println!("Strongest table: {}", table_label(stats.strongest_table));
    println!("Weakest table:   {}", table_label(stats.weakest_table));

    if !stats.recent_sessions.is_empty() {
        println!();
        println!("Recent sessions:");
        for (i, session) in stats.recent_sessions.iter().take(5).enumerate() {
            println!(
                "  #{:<3} {}  {:>3.0}%  {}/{}",
                stats.total_sessions - i,
                session.date.format("%Y-%m-%d %H:%M"),
                session.success_ratio() * 100.0,
                session.correct_answers,
                session.questions.len()
            );
        }
    }

    println!();
    println!(
        "{}",
        stats
            .achievements(trend)
            .iter()
            .map(|a| format!("{} {}: {}", a.emoji, a.category, a.title))
            .join("\n")
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let config = config_store.load();
    let db_path = cli.db.clone().or_else(|| config.db_path.clone());
    init_logging(&cli, db_path.as_deref());
    debug!(path = %config_store.path().display(), "loaded config");

    let storage = if cli.memory {
        GameStorage::in_memory()
    } else {
        GameStorage::open(db_path)
    };

    if cli.clear {
        storage.clear_all_data();
        println!("All settings and history cleared");
        return Ok(());
    }

    if cli.stats {
        print_stats(&storage.stats(), &config.trend);
        return Ok(());
    }

    let overrides = match cli.settings_override(&storage.settings()) {
        Some(Err(msg)) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, msg).exit();
        }
        Some(Ok(settings)) => Some(settings),
        None => None,
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(storage, config, cli.seed);
    if let Some(settings) = overrides {
        app.override_settings(settings);
    }
    if let Some(payload) = cli.results.as_deref() {
        app.open_results(payload);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        warn!(error = %e, "terminal loop ended with an error");
    }
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    debug!("starting terminal loop");

    while !app.should_quit {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            QuizEvent::Key(key) => app.handle_key(key, Instant::now()),
            QuizEvent::Resize => {}
            QuizEvent::Tick => app.on_tick(Instant::now()),
        }
    }

    Ok(())
}
