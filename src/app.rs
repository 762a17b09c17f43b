use crate::{
    config::Config,
    feedback::{select_message, Encouragement},
    question::accepts_answer_char,
    round::{AnswerOutcome, Round, RoundError},
    scoring::Score,
    session::{decode_session, encode_session, GameSession},
    settings::{Settings, SettingsError},
    stats::SessionStats,
    storage::GameStorage,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::{rngs::StdRng, SeedableRng};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Home,
    Playing,
    Results,
    Stats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Feedback overlay shown between an answer and the next question
#[derive(Debug, Clone, Copy)]
pub struct PendingFeedback {
    pub outcome: AnswerOutcome,
    pub until: Instant,
}

/// Everything the results screen shows, derived from a decoded payload
#[derive(Debug, Clone)]
pub struct ResultsView {
    pub session: GameSession,
    pub score: Score,
    pub encouragement: Encouragement,
}

pub struct App {
    pub state: AppState,
    pub config: Config,
    /// Working copy edited on the home screen; written back on save
    pub settings: Settings,
    pub has_changes: bool,
    pub round: Option<Round>,
    pub input: String,
    pub feedback: Option<PendingFeedback>,
    pub results: Option<ResultsView>,
    pub stats: Option<SessionStats>,
    pub notice: Option<Notice>,
    pub confirm_clear: bool,
    pub should_quit: bool,
    storage: GameStorage,
    rng: StdRng,
}

impl App {
    pub fn new(storage: GameStorage, config: Config, seed: Option<u64>) -> Self {
        let settings = storage.settings();
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            state: AppState::Home,
            config,
            settings,
            has_changes: false,
            round: None,
            input: String::new(),
            feedback: None,
            results: None,
            stats: None,
            notice: None,
            confirm_clear: false,
            should_quit: false,
            storage,
            rng,
        }
    }

    /// Replace the working settings for this run without persisting them
    pub fn override_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn storage(&self) -> &GameStorage {
        &self.storage
    }

    pub fn start_round(&mut self, now: Instant) {
        self.round = Some(Round::new(self.settings.clone(), &mut self.rng, now));
        self.input.clear();
        self.feedback = None;
        self.notice = None;
        self.state = AppState::Playing;
    }

    /// Show the results screen for an encoded session. An unreadable
    /// payload lands on the home screen instead.
    pub fn open_results(&mut self, payload: &str) {
        match decode_session(payload) {
            Ok(session) => {
                let score = session.score();
                let encouragement =
                    select_message(score.percentage, score.weakest_table, &mut self.rng);
                self.results = Some(ResultsView {
                    session,
                    score,
                    encouragement,
                });
                self.state = AppState::Results;
            }
            Err(e) => {
                warn!(error = %e, "could not open results");
                self.results = None;
                self.state = AppState::Home;
            }
        }
    }

    pub fn show_stats(&mut self) {
        self.stats = Some(self.storage.stats());
        self.state = AppState::Stats;
    }

    fn go_home(&mut self) {
        self.round = None;
        self.feedback = None;
        self.input.clear();
        self.confirm_clear = false;
        self.state = AppState::Home;
    }

    fn finish_round(&mut self, now: Instant) {
        let Some(round) = self.round.take() else {
            return;
        };
        let session = round.finish(now);
        info!(
            id = %session.id,
            correct = session.correct_answers,
            incorrect = session.incorrect_answers,
            "session complete"
        );
        self.storage.save_session(session.clone());

        match encode_session(&session) {
            Ok(payload) => self.open_results(&payload),
            Err(e) => {
                warn!(error = %e, "could not encode session");
                self.go_home();
            }
        }
    }

    /// Advance past the feedback pause once it has elapsed
    pub fn on_tick(&mut self, now: Instant) {
        if self.state != AppState::Playing {
            return;
        }
        let Some(pending) = self.feedback else {
            return;
        };
        if now < pending.until {
            return;
        }
        self.feedback = None;

        let advanced = match self.round.as_mut() {
            Some(round) => round.advance(now),
            None => false,
        };
        if !advanced {
            self.finish_round(now);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.state {
            AppState::Home => self.on_home_key(key, now),
            AppState::Playing => self.on_play_key(key, now),
            AppState::Results => match key.code {
                KeyCode::Char('r') => self.start_round(now),
                KeyCode::Char('v') => self.show_stats(),
                KeyCode::Char('h') | KeyCode::Esc => self.go_home(),
                _ => {}
            },
            AppState::Stats => match key.code {
                KeyCode::Char('r') => self.start_round(now),
                KeyCode::Char('b') | KeyCode::Backspace | KeyCode::Esc => self.go_home(),
                _ => {}
            },
        }
    }

    fn on_home_key(&mut self, key: KeyEvent, now: Instant) {
        if self.confirm_clear {
            self.confirm_clear = false;
            if key.code == KeyCode::Char('y') {
                self.storage.clear_all_data();
                self.settings = self.storage.settings();
                self.has_changes = false;
                self.notice = Some(Notice::Info("History cleared".into()));
            } else {
                self.notice = None;
            }
            return;
        }

        self.notice = None;
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Enter => self.start_round(now),
            KeyCode::Up => {
                self.settings.cycle_question_count(true);
                self.has_changes = true;
            }
            KeyCode::Down => {
                self.settings.cycle_question_count(false);
                self.has_changes = true;
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let table = match c.to_digit(10) {
                    Some(0) => 10,
                    Some(n) => n,
                    None => return,
                };
                match self.settings.toggle_table(table) {
                    Ok(()) => self.has_changes = true,
                    Err(SettingsError::EmptyTableSelection) => {
                        self.notice =
                            Some(Notice::Error("You need to select at least one table!".into()));
                    }
                    Err(e) => self.notice = Some(Notice::Error(e.to_string())),
                }
            }
            KeyCode::Char('s') => {
                self.storage.save_settings(&self.settings);
                self.has_changes = false;
                self.notice = Some(Notice::Info("Settings saved".into()));
            }
            KeyCode::Char('r') => {
                self.settings = Settings::default();
                self.has_changes = true;
                self.notice = Some(Notice::Info("Settings reset".into()));
            }
            KeyCode::Char('x') => {
                self.confirm_clear = true;
                self.notice = Some(Notice::Error(
                    "Erase all history? This cannot be undone. (y/n)".into(),
                ));
            }
            KeyCode::Char('v') => self.show_stats(),
            _ => {}
        }
    }

    fn on_play_key(&mut self, key: KeyEvent, now: Instant) {
        if key.code == KeyCode::Esc {
            self.go_home();
            return;
        }
        // input is frozen while the feedback overlay is up
        if self.feedback.is_some() {
            return;
        }

        match key.code {
            KeyCode::Char(c) if accepts_answer_char(&self.input, c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => self.submit(now),
            _ => {}
        }
    }

    fn submit(&mut self, now: Instant) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        match round.submit(&self.input, now) {
            Ok(outcome) => {
                self.input.clear();
                self.feedback = Some(PendingFeedback {
                    outcome,
                    until: now + self.config.feedback_pause(outcome.correct),
                });
            }
            Err(RoundError::InvalidAnswer) => {}
            Err(e) => warn!(error = %e, "answer not recorded"),
        }
    }
}
