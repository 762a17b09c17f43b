use std::sync::mpsc::{self, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use timestables::{
    app::{App, AppState},
    config::Config,
    runtime::{FixedTicker, QuizEvent, Runner, TestEventSource},
    settings::Settings,
    storage::GameStorage,
};

fn key(code: KeyCode) -> QuizEvent {
    QuizEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn quick_app() -> App {
    let config = Config {
        correct_pause_ms: 0,
        incorrect_pause_ms: 0,
        ..Config::default()
    };
    App::new(GameStorage::in_memory(), config, Some(11))
}

/// Queue the keystrokes for the current question, right or wrong
fn type_answer(app: &App, tx: &Sender<QuizEvent>, correct: bool) {
    let question = app
        .round
        .as_ref()
        .and_then(|r| r.current_question())
        .expect("a question is waiting");
    let answer = if correct {
        question.answer
    } else {
        question.answer + 1
    };
    for c in answer.to_string().chars() {
        tx.send(key(KeyCode::Char(c))).unwrap();
    }
    tx.send(key(KeyCode::Enter)).unwrap();
}

/// Drive the app through the runner until it leaves the play screen
fn play_round(
    app: &mut App,
    runner: &Runner<TestEventSource, FixedTicker>,
    tx: &Sender<QuizEvent>,
    wrong_at: &[usize],
) {
    let mut queued = false;
    for _ in 0..1000u32 {
        if app.state == AppState::Playing && app.feedback.is_none() && !queued {
            let index = app.round.as_ref().map(|r| r.current_index()).unwrap_or(0);
            type_answer(app, tx, !wrong_at.contains(&index));
            queued = true;
        }

        match runner.step() {
            QuizEvent::Key(k) => {
                app.handle_key(k, Instant::now());
                if k.code == KeyCode::Enter {
                    queued = false;
                }
            }
            QuizEvent::Tick => app.on_tick(Instant::now()),
            QuizEvent::Resize => {}
        }

        if app.state != AppState::Playing {
            break;
        }
    }
}

#[test]
fn headless_round_reaches_results_and_is_saved() {
    let mut app = quick_app();
    app.override_settings(Settings::new(4, [7]).unwrap());

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(2)),
    );

    tx.send(key(KeyCode::Enter)).unwrap();
    if let QuizEvent::Key(k) = runner.step() {
        app.handle_key(k, Instant::now());
    }
    assert_eq!(app.state, AppState::Playing);

    play_round(&mut app, &runner, &tx, &[1]);

    assert_eq!(app.state, AppState::Results);
    let view = app.results.as_ref().unwrap();
    assert_eq!(view.score.correct, 3);
    assert_eq!(view.score.incorrect, 1);
    assert_eq!(view.score.percentage, 75);
    assert_eq!(view.score.weakest_table, Some(7));
    assert!(view.session.questions.iter().all(|q| q.multiplicand == 7));

    let sessions = app.storage().sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, view.session.id);
    assert_eq!(app.storage().stats().total_questions, 4);
}

#[test]
fn replay_and_statistics_from_results() {
    let mut app = quick_app();
    app.override_settings(Settings::new(2, [2, 3]).unwrap());

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(2)),
    );

    app.start_round(Instant::now());
    play_round(&mut app, &runner, &tx, &[]);
    assert_eq!(app.state, AppState::Results);

    // replay
    app.handle_key(
        KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE),
        Instant::now(),
    );
    assert_eq!(app.state, AppState::Playing);
    play_round(&mut app, &runner, &tx, &[0, 1]);
    assert_eq!(app.results.as_ref().unwrap().score.percentage, 0);

    app.handle_key(
        KeyEvent::new(KeyCode::Char('v'), KeyModifiers::NONE),
        Instant::now(),
    );
    assert_eq!(app.state, AppState::Stats);
    let stats = app.stats.as_ref().unwrap();
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.total_correct_answers, 2);
    assert_eq!(stats.average_score, 50.0);

    app.handle_key(
        KeyEvent::new(KeyCode::Char('b'), KeyModifiers::NONE),
        Instant::now(),
    );
    assert_eq!(app.state, AppState::Home);
}

#[test]
fn escape_from_home_quits_without_events_left() {
    let mut app = quick_app();
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );
    tx.send(key(KeyCode::Esc)).unwrap();
    drop(tx);

    for _ in 0..10u32 {
        match runner.step() {
            QuizEvent::Key(k) => app.handle_key(k, Instant::now()),
            QuizEvent::Tick => app.on_tick(Instant::now()),
            QuizEvent::Resize => {}
        }
        if app.should_quit {
            break;
        }
    }
    assert!(app.should_quit);
}
