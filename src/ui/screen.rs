use ratatui::{buffer::Buffer, layout::Rect};

use crate::{
    app::{App, AppState},
    ui::{render_home, render_play, results::render_results, statistics::render_statistics},
};

/// A UI Screen boundary: responsible for rendering one application state
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Settings and start screen
pub struct HomeScreen;

impl Screen for HomeScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_home(app, area, buf);
    }
}

/// Question being played
pub struct PlayScreen;

impl Screen for PlayScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_play(app, area, buf);
    }
}

/// Summary of a finished session
pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_results(app, area, buf);
    }
}

/// History-wide statistics
pub struct StatisticsScreen;

impl Screen for StatisticsScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_statistics(app, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Home => Box::new(HomeScreen),
        AppState::Playing => Box::new(PlayScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::Stats => Box::new(StatisticsScreen),
    }
}
