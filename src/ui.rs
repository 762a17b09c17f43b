pub mod results;
pub mod screen;
pub mod statistics;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};

use crate::{
    app::{App, Notice},
    settings::AVAILABLE_TABLES,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(&self.state).render(self, area, buf);
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

/// Color band used for per-table and per-session success rates
pub(crate) fn rate_color(percentage: u8) -> Color {
    if percentage >= 80 {
        Color::Green
    } else if percentage >= 60 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn notice_line(notice: &Option<Notice>) -> Line<'static> {
    match notice {
        Some(Notice::Info(msg)) => Line::from(Span::styled(
            msg.clone(),
            Style::default().fg(Color::Green).patch(italic()),
        )),
        Some(Notice::Error(msg)) => Line::from(Span::styled(
            msg.clone(),
            Style::default().fg(Color::Red).patch(bold()),
        )),
        None => Line::default(),
    }
}

fn vertical(area: Rect, constraints: &[Constraint]) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(constraints)
        .split(area)
}

/// Configuration / start screen
pub(crate) fn render_home(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = vertical(
        area,
        &[
            Constraint::Length(2), // title
            Constraint::Length(2), // question count
            Constraint::Length(3), // tables
            Constraint::Length(2), // notice
            Constraint::Min(0),
            Constraint::Length(2), // legend
        ],
    );

    let mut title = vec![Span::styled(
        "✖️ Multiplication tables",
        bold().fg(Color::Cyan),
    )];
    if app.has_changes {
        title.push(Span::styled("  (unsaved changes)", dim().patch(italic())));
    }
    Paragraph::new(Line::from(title))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    Paragraph::new(Line::from(vec![
        Span::raw("Questions per round: "),
        Span::styled(
            format!("◀ {} ▶", app.settings.number_of_questions()),
            bold().fg(Color::Magenta),
        ),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let mut table_spans = vec![Span::raw("Tables: ")];
    for table in AVAILABLE_TABLES {
        let style = if app.settings.is_selected(table) {
            bold().fg(Color::Black).bg(Color::Green)
        } else {
            dim()
        };
        table_spans.push(Span::styled(format!(" {table} "), style));
        table_spans.push(Span::raw(" "));
    }
    let selected = app.settings.selected_tables().len();
    let count_line = Line::from(Span::styled(
        format!("{selected} selected"),
        italic(),
    ));
    Paragraph::new(vec![Line::from(table_spans), count_line])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    Paragraph::new(notice_line(&app.notice))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(enter) play / (↑↓) questions / (1-9, 0) tables / (s)ave / (r)eset / (v) stats / (x) clear history / (esc)ape",
        italic(),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[5], buf);
}

/// Question, answer field and running tally
pub(crate) fn render_play(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(round) = app.round.as_ref() else {
        return;
    };
    let Some(question) = round.displayed_question() else {
        return;
    };

    let chunks = vertical(
        area,
        &[
            Constraint::Length(1), // progress
            Constraint::Min(1),
            Constraint::Length(1), // prompt
            Constraint::Length(2), // answer / feedback
            Constraint::Min(1),
            Constraint::Length(1), // tally
            Constraint::Length(1), // streak
            Constraint::Length(1), // legend
        ],
    );

    let position = round.current_index() + 1;
    Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio(round.progress().clamp(0.0, 1.0))
        .label(format!("{position} / {}", round.len()))
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(question.prompt(), bold()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    let answer_line = match app.feedback {
        Some(pending) if pending.outcome.correct => Line::from(Span::styled(
            "Correct! 🎉",
            bold().fg(Color::Green),
        )),
        Some(pending) => Line::from(Span::styled(
            format!("Oops! The answer was {}", pending.outcome.expected),
            bold().fg(Color::Red),
        )),
        None => Line::from(vec![
            Span::styled("> ", dim()),
            Span::styled(app.input.clone(), bold().fg(Color::Cyan)),
            Span::styled("_", dim().add_modifier(Modifier::SLOW_BLINK)),
        ]),
    };
    Paragraph::new(answer_line)
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Line::from(vec![
        Span::styled(
            format!("✓ {}", round.correct_so_far()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("   "),
        Span::styled(
            format!("✗ {}", round.incorrect_so_far()),
            Style::default().fg(Color::Red),
        ),
        Span::raw("   "),
        Span::styled(format!("{}%", round.percentage_so_far()), bold()),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);

    Paragraph::new(Span::styled(round.streak_message(), italic()))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);

    Paragraph::new(Span::styled("(enter) submit / (esc) quit round", italic()))
        .render(chunks[7], buf);
}

/// Flatten a rendered buffer into one string, for assertions
#[cfg(test)]
pub(crate) fn buffer_text(buf: &Buffer) -> String {
    buf.content().iter().map(|c| c.symbol()).collect()
}
