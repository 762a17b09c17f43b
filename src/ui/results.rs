use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};

use crate::{app::App, scoring::TableTally, ui::rate_color, util::format_duration};

/// Pure presenter for one row of the per-table breakdown
pub fn present_table_row(tally: &TableTally, weakest: Option<u32>) -> Row<'static> {
    let percentage = tally.percentage();
    let is_weak = weakest == Some(tally.table);

    let table_cell = Cell::from(format!("× {}", tally.table))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let note = if is_weak { "💡 needs review" } else { "" };

    Row::new(vec![
        table_cell,
        Cell::from(format!("{} / {}", tally.correct, tally.total)),
        Cell::from(format!("{percentage}%")).style(Style::default().fg(rate_color(percentage))),
        Cell::from(note).style(Style::default().fg(Color::Red)),
    ])
}

/// Render the results of the session held in `app.results`
pub fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(view) = app.results.as_ref() else {
        return;
    };
    let session = &view.session;
    let score = &view.score;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // headline
            Constraint::Length(2), // score + badge
            Constraint::Min(4),    // breakdown
            Constraint::Length(4), // missed questions
            Constraint::Length(1), // timing
            Constraint::Length(1), // legend
        ])
        .split(area);

    let headline = vec![
        Line::from(Span::styled(
            format!("{} Session complete!", view.encouragement.emoji),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            view.encouragement.message.clone(),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ];
    Paragraph::new(headline)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[0], buf);

    let total = session.questions.len();
    Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                format!("{} / {total} correct", score.correct),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled(
                format!("{}%", score.percentage),
                Style::default()
                    .fg(rate_color(score.percentage))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            view.encouragement.tier.badge(),
            Style::default().fg(Color::Yellow),
        )),
    ])
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let rows: Vec<Row> = session
        .table_breakdown()
        .iter()
        .map(|tally| present_table_row(tally, score.weakest_table))
        .collect();
    let header = Row::new(vec!["Table", "Score", "Rate", ""]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    let widths = [
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Min(10),
    ];
    Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Breakdown by table"),
        )
        .column_spacing(2)
        .render(chunks[2], buf);

    let missed: Vec<Span> = session
        .missed_questions()
        .map(|q| {
            let given = q
                .user_answer
                .map(|a| format!(" (you said {a})"))
                .unwrap_or_default();
            Span::styled(
                format!("{} × {} = {}{given}   ", q.multiplicand, q.multiplier, q.answer),
                Style::default().fg(Color::Red),
            )
        })
        .collect();
    let missed_widget = if missed.is_empty() {
        Paragraph::new(Span::styled(
            "No mistakes!",
            Style::default().fg(Color::Green),
        ))
    } else {
        Paragraph::new(Line::from(missed)).wrap(Wrap { trim: true })
    };
    missed_widget
        .block(Block::default().borders(Borders::TOP).title("To review"))
        .render(chunks[3], buf);

    let duration = session
        .duration
        .map(format_duration)
        .unwrap_or_else(|| "—".to_string());
    Paragraph::new(Span::styled(
        format!(
            "Average time per question: {:.1}s   Duration: {duration}   {}",
            session.average_answer_time(),
            session.date.format("%Y-%m-%d %H:%M")
        ),
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    Paragraph::new(Span::styled(
        "(r)eplay / (h)ome / (v) stats",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[5], buf);
}
