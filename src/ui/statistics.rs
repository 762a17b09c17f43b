use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::{app::App, session::GameSession, stats::SessionStats, ui::rate_color};

/// Sessions listed under "Recent progress"
const RECENT_ROWS: usize = 5;

fn table_label(table: Option<u32>) -> String {
    table
        .map(|t| format!("× {t}"))
        .unwrap_or_else(|| "—".to_string())
}

/// Pure presenter for one recent-session row; `number` counts from the first session ever played
pub fn present_session_row(number: usize, session: &GameSession) -> Row<'static> {
    let percentage = (session.success_ratio() * 100.0).round() as u8;
    Row::new(vec![
        Cell::from(format!("#{number}")),
        Cell::from(session.date.format("%Y-%m-%d").to_string()),
        Cell::from(format!("{percentage}%")).style(
            Style::default()
                .fg(rate_color(percentage))
                .add_modifier(Modifier::BOLD),
        ),
        Cell::from(format!(
            "{}/{}",
            session.correct_answers,
            session.questions.len()
        )),
    ])
}

/// Render the statistics screen from the snapshot loaded into `app.stats`
pub fn render_statistics(app: &App, area: Rect, buf: &mut Buffer) {
    let empty = SessionStats::default();
    let stats = app.stats.as_ref().unwrap_or(&empty);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(4), // totals
            Constraint::Min(4),    // recent sessions
            Constraint::Length(3), // achievements
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new("Your statistics")
        .block(Block::default().borders(Borders::ALL).title("Stats"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    if stats.total_sessions == 0 {
        Paragraph::new("No sessions yet. Play a round to start collecting statistics.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray))
            .render(chunks[2], buf);
        Paragraph::new(Span::styled(
            "(r) play / (b)ack",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[4], buf);
        return;
    }

    let trend = stats.trend(&app.config.trend);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let totals = vec![
        Line::from(vec![
            Span::raw("Sessions: "),
            Span::styled(stats.total_sessions.to_string(), bold),
            Span::raw("   Questions: "),
            Span::styled(stats.total_questions.to_string(), bold),
            Span::raw(format!(
                " ({:.1} per session)",
                stats.average_questions_per_session()
            )),
        ]),
        Line::from(vec![
            Span::raw("Correct: "),
            Span::styled(
                stats.total_correct_answers.to_string(),
                Style::default().fg(Color::Green),
            ),
            Span::raw("   Incorrect: "),
            Span::styled(
                stats.total_incorrect_answers.to_string(),
                Style::default().fg(Color::Red),
            ),
            Span::raw("   Average: "),
            Span::styled(format!("{:.0}%", stats.average_score), bold),
            Span::raw(format!("   Trend: {} {trend}", trend.arrow())),
        ]),
        Line::from(vec![
            Span::raw("Strongest table: "),
            Span::styled(
                table_label(stats.strongest_table),
                Style::default().fg(Color::Green),
            ),
            Span::raw("   Weakest table: "),
            Span::styled(
                table_label(stats.weakest_table),
                Style::default().fg(Color::Red),
            ),
        ]),
    ];
    Paragraph::new(totals)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let rows: Vec<Row> = stats
        .recent_sessions
        .iter()
        .take(RECENT_ROWS)
        .enumerate()
        .map(|(i, session)| present_session_row(stats.total_sessions - i, session))
        .collect();
    let widths = [
        Constraint::Length(6),
        Constraint::Length(12),
        Constraint::Length(6),
        Constraint::Min(6),
    ];
    Table::new(rows, widths)
        .header(
            Row::new(vec!["", "Date", "Score", "Correct"]).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Recent progress"),
        )
        .column_spacing(2)
        .render(chunks[2], buf);

    let badges: Vec<Span> = stats
        .achievements(trend)
        .iter()
        .map(|a| Span::raw(format!("{} {}: {}   ", a.emoji, a.category, a.title)))
        .collect();
    Paragraph::new(Line::from(badges))
        .block(Block::default().borders(Borders::TOP).title("Achievements"))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(r) play / (b)ack",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[4], buf);
}
