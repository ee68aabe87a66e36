use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use super::app::{App, Mode, Pane, Screen};
use crate::present::report_lines;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(3)])
        .split(f.area());

    let title = Paragraph::new(format!("Weather TUI Search -- {} --", mode_name(app.mode)))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(chunks[1]);

    match app.screen {
        Screen::Input => draw_input(f, app, main[0]),
        Screen::Loading => {
            let loading = Paragraph::new("Loading weather data...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL).title("Status"));
            f.render_widget(loading, main[0]);
        }
        Screen::Report => draw_report(f, app, main[0]),
        Screen::Error => {
            let error = Paragraph::new(app.error.as_str())
                .style(Style::default().fg(Color::Red))
                .block(Block::default().borders(Borders::ALL).title("Error (Press 'i' to try again)"))
                .wrap(Wrap { trim: true });
            f.render_widget(error, main[0]);
        }
    }

    draw_history(f, app, main[1]);

    let footer = Paragraph::new(match app.mode {
        Mode::Normal => {
            "NORMAL: i=insert | Tab=switch panes | j/k=navigate history | Enter=search/load | Esc=quit"
        }
        Mode::Insert => {
            "INSERT: Type to search | Up/Down=select | Tab=accept/switch | Esc=normal mode"
        }
    })
    .style(Style::default().fg(Color::White))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[2]);
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Normal => "NORMAL",
        Mode::Insert => "INSERT",
    }
}

/// Input text with the cursor drawn in: a block in insert mode, brackets in normal mode.
pub fn input_with_cursor(app: &App) -> String {
    let chars: Vec<char> = app.input.chars().collect();
    let cursor = app.cursor.min(chars.len());
    let before: String = chars[..cursor].iter().collect();

    match (app.mode, chars.get(cursor)) {
        (Mode::Normal, Some(under)) => {
            let after: String = chars[cursor + 1..].iter().collect();
            format!("{before}[{under}]{after}")
        }
        _ => {
            let after: String = chars[cursor..].iter().collect();
            format!("{before}█{after}")
        }
    }
}

fn focus_style(focused: bool) -> Style {
    if focused { Style::default().fg(Color::Yellow) } else { Style::default() }
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let input = Paragraph::new(input_with_cursor(app))
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(app.pane == Pane::Search))
                .title(format!("Search City (Mode: {})", mode_name(app.mode))),
        );

    if !(app.show_suggestions && !app.suggestions.is_empty()) {
        f.render_widget(input, area);
        return;
    }

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);
    f.render_widget(input, parts[0]);

    let items: Vec<ListItem> = app
        .suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let style = if i == app.selected_suggestion {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(s.label()).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Suggestions (Up/Down to select, Tab to accept)"),
    );
    f.render_widget(list, parts[1]);
}

fn draw_report(f: &mut Frame, app: &App, area: Rect) {
    let Some(report) = &app.report else {
        return;
    };

    let mut lines = Vec::new();
    for (label, value) in report_lines(report) {
        let value_style = match label {
            "Location" => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            "Condition" => Style::default().fg(Color::Yellow),
            "Temperature" => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            "Feels like" => Style::default().fg(Color::Green),
            _ => Style::default().fg(Color::White),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{label}: "), Style::default().fg(Color::Cyan)),
            Span::styled(value, value_style),
        ]));
    }

    let weather = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Weather Information (Press 'i' to search again, 'q' to quit)"),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(weather, area);
}

fn draw_history(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.pane == Pane::History;
    let items: Vec<ListItem> = app
        .history
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let style = if focused && i == app.selected_history {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(entry.query.as_str()).style(style)
        })
        .collect();

    let history = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(focused))
            .title("History (Tab to switch, j/k to navigate, Enter to load)"),
    );
    f.render_widget(history, area);
}
