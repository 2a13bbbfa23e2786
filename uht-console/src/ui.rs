use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
};
use uht_admin::prelude::*;

use super::app::{App, ListRow};

const HELP_TEXT: &[(&str, &str)] = &[
    ("j / Down", "Move down"),
    ("k / Up", "Move up"),
    ("g / G", "Jump to first / last"),
    ("Enter / l", "Expand or collapse object"),
    ("Space", "Check or uncheck"),
    ("a", "Toggle all fields"),
    ("s", "Save configuration"),
    ("c", "Cancel (reload from server)"),
    ("Esc", "Dismiss notification"),
    ("?", "Toggle help"),
    ("q", "Quit"),
];

pub fn draw<G: Gateway + 'static>(frame: &mut Frame, app: &mut App<G>) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, app, outer[0]);
    draw_objects(frame, app, outer[1]);
    draw_footer(frame, app, outer[2]);
    draw_toasts(frame, app, outer[1]);

    if app.console.is_saving() {
        draw_saving_overlay(frame, frame.area());
    }
    if app.show_help {
        draw_help_overlay(frame, frame.area());
    }
}

fn draw_header<G: Gateway + 'static>(frame: &mut Frame, app: &App<G>, area: Rect) {
    let mut status = format!(
        " Tracked Objects | {} objects selected",
        app.console.summary()
    );
    if app.console.has_changes() {
        status.push_str(" | unsaved changes");
    }
    let bar = Paragraph::new(status).style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(bar, area);
}

fn draw_objects<G: Gateway + 'static>(frame: &mut Frame, app: &mut App<G>, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Objects ");

    if app.console.is_loading() && app.console.store().is_empty() {
        let loading = Paragraph::new("Loading objects...")
            .style(Style::default().fg(Color::Yellow))
            .block(block);
        frame.render_widget(loading, area);
        return;
    }
    if app.console.store().is_empty() {
        let empty = Paragraph::new("No objects available for tracking.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = app
        .rows()
        .iter()
        .filter_map(|row| list_row(&app.console, row))
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Percentage(35),
            Constraint::Percentage(35),
            Constraint::Min(10),
        ],
    )
    .block(block)
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

fn list_row<G: Gateway + 'static>(
    console: &Console<G, NotificationLog>,
    row: &ListRow,
) -> Option<Row<'static>> {
    let obj = console.object(row.object())?;
    let dim = Style::default().fg(Color::DarkGray);
    let row = match row {
        ListRow::Object(_) => {
            let marker = if obj.is_expanded { "-" } else { "+" };
            let mut badges = Vec::new();
            if obj.is_custom {
                badges.push(Span::styled("Custom ", Style::default().fg(Color::Magenta)));
            }
            if obj.is_tracked_baseline {
                badges.push(Span::styled("Tracked", Style::default().fg(Color::Green)));
            }
            Row::new(vec![
                Cell::from(format!("{marker} {}", checkbox(obj.is_selected))),
                Cell::from(obj.label.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(obj.api_name.clone()).style(dim),
                Cell::from(Line::from(badges)),
            ])
        }
        ListRow::FieldsHeader(_) => {
            let total = obj.field_count();
            let action_style = if obj.fields_editable() {
                Style::default().fg(Color::Cyan)
            } else {
                dim
            };
            Row::new(vec![
                Cell::from(""),
                Cell::from(format!("  {total} trackable fields")).style(dim),
                Cell::from(format!(
                    "{} of {total} fields selected",
                    obj.selected_field_count()
                ))
                .style(dim),
                Cell::from("[Toggle All Fields]").style(action_style),
            ])
        }
        ListRow::Field { field, .. } => {
            let field = obj.field(field)?;
            let style = if obj.fields_editable() {
                Style::default()
            } else {
                dim
            };
            Row::new(vec![
                Cell::from(format!("  {}", checkbox(field.is_selected))).style(style),
                Cell::from(format!("  {}", field.label)).style(style),
                Cell::from(field.api_name.clone()).style(dim),
                Cell::from(field.field_type.to_string()).style(dim),
            ])
        }
        ListRow::FieldsStatus(_) => {
            let (text, style) = match &obj.fields {
                FieldState::Failed { message } => (
                    format!("  Error loading fields: {message}"),
                    Style::default().fg(Color::Red),
                ),
                _ => (
                    "  Loading fields...".to_string(),
                    Style::default().fg(Color::Yellow),
                ),
            };
            Row::new(vec![Cell::from(""), Cell::from(text).style(style)])
        }
    };
    Some(row)
}

fn draw_footer<G: Gateway + 'static>(frame: &mut Frame, app: &App<G>, area: Rect) {
    let key = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let save_style = if app.console.save_enabled() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let line = Line::from(vec![
        Span::styled(" c", key),
        Span::raw(" Cancel   "),
        Span::styled("s", key),
        Span::styled(format!(" {SAVE_LABEL}"), save_style),
        Span::styled(
            "   Space:check  Enter:expand  a:all fields  ?:help  q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

#[allow(clippy::cast_possible_truncation)]
fn draw_toasts<G: Gateway + 'static>(frame: &mut Frame, app: &App<G>, area: Rect) {
    let width = 48u16.min(area.width.saturating_sub(2));
    let mut y = area.y + 1;
    for toast in app.toasts.iter().rev() {
        let notice = &toast.notification;
        let color = match notice.variant {
            Variant::Success => Color::Green,
            Variant::Error => Color::Red,
            Variant::Info => Color::Blue,
        };
        let inner_width = width.saturating_sub(2).max(1) as usize;
        let lines = notice.message.chars().count().div_ceil(inner_width).max(1) as u16;
        let height = (lines + 2).min(6);
        if y + height > area.y + area.height {
            break;
        }
        let x = area.x + area.width.saturating_sub(width + 1);
        let toast_area = Rect::new(x, y, width, height);
        frame.render_widget(Clear, toast_area);
        let widget = Paragraph::new(notice.message.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", notice.title))
                    .border_style(Style::default().fg(color)),
            );
        frame.render_widget(widget, toast_area);
        y += height;
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn draw_saving_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered(area, 30, 3);
    frame.render_widget(Clear, popup_area);
    let saving = Paragraph::new("Saving...")
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(saving, popup_area);
}

#[allow(clippy::cast_possible_truncation)]
fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered(area, 56, HELP_TEXT.len() as u16 + 4);

    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line> = HELP_TEXT
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(
                    format!("  {key:<18}"),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(*desc),
            ])
        })
        .collect();

    let help = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Keybindings ")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(help, popup_area);
}
