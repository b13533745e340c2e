use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::claude::AuxStatus;
use crate::picker::{Mode, Picker, RowView};

const EXPANDED_ICON: &str = "▾";
const COLLAPSED_ICON: &str = "▸";
const LAST_ICON: &str = "↩";
const AGE_WIDTH: usize = 8;

/// Main render function
pub fn draw(f: &mut Frame, picker: &Picker) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Min(0),    // Rows
            Constraint::Length(1), // Message / input
            Constraint::Length(1), // Help
        ])
        .split(f.area());

    render_header(f, chunks[0], picker);
    render_rows(f, chunks[1], picker);
    render_message(f, chunks[2], picker);
    render_help(f, chunks[3], picker);
}

fn render_header(f: &mut Frame, area: Rect, picker: &Picker) {
    let mut spans = vec![Span::styled(
        " tsm",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if !picker.filter().is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("/{}", picker.filter()),
            Style::default().fg(Color::Yellow),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_rows(f: &mut Frame, area: Rect, picker: &Picker) {
    let views = picker.row_views(Utc::now());

    if views.is_empty() {
        let text = if picker.filter().is_empty() {
            "  No other sessions available"
        } else {
            "  No sessions matching filter"
        };
        let empty = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
        f.render_widget(empty, area);
        return;
    }

    let name_width = picker.name_width();
    let items: Vec<ListItem> = views
        .iter()
        .map(|view| ListItem::new(row_line(view, name_width)))
        .collect();

    let mut state = ListState::default().with_selected(Some(picker.cursor()));
    f.render_stateful_widget(List::new(items), area, &mut state);
}

fn row_line(view: &RowView, name_width: usize) -> Line<'static> {
    let selected_style = Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD);

    match view {
        RowView::Session {
            number,
            name,
            age,
            status,
            expanded,
            last_used,
            selected,
        } => {
            let label_style = if *selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let pad = name_width.saturating_sub(name.width());
            let padded = format!("{name}{}", " ".repeat(pad));

            let mut spans = vec![
                Span::raw(" "),
                Span::styled(format!("{number}"), label_style),
                Span::raw(" "),
                Span::styled(
                    if *last_used { LAST_ICON } else { " " },
                    Style::default().fg(Color::Magenta),
                ),
                Span::raw(" "),
                Span::styled(
                    if *expanded { EXPANDED_ICON } else { COLLAPSED_ICON },
                    Style::default().fg(Color::Magenta),
                ),
                Span::raw(" "),
                Span::styled(
                    padded,
                    if *selected {
                        selected_style
                    } else {
                        Style::default()
                    },
                ),
                Span::raw("  "),
                Span::styled(
                    format!("{age:<AGE_WIDTH$}"),
                    Style::default().fg(Color::DarkGray),
                ),
            ];
            if let Some(status) = status {
                spans.push(Span::raw(" "));
                spans.push(status_badge(status));
            }
            Line::from(spans)
        }
        RowView::Window {
            index,
            name,
            selected,
        } => Line::from(vec![
            Span::raw("        "),
            Span::styled(
                format!("{index}: {name}"),
                if *selected {
                    selected_style
                } else {
                    Style::default()
                },
            ),
        ]),
    }
}

fn status_badge(status: &AuxStatus) -> Span<'static> {
    match status.state.as_str() {
        "new" => Span::styled("✦ new", Style::default().fg(Color::Cyan)),
        "working" => Span::styled("● working", Style::default().fg(Color::Yellow)),
        "waiting" => Span::styled(
            "! waiting",
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        ),
        other => Span::styled(other.to_string(), Style::default().fg(Color::DarkGray)),
    }
}

fn render_message(f: &mut Frame, area: Rect, picker: &Picker) {
    if let Some(prompt) = picker.mode().confirm_prompt() {
        let line = Paragraph::new(format!(" {prompt}")).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
        f.render_widget(line, area);
        return;
    }

    if let Some(message) = picker.message() {
        let style = if message.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        // Validation errors share the line with the input in create mode
        if picker.mode().create_input().is_none() {
            f.render_widget(
                Paragraph::new(format!(" {}", message.text)).style(style),
                area,
            );
            return;
        }
    }

    if let Some(input) = picker.mode().create_input() {
        const PROMPT: &str = " New session: ";
        let mut spans = vec![
            Span::styled(PROMPT, Style::default().fg(Color::Cyan)),
            Span::raw(input.text().to_string()),
        ];
        if let Some(message) = picker.message().filter(|m| m.is_error) {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                message.text.clone(),
                Style::default().fg(Color::Red),
            ));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);

        let before_cursor: usize = input
            .text()
            .chars()
            .take(input.cursor_char_pos())
            .collect::<String>()
            .width();
        let offset = u16::try_from(PROMPT.width() + before_cursor).unwrap_or(u16::MAX);
        let x = area.x.saturating_add(offset);
        f.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
        return;
    }

    if picker.is_loading_windows() {
        f.render_widget(
            Paragraph::new(" loading windows…").style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }
}

fn render_help(f: &mut Frame, area: Rect, picker: &Picker) {
    let keys = picker.keys();
    let pairs: Vec<(String, &str)> = match picker.mode() {
        Mode::Normal if !picker.filter().is_empty() => vec![
            ("type".to_string(), "filter"),
            (keys.label("select"), "switch"),
            (keys.label("cancel"), "clear"),
        ],
        Mode::Normal => vec![
            (format!("{}/{}", keys.label("up"), keys.label("down")), "move"),
            (keys.label("expand"), "expand"),
            (keys.label("collapse"), "collapse"),
            (keys.label("select"), "switch"),
            ("1-9".to_string(), "jump"),
            (keys.label("kill"), "kill"),
            (keys.label("create"), "new"),
            (keys.label("cancel"), "quit"),
        ],
        Mode::ConfirmKill { .. } => vec![
            (keys.label("confirm"), "confirm"),
            (keys.label("cancel"), "cancel"),
        ],
        Mode::Create { .. } => vec![
            ("enter".to_string(), "create"),
            (keys.label("cancel"), "cancel"),
        ],
    };

    let mut spans = vec![Span::raw(" ")];
    for (key, what) in pairs {
        spans.push(Span::styled(key, Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(
            format!(":{what}  "),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::picker::{Event, PickerOptions};
    use crate::tmux::Session;

    fn render(picker: &Picker) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        terminal.draw(|f| draw(f, picker)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_renders_rows_and_filter() {
        let mut picker = Picker::new(PickerOptions::new("/"));
        picker.handle(Event::SessionsLoaded {
            sessions: vec![
                Session::new("alpha", Utc::now()),
                Session::new("beta", Utc::now()),
            ],
            statuses: HashMap::new(),
        });
        let screen = render(&picker);
        assert!(screen.contains("1 ↩ ▸ alpha"));
        assert!(screen.contains("2   ▸ beta"));

        picker.handle(Event::key(crossterm::event::KeyCode::Char('z')));
        let screen = render(&picker);
        assert!(screen.contains("/z"));
        assert!(screen.contains("No sessions matching filter"));
    }

    #[test]
    fn test_renders_confirm_prompt() {
        let mut picker = Picker::new(PickerOptions::new("/"));
        picker.handle(Event::SessionsLoaded {
            sessions: vec![Session::new("alpha", Utc::now())],
            statuses: HashMap::new(),
        });
        picker.request_kill();
        let screen = render(&picker);
        assert!(screen.contains("Kill \"alpha\"?"));
        assert!(screen.contains("y:confirm"));
    }

    #[test]
    fn test_create_cursor_stays_inside_narrow_line() {
        let mut picker = Picker::new(PickerOptions::new("/"));
        picker.enter_create();
        for c in "a-rather-long-session-name".chars() {
            picker.handle(Event::key(crossterm::event::KeyCode::Char(c)));
        }

        let mut terminal = Terminal::new(TestBackend::new(20, 6)).unwrap();
        terminal.draw(|f| draw(f, &picker)).unwrap();
        let cursor = terminal.get_cursor_position().unwrap();
        assert_eq!(cursor.x, 19);
        assert_eq!(cursor.y, 4);
    }
}
