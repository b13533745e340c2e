use chrono::{DateTime, Utc};
use unicode_width::UnicodeWidthStr;

use crate::claude::AuxStatus;

use super::controller::Picker;
use super::rows::Row;

/// Display data for one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowView {
    Session {
        /// 1-based position among visible sessions; what a digit jumps to
        number: usize,
        name: String,
        age: String,
        status: Option<AuxStatus>,
        expanded: bool,
        /// First visible session, i.e. the most recently used one
        last_used: bool,
        selected: bool,
    },
    Window {
        index: u32,
        name: String,
        selected: bool,
    },
}

/// Coarse relative age: `42s ago`, `5m ago`, `3h ago`, `2d ago`
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{s}s ago"),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s => format!("{}d ago", s / 86_400),
    }
}

impl Picker {
    /// Rows as the renderer should show them. Numbers are recomputed from
    /// the current filtered sequence on every call.
    pub fn row_views(&self, now: DateTime<Utc>) -> Vec<RowView> {
        let mut number = 0;

        self.rows()
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let selected = i == self.cursor();
                match *row {
                    Row::Session { session } => {
                        let s = self.sessions().get(session)?;
                        number += 1;
                        Some(RowView::Session {
                            number,
                            name: s.name.clone(),
                            age: format_time_ago(s.last_activity, now),
                            status: self.status(&s.name).cloned(),
                            expanded: s.expanded,
                            last_used: number == 1,
                            selected,
                        })
                    }
                    Row::Window { session, window } => {
                        let w = self.sessions().get(session)?.windows.get(window)?;
                        Some(RowView::Window {
                            index: w.index,
                            name: w.name.clone(),
                            selected,
                        })
                    }
                }
            })
            .collect()
    }

    /// Display width of the widest session name, for column alignment
    pub fn name_width(&self) -> usize {
        self.sessions()
            .iter()
            .map(|s| s.name.width())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Duration;
    use crossterm::event::KeyCode;

    use super::*;
    use crate::picker::{Event, PickerOptions};
    use crate::tmux::{Session, Window};

    #[test]
    fn test_format_time_ago() {
        let now = Utc::now();
        assert_eq!(format_time_ago(now, now), "0s ago");
        assert_eq!(format_time_ago(now - Duration::seconds(59), now), "59s ago");
        assert_eq!(format_time_ago(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_time_ago(now - Duration::hours(23), now), "23h ago");
        assert_eq!(format_time_ago(now - Duration::days(3), now), "3d ago");
        // Clock skew never yields negative ages
        assert_eq!(format_time_ago(now + Duration::seconds(30), now), "0s ago");
    }

    #[test]
    fn test_row_views_number_filtered_sessions() {
        let now = Utc::now();
        let mut picker = Picker::new(PickerOptions::new("/"));
        let mut statuses = HashMap::new();
        statuses.insert(
            "beta".to_string(),
            AuxStatus {
                state: "working".to_string(),
                timestamp: now,
            },
        );
        picker.handle(Event::SessionsLoaded {
            sessions: vec![
                Session::new("alpha", now - Duration::minutes(2)),
                Session::new("beta", now),
                Session::new("日本語", now),
            ],
            statuses,
        });
        assert_eq!(picker.name_width(), 6);

        picker.handle(Event::key(KeyCode::Char('b')));
        let views = picker.row_views(now);
        assert_eq!(views.len(), 1);
        match &views[0] {
            RowView::Session {
                number,
                name,
                status,
                last_used,
                selected,
                ..
            } => {
                assert_eq!(*number, 1);
                assert_eq!(name, "beta");
                assert_eq!(status.as_ref().map(|s| s.state.as_str()), Some("working"));
                assert!(*last_used);
                assert!(*selected);
            }
            other => panic!("unexpected row {other:?}"),
        }
    }

    #[test]
    fn test_row_views_include_windows() {
        let now = Utc::now();
        let mut picker = Picker::new(PickerOptions::new("/"));
        picker.handle(Event::SessionsLoaded {
            sessions: vec![Session::new("alpha", now), Session::new("beta", now)],
            statuses: HashMap::new(),
        });
        picker.expand();
        picker.handle(Event::WindowsLoaded {
            session: "alpha".into(),
            windows: vec![Window::new(1, "edit")],
        });
        picker.move_down();

        let views = picker.row_views(now);
        assert_eq!(views.len(), 3);
        assert!(matches!(&views[0], RowView::Session { expanded: true, number: 1, .. }));
        assert_eq!(
            views[1],
            RowView::Window {
                index: 1,
                name: "edit".into(),
                selected: true
            }
        );
        assert!(matches!(
            &views[2],
            RowView::Session { number: 2, last_used: false, .. }
        ));
    }
}
