use crate::tmux::Session;

/// One addressable line of the list, by position into the session slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Session { session: usize },
    Window { session: usize, window: usize },
}

impl Row {
    pub fn session_index(&self) -> usize {
        match *self {
            Row::Session { session } | Row::Window { session, .. } => session,
        }
    }

    pub fn is_session(&self) -> bool {
        matches!(self, Row::Session { .. })
    }
}

/// Case-insensitive substring test; an empty filter matches everything.
pub fn matches_filter(name: &str, filter: &str) -> bool {
    filter.is_empty() || name.to_lowercase().contains(&filter.to_lowercase())
}

/// Flatten sessions into rows: every session passing `filter`, followed by
/// its windows when expanded. Source order is kept; nothing is sorted.
pub fn rebuild(sessions: &[Session], filter: &str) -> Vec<Row> {
    let mut rows = Vec::new();

    for (i, session) in sessions.iter().enumerate() {
        if !matches_filter(&session.name, filter) {
            continue;
        }

        rows.push(Row::Session { session: i });

        if session.expanded {
            rows.extend((0..session.windows.len()).map(|w| Row::Window {
                session: i,
                window: w,
            }));
        }
    }

    rows
}

/// Clamp a cursor into `[0, len)`, or 0 when there are no rows.
pub fn clamp_cursor(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::tmux::Window;

    fn sessions(names: &[&str]) -> Vec<Session> {
        names.iter().map(|n| Session::new(*n, Utc::now())).collect()
    }

    #[test]
    fn test_empty_filter_keeps_source_order() {
        let s = sessions(&["gamma", "alpha", "beta"]);
        let rows = rebuild(&s, "");
        assert_eq!(
            rows,
            vec![
                Row::Session { session: 0 },
                Row::Session { session: 1 },
                Row::Session { session: 2 },
            ]
        );
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let s = sessions(&["Dotfiles", "work", "notes"]);
        let rows = rebuild(&s, "OT");
        let names: Vec<&str> = rows.iter().map(|r| s[r.session_index()].name.as_str()).collect();
        assert_eq!(names, vec!["Dotfiles", "notes"]);

        // Not a subsequence match
        assert!(rebuild(&s, "wk").is_empty());
    }

    #[test]
    fn test_windows_follow_expanded_parent_only() {
        let mut s = sessions(&["alpha", "beta"]);
        s[0].windows = vec![Window::new(1, "edit"), Window::new(2, "run")];
        s[1].windows = vec![Window::new(1, "logs")];
        s[0].expanded = true;

        let rows = rebuild(&s, "");
        assert_eq!(
            rows,
            vec![
                Row::Session { session: 0 },
                Row::Window { session: 0, window: 0 },
                Row::Window { session: 0, window: 1 },
                Row::Session { session: 1 },
            ]
        );

        // Windows are hidden with their filtered-out parent, whatever their names
        s[0].windows[0].name = "beta".to_string();
        assert_eq!(rebuild(&s, "beta"), vec![Row::Session { session: 1 }]);
    }

    #[test]
    fn test_every_session_row_matches_filter() {
        let mut s = sessions(&["api", "Apple", "web", "zap", "misc"]);
        s[1].expanded = true;
        s[1].windows = vec![Window::new(3, "x")];
        for filter in ["", "a", "AP", "p", "zz", "web"] {
            for row in rebuild(&s, filter) {
                let parent = &s[row.session_index()];
                assert!(matches_filter(&parent.name, filter));
                if !row.is_session() {
                    assert!(parent.expanded);
                }
            }
        }
    }

    #[test]
    fn test_clamp_cursor() {
        assert_eq!(clamp_cursor(0, 0), 0);
        assert_eq!(clamp_cursor(5, 0), 0);
        assert_eq!(clamp_cursor(5, 3), 2);
        assert_eq!(clamp_cursor(1, 3), 1);
    }
}
