//! TUI application state, rendering, and input handling.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use proto::{Author, SessionId};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use session::{QUICK_ACTIONS, SessionSnapshot};
use unicode_width::UnicodeWidthStr;

use super::theme::THEME;

/// Spinner animation frames (Braille pattern).
const SPINNER: &[char] = &['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];

const USER_LABEL: &str = "You: ";
const ASSISTANT_LABEL: &str = "Assistant: ";

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Submit typed text to the session.
    Submit(String),
    /// Submit the quick-action prompt at this index.
    QuickAction(usize),
    /// Leave the TUI.
    Quit,
}

// ─── TuiApp ──────────────────────────────────────────────────

/// View state for one TUI session. Session state itself is read-only here.
pub struct TuiApp {
    /// Latest state published by the chat session.
    pub snapshot: SessionSnapshot,
    /// Current text typed in the input box (not yet submitted).
    pub input: String,
    /// Cursor position within `input` (byte offset).
    pub cursor_pos: usize,
    /// Lines scrolled up from the bottom of the history panel.
    pub history_scroll: u16,
    /// Session identifier shown in the title bar.
    pub session_id: SessionId,
    /// Endpoint address shown in the title bar.
    pub endpoint_label: String,
    /// Where the user can sign in once the endpoint asks for it.
    pub login_url: String,
    /// Spinner animation tick counter.
    pub spinner_tick: u8,
}

impl TuiApp {
    /// Create a new TUI application state.
    pub fn new(
        session_id: SessionId,
        endpoint_label: impl Into<String>,
        login_url: impl Into<String>,
    ) -> Self {
        Self {
            snapshot: SessionSnapshot::default(),
            input: String::new(),
            cursor_pos: 0,
            history_scroll: 0,
            session_id,
            endpoint_label: endpoint_label.into(),
            login_url: login_url.into(),
            spinner_tick: 0,
        }
    }

    // ── State mutations ──────────────────────────────────────

    /// Replace the displayed session state. New messages snap back to the bottom.
    pub fn apply_snapshot(&mut self, snapshot: SessionSnapshot) {
        if snapshot.transcript.len() != self.snapshot.transcript.len() {
            self.history_scroll = 0;
        }
        self.snapshot = snapshot;
    }

    /// Advance the typing spinner by one frame.
    pub fn tick(&mut self) {
        self.spinner_tick = self.spinner_tick.wrapping_add(1);
    }

    /// `true` while the session accepts input.
    pub fn accepts_input(&self) -> bool {
        self.snapshot.is_idle()
    }

    /// Take the current input if it can be submitted, resetting the box.
    ///
    /// Blank input or a busy session leaves the text in place.
    pub fn take_input(&mut self) -> Option<String> {
        if !self.accepts_input() || self.input.trim().is_empty() {
            return None;
        }
        self.cursor_pos = 0;
        let text = std::mem::take(&mut self.input);
        Some(text.trim().to_string())
    }

    // ── Input handling ───────────────────────────────────────

    /// Handle a keyboard event.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<UserAction> {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Esc) => {
                return Some(UserAction::Quit);
            }
            (_, KeyCode::Enter) => {
                if is_quit_command(self.input.trim()) {
                    return Some(UserAction::Quit);
                }
                return self.take_input().map(UserAction::Submit);
            }
            (_, KeyCode::F(n)) => {
                let index = usize::from(n).checked_sub(1)?;
                if self.snapshot.quick_actions_visible
                    && self.accepts_input()
                    && index < QUICK_ACTIONS.len()
                {
                    return Some(UserAction::QuickAction(index));
                }
            }
            (_, KeyCode::Char(c)) if self.accepts_input() => {
                self.input.insert(self.cursor_pos, c);
                self.cursor_pos += c.len_utf8();
            }
            (_, KeyCode::Backspace) if self.accepts_input() => {
                if self.cursor_pos > 0 {
                    let prev = self.prev_boundary();
                    self.input.drain(prev..self.cursor_pos);
                    self.cursor_pos = prev;
                }
            }
            (_, KeyCode::Left) if self.accepts_input() => {
                self.cursor_pos = self.prev_boundary();
            }
            (_, KeyCode::Right) if self.accepts_input() => {
                if self.cursor_pos < self.input.len() {
                    self.cursor_pos = self.input[self.cursor_pos..]
                        .char_indices()
                        .nth(1)
                        .map(|(i, _)| self.cursor_pos + i)
                        .unwrap_or(self.input.len());
                }
            }
            (_, KeyCode::Up) => {
                self.history_scroll = self.history_scroll.saturating_add(1);
            }
            (_, KeyCode::Down) => {
                self.history_scroll = self.history_scroll.saturating_sub(1);
            }
            (_, KeyCode::PageUp) => {
                self.history_scroll = self.history_scroll.saturating_add(10);
            }
            (_, KeyCode::PageDown) => {
                self.history_scroll = self.history_scroll.saturating_sub(10);
            }
            _ => {}
        }
        None
    }

    fn prev_boundary(&self) -> usize {
        self.input[..self.cursor_pos]
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    // ── Rendering ────────────────────────────────────────────

    /// Render the entire TUI into the given frame.
    pub fn render(&self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let quick_height = u16::from(self.snapshot.quick_actions_visible);

        // Layout: title(1) | history(fill) | quick actions(0/1) | status(1) | input(3)
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(quick_height),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(area);

        self.render_title(frame, chunks[0]);
        self.render_history(frame, chunks[1]);
        if quick_height > 0 {
            self.render_quick_actions(frame, chunks[2]);
        }
        self.render_status(frame, chunks[3]);
        self.render_input(frame, chunks[4]);
    }

    fn render_title(&self, frame: &mut Frame<'_>, area: Rect) {
        let session_prefix = session_prefix(&self.session_id);
        let title = Line::from(vec![
            Span::styled(
                " calchat ",
                Style::default()
                    .fg(THEME.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" session:{session_prefix} "),
                Style::default().fg(THEME.fg_muted),
            ),
            Span::styled(
                format!(" {} ", self.endpoint_label),
                Style::default().fg(THEME.fg_muted),
            ),
        ]);
        frame.render_widget(Paragraph::new(title), area);
    }

    fn render_history(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut lines = transcript_lines(&self.snapshot);
        if self.snapshot.typing {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(
                    ASSISTANT_LABEL,
                    Style::default()
                        .fg(THEME.assistant_label)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{} typing…", self.spinner_frame()),
                    Style::default().fg(THEME.status_spinner),
                ),
            ]));
        }

        let inner_width = area.width.saturating_sub(2);
        let visible_height = area.height.saturating_sub(2);
        let max_scroll = wrapped_height(&lines, inner_width).saturating_sub(visible_height);
        let scroll = max_scroll.saturating_sub(self.history_scroll);

        let history = Paragraph::new(Text::from(lines))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(THEME.border)),
            )
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0));
        frame.render_widget(history, area);
    }

    fn render_quick_actions(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut spans = vec![Span::styled(" Try: ", Style::default().fg(THEME.fg_muted))];
        for (i, action) in QUICK_ACTIONS.iter().enumerate() {
            spans.push(Span::styled(
                format!("F{} ", i + 1),
                Style::default()
                    .fg(THEME.quick_action_key)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(*action, Style::default().fg(THEME.fg)));
            spans.push(Span::raw("  "));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut spans = Vec::new();
        if self.snapshot.pending {
            spans.push(Span::styled(
                format!(" {} Sending...", self.spinner_frame()),
                Style::default().fg(THEME.status_spinner),
            ));
        } else {
            spans.push(Span::styled(
                " Enter:send  ↑↓/PgUp/PgDn:scroll  Esc:quit",
                Style::default().fg(THEME.status_hint),
            ));
        }
        if self.snapshot.login_visible {
            spans.push(Span::styled(
                format!("   🔐 Sign in: {}", self.login_url),
                Style::default().fg(THEME.info).add_modifier(Modifier::BOLD),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_input(&self, frame: &mut Frame<'_>, area: Rect) {
        let active = self.accepts_input();
        let border_color = if active {
            THEME.border_active
        } else {
            THEME.border
        };

        let (display_text, input_style) = if self.input.is_empty() && active {
            ("Ask me about your calendar...", Style::default().fg(THEME.fg_muted))
        } else {
            (self.input.as_str(), Style::default().fg(THEME.fg))
        };

        let input = Paragraph::new(Span::styled(display_text, input_style)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(" Message "),
        );
        frame.render_widget(input, area);

        if active {
            let cursor_col = self.input[..self.cursor_pos].width() as u16;
            frame.set_cursor_position((area.x + 1 + cursor_col, area.y + 1));
        }
    }

    fn spinner_frame(&self) -> char {
        SPINNER[(self.spinner_tick as usize) % SPINNER.len()]
    }
}

/// Builds history lines for every transcript entry, in display order.
pub fn transcript_lines(snapshot: &SessionSnapshot) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for msg in &snapshot.transcript {
        let (label, label_color) = match msg.author {
            Author::User => (USER_LABEL, THEME.user_label),
            Author::Assistant => (ASSISTANT_LABEL, THEME.assistant_label),
        };
        let body_style = Style::default().fg(THEME.tone_color(msg.tone));
        let indent = " ".repeat(label.width());

        lines.push(Line::from(""));
        for (i, text) in msg.text.lines().enumerate() {
            let lead = if i == 0 {
                Span::styled(
                    label,
                    Style::default()
                        .fg(label_color)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw(indent.clone())
            };
            lines.push(Line::from(vec![lead, Span::styled(text.to_string(), body_style)]));
        }
    }
    lines
}

/// Rows `lines` occupy when wrapped to `width` columns.
fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    let width = usize::from(width);
    let rows: usize = lines
        .iter()
        .map(|line| {
            let cols: usize = line.spans.iter().map(|s| s.content.width()).sum();
            cols.div_ceil(width).max(1)
        })
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// First eight characters of the session id, for the title bar.
fn session_prefix(id: &SessionId) -> String {
    id.as_str().chars().take(8).collect()
}

/// Returns true when input requests leaving the TUI.
fn is_quit_command(line: &str) -> bool {
    line == "/quit" || line == "/exit"
}

#[cfg(test)]
mod tests {
    use super::*;
    use proto::{Message, MessageId, MessageTone};
    use ratatui::{Terminal, backend::TestBackend};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> TuiApp {
        TuiApp::new(
            SessionId::from("0123456789abcdef"),
            "http://127.0.0.1:5000",
            "http://127.0.0.1:5000/login",
        )
    }

    fn type_text(app: &mut TuiApp, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn render_to_string(app: &TuiApp) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 24)).expect("terminal");
        terminal.draw(|frame| app.render(frame)).expect("draw");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn snapshot_with(messages: Vec<Message>) -> SessionSnapshot {
        SessionSnapshot {
            transcript: messages,
            ..SessionSnapshot::default()
        }
    }

    #[test]
    fn enter_submits_trimmed_input_and_clears_box() {
        let mut app = app();
        type_text(&mut app, "  hello ");
        assert_eq!(
            app.handle_key(key(KeyCode::Enter)),
            Some(UserAction::Submit("hello".to_string()))
        );
        assert!(app.input.is_empty());
        assert_eq!(app.cursor_pos, 0);
    }

    #[test]
    fn enter_on_blank_input_does_nothing() {
        let mut app = app();
        type_text(&mut app, "   ");
        assert_eq!(app.handle_key(key(KeyCode::Enter)), None);
        assert_eq!(app.input, "   ");
    }

    #[test]
    fn pending_session_blocks_typing_and_submit() {
        let mut app = app();
        type_text(&mut app, "hi");
        app.apply_snapshot(SessionSnapshot {
            pending: true,
            ..SessionSnapshot::default()
        });

        type_text(&mut app, "!!");
        assert_eq!(app.input, "hi");
        assert_eq!(app.handle_key(key(KeyCode::Enter)), None);
        assert_eq!(app.input, "hi");
    }

    #[test]
    fn quit_keys_and_commands() {
        let mut app = app();
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Some(UserAction::Quit));
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(UserAction::Quit)
        );

        type_text(&mut app, "/exit");
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Some(UserAction::Quit));
        assert!(is_quit_command("/quit"));
        assert!(!is_quit_command("/help"));
    }

    #[test]
    fn function_keys_pick_quick_actions_only_when_offered() {
        let mut app = app();
        assert_eq!(app.handle_key(key(KeyCode::F(1))), None);

        app.apply_snapshot(SessionSnapshot {
            quick_actions_visible: true,
            ..SessionSnapshot::default()
        });
        assert_eq!(
            app.handle_key(key(KeyCode::F(1))),
            Some(UserAction::QuickAction(0))
        );
        assert_eq!(
            app.handle_key(key(KeyCode::F(4))),
            Some(UserAction::QuickAction(3))
        );
        assert_eq!(app.handle_key(key(KeyCode::F(5))), None);
        assert_eq!(app.handle_key(key(KeyCode::F(0))), None);
    }

    #[test]
    fn cursor_moves_over_multibyte_chars() {
        let mut app = app();
        type_text(&mut app, "a→b");
        app.handle_key(key(KeyCode::Left));
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.cursor_pos, 1);
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.cursor_pos, 1 + '→'.len_utf8());
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.input, "ab");
        assert_eq!(app.cursor_pos, 1);
    }

    #[test]
    fn new_message_resets_scroll() {
        let mut app = app();
        app.handle_key(key(KeyCode::PageUp));
        assert_eq!(app.history_scroll, 10);

        app.apply_snapshot(snapshot_with(vec![Message::user(MessageId(1), "hi")]));
        assert_eq!(app.history_scroll, 0);
    }

    #[test]
    fn transcript_lines_label_and_indent_multiline_text() {
        let snapshot = snapshot_with(vec![
            Message::user(MessageId(1), "hi"),
            Message::assistant(MessageId(2), "line one\nline two", MessageTone::Normal),
        ]);
        let lines = transcript_lines(&snapshot);
        let rendered: Vec<String> = lines.iter().map(|l| l.to_string()).collect();

        assert_eq!(
            rendered,
            [
                "",
                "You: hi",
                "",
                "Assistant: line one",
                "           line two",
            ]
        );
    }

    #[test]
    fn session_prefix_counts_chars_not_bytes() {
        assert_eq!(session_prefix(&SessionId::from("0123456789abcdef")), "01234567");
        assert_eq!(session_prefix(&SessionId::from("séance-ünïcode")), "séance-ü");
        assert_eq!(session_prefix(&SessionId::from("日本")), "日本");

        let app = TuiApp::new(SessionId::from("ééééééééé-session"), "e", "l");
        assert!(render_to_string(&app).contains("session:éééééééé "));
    }

    #[test]
    fn wrapped_height_counts_wrapped_and_empty_rows() {
        let lines = vec![
            Line::from(""),
            Line::from("x".repeat(25)),
            Line::from("short"),
        ];
        assert_eq!(wrapped_height(&lines, 10), 1 + 3 + 1);
        assert_eq!(wrapped_height(&lines, 0), 0);
    }

    #[test]
    fn render_shows_typing_indicator_and_login_affordance() {
        let mut app = app();
        app.apply_snapshot(SessionSnapshot {
            transcript: vec![Message::user(MessageId(1), "Delete my 3pm event today")],
            pending: true,
            typing: true,
            login_visible: true,
            ..SessionSnapshot::default()
        });

        let screen = render_to_string(&app);
        assert!(screen.contains("typing"));
        assert!(screen.contains("Sending..."));
        assert!(screen.contains("Sign in: http://127.0.0.1:5000/login"));
    }

    #[test]
    fn render_lists_quick_actions_once_offered() {
        let mut app = app();
        assert!(!render_to_string(&app).contains("What's on my calendar?"));

        app.apply_snapshot(SessionSnapshot {
            quick_actions_visible: true,
            ..SessionSnapshot::default()
        });
        let screen = render_to_string(&app);
        assert!(screen.contains("F3"));
        assert!(screen.contains("What's on my calendar?"));
    }
}
