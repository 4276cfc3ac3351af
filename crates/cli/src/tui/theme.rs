//! Centralized TUI theme built on ratatui's Tailwind CSS palette.

use proto::MessageTone;
use ratatui::style::Color;
use ratatui::style::palette::tailwind;

/// The application theme; all visual tokens in one place.
pub struct Theme {
    // ── Base ──
    /// Primary foreground/text color.
    pub fg: Color,
    /// Muted foreground for hints and placeholders.
    pub fg_muted: Color,
    /// Default border color for panels.
    pub border: Color,
    /// Border color for the input box while it accepts text.
    pub border_active: Color,

    // ── Accent / Brand ──
    /// Title bar brand color.
    pub accent: Color,

    // ── Semantic ──
    /// Endpoint-reported errors.
    pub error: Color,
    /// Transport failures.
    pub warning: Color,
    /// Informational notices such as the sign-in prompt.
    pub info: Color,

    // ── Chat roles ──
    /// Label color for user messages.
    pub user_label: Color,
    /// Label color for assistant messages.
    pub assistant_label: Color,

    // ── Status bar ──
    /// Typing spinner color.
    pub status_spinner: Color,
    /// Keybinding hint color.
    pub status_hint: Color,
    /// Quick-action key labels.
    pub quick_action_key: Color,
}

impl Theme {
    /// The default dark theme using Tailwind palette.
    pub const fn default_dark() -> Self {
        Self {
            fg: tailwind::SLATE.c100,
            fg_muted: tailwind::SLATE.c500,
            border: tailwind::SLATE.c700,
            border_active: tailwind::SKY.c500,

            accent: tailwind::SKY.c400,

            error: tailwind::RED.c500,
            warning: tailwind::AMBER.c500,
            info: tailwind::BLUE.c400,

            user_label: tailwind::CYAN.c400,
            assistant_label: tailwind::BLUE.c400,

            status_spinner: tailwind::AMBER.c400,
            status_hint: tailwind::SLATE.c500,
            quick_action_key: tailwind::EMERALD.c400,
        }
    }

    /// Body text color for a message of the given tone.
    pub const fn tone_color(&self, tone: MessageTone) -> Color {
        match tone {
            MessageTone::Normal => self.fg,
            MessageTone::Info => self.info,
            MessageTone::Error => self.error,
            MessageTone::Warning => self.warning,
        }
    }
}

/// Global theme instance.
pub const THEME: Theme = Theme::default_dark();
