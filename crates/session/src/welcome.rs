//! Timed greeting played once when a session starts.

use std::time::Duration;

use tracing::debug;

use crate::controller::WeakSession;

/// First welcome line.
pub const GREETING: &str = "👋 Hi! I'm your AI Calendar Assistant. I can help you:";
/// Second welcome line, listing what the assistant can do.
pub const CAPABILITIES: &str = "📅 Create calendar events\n🗑️ Delete events\n💬 Answer questions about your schedule\n\nTry asking me something!";

/// Delays between session start and each welcome line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WelcomeSchedule {
    /// Delay from start until the greeting.
    pub greeting_delay: Duration,
    /// Delay from the greeting until the capability summary.
    pub summary_delay: Duration,
}

impl Default for WelcomeSchedule {
    fn default() -> Self {
        Self {
            greeting_delay: Duration::from_millis(500),
            summary_delay: Duration::from_millis(800),
        }
    }
}

/// Appends both welcome lines, then offers the quick actions.
///
/// Stops at the first append the session refuses (disposed or dropped).
pub(crate) async fn play(session: WeakSession, schedule: WelcomeSchedule) {
    tokio::time::sleep(schedule.greeting_delay).await;
    if !session.append_welcome(GREETING) {
        debug!("Session gone before greeting; welcome skipped");
        return;
    }

    tokio::time::sleep(schedule.summary_delay).await;
    if !session.append_welcome(CAPABILITIES) {
        debug!("Session gone before capability summary; welcome cut short");
        return;
    }

    session.offer_quick_actions();
}
