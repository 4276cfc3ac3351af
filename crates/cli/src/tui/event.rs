//! Async event loop for the TUI: crossterm input, session updates, and spinner ticks.

use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use session::{ChatSession, SubmitOutcome};
use tracing::debug;

use super::app::{TuiApp, UserAction};

/// Restores the terminal when the TUI exits, including on error paths.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
    }
}

/// Runs a submission in the background; the loop learns the result from session updates.
fn spawn_submit(session: &ChatSession, action: UserAction) {
    let session = session.clone();
    tokio::spawn(async move {
        let outcome = match action {
            UserAction::Submit(text) => session.submit(&text).await,
            UserAction::QuickAction(index) => session.submit_quick_action(index).await,
            UserAction::Quit => return,
        };
        if let SubmitOutcome::Rejected(reason) = outcome {
            debug!(?reason, "TUI submission rejected");
        }
    });
}

/// Run the full-screen TUI until the user quits.
///
/// The session is disposed on exit so pending welcome lines never fire.
pub async fn run_tui(
    session: ChatSession,
    endpoint_label: String,
    login_url: String,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    debug!(session = %session.id(), endpoint = %endpoint_label, "TUI started");

    let mut app = TuiApp::new(session.id().clone(), endpoint_label, login_url);
    let mut updates = session.subscribe();
    app.apply_snapshot(updates.borrow_and_update().clone());

    let mut crossterm_stream = EventStream::new();

    // Spinner tick interval (100ms)
    let mut spinner_interval = tokio::time::interval(std::time::Duration::from_millis(100));
    spinner_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        terminal.draw(|frame| app.render(frame))?;

        let busy = app.snapshot.pending;
        tokio::select! {
            maybe_event = crossterm_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        match app.handle_key(key) {
                            Some(UserAction::Quit) => break,
                            Some(action) => spawn_submit(&session, action),
                            None => {}
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        session.dispose();
                        return Err(e.into());
                    }
                    None => break,
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                app.apply_snapshot(updates.borrow_and_update().clone());
            }
            _ = spinner_interval.tick(), if busy => {
                app.tick();
            }
        }
    }

    session.dispose();
    debug!(session = %session.id(), "TUI stopped");
    Ok(())
}
