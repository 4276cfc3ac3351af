//! Chat session controller: transcript ownership and single-flight submission.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use proto::{AssistantReply, Message, MessageId, MessageTone, SessionId};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::endpoint::AssistantEndpoint;
use crate::quick_actions::quick_action;
use crate::welcome::{self, WelcomeSchedule};

/// Why a submission was refused without touching the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Text was empty after trimming.
    Empty,
    /// Another request is still in flight.
    Pending,
    /// The session has been torn down.
    Disposed,
    /// Quick-action index outside the catalogue.
    UnknownQuickAction(usize),
}

/// Result of [`ChatSession::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was ignored; nothing was appended and no request was sent.
    Rejected(RejectReason),
    /// Request completed with the given reply.
    Completed(AssistantReply),
}

/// Immutable view of session state published to renderers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// Messages in display order.
    pub transcript: Vec<Message>,
    /// A request is in flight.
    pub pending: bool,
    /// The "assistant is typing" placeholder should be shown.
    pub typing: bool,
    /// The sign-in affordance should be shown.
    pub login_visible: bool,
    /// The quick-action prompts should be shown.
    pub quick_actions_visible: bool,
    /// The session has been torn down.
    pub disposed: bool,
    /// Bumped on every state change; later snapshots carry larger values.
    pub revision: u64,
}

impl SessionSnapshot {
    /// Returns `true` when a new submission would be accepted.
    pub fn is_idle(&self) -> bool {
        !self.pending && !self.disposed
    }
}

#[derive(Debug)]
struct State {
    transcript: Vec<Message>,
    next_id: MessageId,
    pending: bool,
    typing: bool,
    login_visible: bool,
    quick_actions_visible: bool,
    welcome_started: bool,
    disposed: bool,
    revision: u64,
}

impl State {
    fn new() -> Self {
        Self {
            transcript: Vec::new(),
            next_id: MessageId(1),
            pending: false,
            typing: false,
            login_visible: false,
            quick_actions_visible: false,
            welcome_started: false,
            disposed: false,
            revision: 0,
        }
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    fn push_user(&mut self, text: &str) {
        let id = self.allocate_id();
        self.transcript.push(Message::user(id, text));
    }

    fn push_assistant(&mut self, text: impl Into<String>, tone: MessageTone) {
        let id = self.allocate_id();
        self.transcript.push(Message::assistant(id, text, tone));
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            transcript: self.transcript.clone(),
            pending: self.pending,
            typing: self.typing,
            login_visible: self.login_visible,
            quick_actions_visible: self.quick_actions_visible,
            disposed: self.disposed,
            revision: self.revision,
        }
    }

    /// Marks a change and captures it for publishing.
    fn commit(&mut self) -> SessionSnapshot {
        self.revision += 1;
        self.snapshot()
    }
}

struct Inner {
    id: SessionId,
    endpoint: Arc<dyn AssistantEndpoint>,
    state: Mutex<State>,
    updates: watch::Sender<SessionSnapshot>,
    welcome_task: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    /// Mutates state under the lock, then publishes the result after releasing it.
    fn update<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let (out, snapshot) = {
            let mut state = self.state.lock();
            let out = f(&mut state);
            (out, state.commit())
        };
        self.publish(snapshot);
        out
    }

    /// Publishes `snapshot` unless a newer one already went out.
    ///
    /// Never called with the state lock held, so subscribers may read the
    /// session while borrowing the channel.
    fn publish(&self, snapshot: SessionSnapshot) {
        self.updates.send_if_modified(|current| {
            if snapshot.revision > current.revision {
                *current = snapshot;
                true
            } else {
                false
            }
        });
    }

    /// Accepts or rejects a submission, echoing the user text on accept.
    fn begin(&self, text: &str) -> Result<PendingGuard<'_>, RejectReason> {
        let mut state = self.state.lock();
        if state.disposed {
            return Err(RejectReason::Disposed);
        }
        if text.is_empty() {
            return Err(RejectReason::Empty);
        }
        if state.pending {
            return Err(RejectReason::Pending);
        }

        state.push_user(text);
        state.pending = true;
        state.typing = true;
        let snapshot = state.commit();
        drop(state);

        self.publish(snapshot);
        Ok(PendingGuard {
            inner: self,
            finished: false,
        })
    }

    fn dispose(&self) {
        let first = self.update(|state| {
            if state.disposed {
                return false;
            }
            state.disposed = true;
            state.pending = false;
            state.typing = false;
            true
        });
        if first {
            info!(session = %self.id, "Chat session disposed");
        }
        if let Some(handle) = self.welcome_task.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.welcome_task.get_mut().take() {
            handle.abort();
        }
    }
}

/// Clears the in-flight flag however the request ends.
///
/// [`PendingGuard::finish`] appends the reply and resets in one step; if the
/// submitting future is dropped or panics first, `Drop` still resets.
struct PendingGuard<'a> {
    inner: &'a Inner,
    finished: bool,
}

impl PendingGuard<'_> {
    fn finish(mut self, reply: &AssistantReply) {
        let session = &self.inner.id;
        self.inner.update(|state| {
            state.typing = false;
            if state.disposed {
                debug!(session = %session, "Reply arrived after dispose; discarded");
            } else {
                if *reply == AssistantReply::AuthRequired {
                    state.login_visible = true;
                }
                state.push_assistant(reply.transcript_text(), reply.tone());
            }
            state.pending = false;
        });
        self.finished = true;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        debug!(session = %self.inner.id, "Submission abandoned; clearing pending flag");
        self.inner.update(|state| {
            state.typing = false;
            state.pending = false;
        });
    }
}

/// Weak handle used by deferred callbacks so they never keep a session alive.
#[derive(Clone)]
pub(crate) struct WeakSession(Weak<Inner>);

impl WeakSession {
    /// Appends a welcome line. Returns `false` once the session is gone or disposed.
    pub(crate) fn append_welcome(&self, text: &str) -> bool {
        let Some(inner) = self.0.upgrade() else {
            return false;
        };
        inner.update(|state| {
            if state.disposed {
                return false;
            }
            state.push_assistant(text, MessageTone::Normal);
            true
        })
    }

    /// Makes the quick-action prompts visible. Never reset afterwards.
    pub(crate) fn offer_quick_actions(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.update(|state| {
                if !state.disposed {
                    state.quick_actions_visible = true;
                }
            });
        }
    }
}

/// Owned chat session. Cloning yields another handle to the same session.
///
/// Dropping the last handle disposes the session.
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<Inner>,
}

impl ChatSession {
    /// Creates a session with a fresh random id.
    pub fn new(endpoint: Arc<dyn AssistantEndpoint>) -> Self {
        Self::with_session_id(endpoint, SessionId::new())
    }

    /// Creates a session bound to a specific id.
    pub fn with_session_id(endpoint: Arc<dyn AssistantEndpoint>, id: SessionId) -> Self {
        let state = State::new();
        let (updates, _) = watch::channel(state.snapshot());
        info!(session = %id, "Chat session created");
        Self {
            inner: Arc::new(Inner {
                id,
                endpoint,
                state: Mutex::new(state),
                updates,
                welcome_task: Mutex::new(None),
            }),
        }
    }

    /// Returns the session identifier.
    pub fn id(&self) -> &SessionId {
        &self.inner.id
    }

    /// Returns the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.lock().snapshot()
    }

    /// Subscribes to state changes. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.updates.subscribe()
    }

    /// Submits one line of user text.
    ///
    /// Blank text, a pending request, or a disposed session reject the input
    /// with no state change. Otherwise the trimmed text is echoed, exactly
    /// one endpoint call is made, and exactly one assistant message is
    /// appended for its outcome.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        let guard = match self.inner.begin(text) {
            Ok(guard) => guard,
            Err(reason) => {
                debug!(session = %self.inner.id, ?reason, "Submission rejected");
                return SubmitOutcome::Rejected(reason);
            }
        };

        debug!(session = %self.inner.id, "Submission accepted");
        let reply = self.inner.endpoint.send(text).await;
        guard.finish(&reply);
        SubmitOutcome::Completed(reply)
    }

    /// Submits the quick-action prompt at `index`, exactly as if it were typed.
    pub async fn submit_quick_action(&self, index: usize) -> SubmitOutcome {
        match quick_action(index) {
            Some(text) => self.submit(text).await,
            None => SubmitOutcome::Rejected(RejectReason::UnknownQuickAction(index)),
        }
    }

    /// Starts the one-time welcome sequence on the current tokio runtime.
    ///
    /// Returns `false` if it already ran or the session is disposed.
    pub fn start_welcome(&self, schedule: WelcomeSchedule) -> bool {
        let start = {
            let mut state = self.inner.state.lock();
            let start = !state.disposed && !state.welcome_started;
            state.welcome_started = true;
            start
        };
        if !start {
            return false;
        }

        let weak = WeakSession(Arc::downgrade(&self.inner));
        let handle = tokio::spawn(welcome::play(weak, schedule));
        *self.inner.welcome_task.lock() = Some(handle);
        true
    }

    /// Tears the session down. Pending timers become no-ops and late replies
    /// are discarded. Idempotent.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}
