//! Example prompts offered once per session.

/// Prompts shown as one-tap shortcuts. Picking one submits its exact text.
pub const QUICK_ACTIONS: [&str; 4] = [
    "Create a meeting tomorrow at 2pm",
    "Delete my 3pm event today",
    "What's on my calendar?",
    "Schedule lunch next Monday at 12pm",
];

/// Returns the prompt at `index`, if any.
pub fn quick_action(index: usize) -> Option<&'static str> {
    QUICK_ACTIONS.get(index).copied()
}
