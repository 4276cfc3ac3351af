//! Full-screen ratatui front-end for a chat session.

pub mod app;
pub mod event;
pub mod theme;

pub use event::run_tui;
