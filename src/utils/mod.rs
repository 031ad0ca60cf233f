//! Utility functions shared across handlers and events.

pub mod text;
pub mod time;

pub use text::{apply_fillings, html_escape, mention, split_chunks};
pub use time::{
    format_duration, parse_duration_bounded, parse_duration_secs, MAX_RESTRICTION_SECS,
};
