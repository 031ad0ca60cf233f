//! Bot core: shared state, dispatcher schema, runtime modes.

pub mod dispatcher;
mod runtime;
pub mod webhook;

pub use dispatcher::{build_dispatcher, AppState, ThrottledBot};
pub use runtime::run;
