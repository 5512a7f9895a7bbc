//! Process-wide tracking state: live sessions and progress.
//!
//! These are the only two pieces of shared mutable state in the system.
//! Both are injected where needed rather than reached for as globals.

pub mod progress_board;
pub mod session_registry;

pub use progress_board::ProgressBoard;
pub use session_registry::{CancelOutcome, SessionHandle, SessionRegistry};
