//! State module for tracking harvest progress
//!
//! A harvest session owns exactly one [`SessionState`]. It is created when the
//! session starts, mutated only by the producer loop, and dropped when the
//! session ends; nothing in it is persisted.

mod session_state;

pub use session_state::{PageSnapshot, SessionState};
