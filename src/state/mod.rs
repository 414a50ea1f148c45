//! Session state machine module
//!
//! Two timer states:
//! - Idle: timer stopped, elapsed time authoritative
//! - Running: timer counting, elapsed derived from the wall clock
//!
//! [`SessionMachine`] is the single writer that applies intents and
//! publishes the resulting events.

mod clock;
mod machine;
mod session;

pub use clock::SystemClock;
pub use machine::SessionMachine;
pub use session::{State, DEFAULT_TASK};
