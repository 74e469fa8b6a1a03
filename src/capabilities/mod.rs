//! Narrow interfaces the moderation core consumes from the outside world.

pub mod chat;
pub mod clock;

pub use chat::{ChatCapability, ChatError, ChatHandle, SerenityChat};
pub use clock::{Clock, ClockHandle, SystemClock};
