//! Periodic background jobs.

pub mod context;
pub mod scheduled;

pub use context::{ContextKey, TaskContext};
pub use scheduled::{ScheduledTask, TaskStatus};
