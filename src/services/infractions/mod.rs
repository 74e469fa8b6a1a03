pub mod half_life;
pub mod join_notify;
pub mod listing;
pub mod service;
pub mod short_id;

pub use listing::{InfractionItem, InfractionPage};
pub use service::InfractionService;
