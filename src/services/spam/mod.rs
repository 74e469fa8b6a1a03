pub mod detector;
pub mod normalize;
pub mod window;

pub use detector::{check_message, IncomingMessage, SpamAction};
pub use window::SpamTracker;
