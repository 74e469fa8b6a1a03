pub mod admin;
pub mod evaluator;
pub mod tracker;

pub use admin::PacePolicies;
pub use evaluator::PaceEvaluator;
pub use tracker::{PaceKey, PaceStats, PaceTracker};
