pub mod reaper;
pub mod service;

pub use service::TempBanService;
