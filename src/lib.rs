pub mod bot;
pub mod capabilities;
pub mod config;
pub mod constants;
pub mod db;
pub mod handlers;
pub mod services;
pub mod task;
pub mod utils;
