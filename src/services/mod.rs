pub mod guild_settings;
pub mod infractions;
pub mod pace;
pub mod prune;
pub mod scheduled;
pub mod spam;
pub mod temp_ban;
