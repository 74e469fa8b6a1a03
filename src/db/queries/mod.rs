pub mod guild_settings;
pub mod infraction;
pub mod pace_control;
pub mod pending_prune;
pub mod temp_ban;
