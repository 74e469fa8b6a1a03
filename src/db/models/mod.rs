mod guild_settings;
mod infraction;
mod pace_control;
mod pending_prune;
mod temp_ban;

pub use guild_settings::GuildSettings;
pub use infraction::{Infraction, NewInfraction};
pub use pace_control::PaceControlPolicy;
pub use pending_prune::PendingPrune;
pub use temp_ban::TempBan;
