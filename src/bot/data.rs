use std::fmt;
use std::sync::Arc;

use crate::capabilities::{ChatHandle, ClockHandle};
use crate::config::Settings;
use crate::db::StoreHandle;
use crate::services::guild_settings::GuildSettingsService;
use crate::services::infractions::InfractionService;
use crate::services::pace::{PaceEvaluator, PacePolicies, PaceTracker};
use crate::services::prune::PruneService;
use crate::services::spam::SpamTracker;
use crate::services::temp_ban::TempBanService;

/// Shared data available to all handlers and background jobs
pub struct Data {
    pub settings: Settings,
    pub store: StoreHandle,
    pub clock: ClockHandle,
    pub chat: ChatHandle,
    pub infractions: InfractionService,
    pub temp_bans: TempBanService,
    pub pace_policies: PacePolicies,
    pub prunes: PruneService,
    pub guild_settings: GuildSettingsService,
    /// Recent words per channel for pace control
    pub pace_tracker: Arc<PaceTracker>,
    pub pace_evaluator: Arc<PaceEvaluator>,
    /// Recent messages per member for the spam detector
    pub spam_tracker: Arc<SpamTracker>,
}

impl Data {
    pub fn new(settings: Settings, store: StoreHandle, clock: ClockHandle, chat: ChatHandle) -> Self {
        Self {
            settings,
            infractions: InfractionService::new(store.clone(), clock.clone()),
            temp_bans: TempBanService::new(store.clone(), clock.clone()),
            pace_policies: PacePolicies::new(store.clone()),
            prunes: PruneService::new(store.clone(), clock.clone()),
            guild_settings: GuildSettingsService::new(store.clone()),
            pace_tracker: Arc::new(PaceTracker::new()),
            pace_evaluator: Arc::new(PaceEvaluator::new()),
            spam_tracker: Arc::new(SpamTracker::new()),
            store,
            clock,
            chat,
        }
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("paced_channels", &self.pace_tracker.active_keys().len())
            .field("spam_windows", &self.spam_tracker.len())
            .finish_non_exhaustive()
    }
}

pub type Context<'a> = poise::Context<'a, Arc<Data>, crate::bot::error::Error>;
