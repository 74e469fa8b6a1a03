//! The bot's background jobs and the registry that owns them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::bot::error::Error;
use crate::capabilities::ChatHandle;
use crate::constants::defaults::{MEMORY_SWEEP_INTERVAL, PENDING_PRUNE_SWEEP_INTERVAL};
use crate::db::StoreHandle;
use crate::services::pace::{PaceEvaluator, PaceTracker};
use crate::services::prune::PruneService;
use crate::services::spam::SpamTracker;
use crate::services::temp_ban::reaper::reap_expired;
use crate::services::temp_ban::TempBanService;
use crate::task::{ContextKey, ScheduledTask, TaskContext};

pub const TEMP_BAN_REAPER: &str = "remove-temp-bans";
pub const PACE_CONTROL: &str = "pace-control";
pub const STALE_PRUNES: &str = "remove-stale-prunes";
pub const MEMORY_SWEEP: &str = "memory-sweep";

fn chat_from(ctx: &TaskContext) -> Result<Arc<ChatHandle>, Error> {
    ctx.value::<ChatHandle>(ContextKey::Chat)
        .ok_or_else(|| Error::Config(format!("task {} has no chat handle", ctx.name())))
}

/// Lift expired temporary bans
pub fn temp_ban_reaper(bans: TempBanService, chat: ChatHandle, interval: Duration) -> ScheduledTask {
    ScheduledTask::new(TEMP_BAN_REAPER, interval, move |ctx| {
        let bans = bans.clone();
        async move {
            let chat = chat_from(&ctx)?;
            let summary = reap_expired(&bans, chat.as_ref().as_ref()).await?;
            if summary.lifted > 0 || summary.retained > 0 {
                info!(
                    "Temp ban sweep lifted {} and retained {}",
                    summary.lifted, summary.retained
                );
            }
            Ok(())
        }
    })
    .with_value(ContextKey::Chat, chat)
}

/// Re-evaluate the slow mode of every tracked channel
pub fn pace_control(
    tracker: Arc<PaceTracker>,
    evaluator: Arc<PaceEvaluator>,
    store: StoreHandle,
    chat: ChatHandle,
    interval: Duration,
) -> ScheduledTask {
    ScheduledTask::new(PACE_CONTROL, interval, move |ctx| {
        let tracker = tracker.clone();
        let evaluator = evaluator.clone();
        let store = store.clone();
        async move {
            let chat = chat_from(&ctx)?;
            let changed = evaluator
                .tick(&tracker, store.as_ref(), chat.as_ref().as_ref(), Instant::now())
                .await;
            if changed > 0 {
                debug!("Pace control changed {} cooldowns", changed);
            }
            Ok(())
        }
    })
    .with_value(ContextKey::Chat, chat)
}

/// Drop prune batches older than the retention window
pub fn stale_prunes(prunes: PruneService) -> ScheduledTask {
    ScheduledTask::new(STALE_PRUNES, PENDING_PRUNE_SWEEP_INTERVAL, move |_ctx| {
        let prunes = prunes.clone();
        async move {
            let removed = prunes.remove_stale().await?;
            if removed > 0 {
                info!("Removed {} stale pending prune entries", removed);
            }
            Ok(())
        }
    })
}

/// Evict expired spam windows and settled pace buffers
pub fn memory_sweep(
    spam: Arc<SpamTracker>,
    tracker: Arc<PaceTracker>,
    evaluator: Arc<PaceEvaluator>,
) -> ScheduledTask {
    ScheduledTask::new(MEMORY_SWEEP, MEMORY_SWEEP_INTERVAL, move |_ctx| {
        let spam = spam.clone();
        let tracker = tracker.clone();
        let evaluator = evaluator.clone();
        async move {
            let now = Instant::now();
            let windows = spam.purge_expired(now);
            let buffers = evaluator.forget_settled(&tracker, now);
            debug!(
                "Memory sweep dropped {} spam windows and {} pace buffers",
                windows, buffers
            );
            Ok(())
        }
    })
}

/// Owns every started task so they can be stopped together on shutdown
#[derive(Default)]
pub struct ScheduledTasks {
    tasks: Mutex<Vec<Arc<ScheduledTask>>>,
}

impl ScheduledTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, task: Arc<ScheduledTask>) {
        self.tasks.lock().push(task);
    }

    pub fn names(&self) -> Vec<String> {
        self.tasks.lock().iter().map(|t| t.name().to_string()).collect()
    }

    pub fn stop_all(&self) {
        for task in self.tasks.lock().iter() {
            task.stop();
        }
    }

    /// Wait for every stopped task loop to finish
    pub async fn join_all(&self) {
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            task.join().await;
        }
    }
}
