use std::time::Duration;

/// Alphabet of the public short IDs (no `j`, `l` or `o`)
pub const SHORT_ID_ALPHABET: &str = "abcdefghikmnpqrstuvwxyz1234567890";
pub const SHORT_ID_MIN_LENGTH: u8 = 5;

/// Infractions shown per page
pub const INFRACTION_PAGE_SIZE: i64 = 5;
/// Infraction weights are accepted in [0, MAX_INFRACTION_WEIGHT]
pub const MAX_INFRACTION_WEIGHT: f64 = 10.0;
/// Decayed severity at which a joining member is reported
pub const DEFAULT_NOTIFY_SEVERITY_THRESHOLD: f64 = 1.0;

/// Temp ban reaper
pub const TEMP_BAN_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);
pub const TEMP_BAN_EXPIRED_REASON: &str = "Ban expired.";

/// Pace control
pub const PACE_CONTROL_TICK: Duration = Duration::from_secs(30);
/// Must be at least as large as the largest configurable window
pub const PACE_MAX_RETENTION: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_TARGET_WPM: i32 = 100;
pub const DEFAULT_MIN_COOLDOWN_SECONDS: i32 = 0;
pub const DEFAULT_MAX_COOLDOWN_SECONDS: i32 = 30;
pub const DEFAULT_ACTIVATION_WPM: i32 = 0;
pub const DEFAULT_WPM_WINDOW_SECONDS: i32 = 60;
pub const DEFAULT_USER_WINDOW_SECONDS: i32 = 120;
/// Discord's upper bound for channel slow mode (6 hours)
pub const MAX_CHANNEL_COOLDOWN_SECONDS: i32 = 21_600;

/// Anti-spam
pub const DEFAULT_SPAM_STRIKE_THRESHOLD: i32 = 5;
pub const DEFAULT_SPAM_COOLDOWN_SECONDS: i32 = 20;
pub const SPAM_STRIKE_THRESHOLD_RANGE: (i32, i32) = (2, 10);
pub const SPAM_COOLDOWN_SECONDS_RANGE: (i32, i32) = (1, 60);
pub const SPAM_MAX_MESSAGES: usize = 20;
pub const SPAM_MIN_MESSAGE_LENGTH: usize = 10;
/// Messages closer than this edit distance count as duplicates
pub const SPAM_MAX_EDIT_DISTANCE: usize = 5;
pub const SPAM_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);
pub const SPAM_TIMEOUT_REASON: &str = "User timed out due to anti-spam settings.";

/// Housekeeping of in-memory windows
pub const MEMORY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Pending prune batches older than this are discarded
pub const PENDING_PRUNE_MAX_AGE: Duration = Duration::from_secs(4 * 60 * 60);
pub const PENDING_PRUNE_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);
