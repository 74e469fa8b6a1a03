use chrono::{DateTime, Utc};
use serenity::all::{GuildId, UserId};

use crate::bot::error::Error;
use crate::constants::defaults::INFRACTION_PAGE_SIZE;
use crate::db::repository::GuildSettingsRepository;
use crate::services::infractions::InfractionService;
use crate::utils::formatting::{format_float_up_to_prec, severity_color, severity_dots};

/// One infraction as presented in a listing
#[derive(Debug, Clone, PartialEq)]
pub struct InfractionItem {
    pub short_id: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub silent: bool,
    /// Weight at warn time
    pub weight: f64,
    /// Weight after decay
    pub effective_weight: f64,
    /// Colour of the weight at warn time
    pub color: u32,
}

impl InfractionItem {
    /// e.g. `●◑ (1.5)\n(at warn time: 2)`
    pub fn strikes(&self) -> String {
        format!(
            "{} ({})\n(at warn time: {})",
            severity_dots(self.effective_weight),
            format_float_up_to_prec(self.effective_weight, 2),
            format_float_up_to_prec(self.weight, 2)
        )
    }
}

/// A page of a user's infractions with navigation offsets
#[derive(Debug, Clone, PartialEq)]
pub struct InfractionPage {
    pub items: Vec<InfractionItem>,
    pub offset: i64,
    pub total_count: i64,
    pub total_severity: f64,
    pub previous_offset: Option<i64>,
    pub next_offset: Option<i64>,
}

impl InfractionPage {
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// e.g. `(Viewing 1-5)\nTotal strikes: ●● (2)`
    pub fn summary(&self) -> String {
        format!(
            "(Viewing {}-{})\nTotal strikes: {} ({})",
            self.offset + 1,
            self.offset + self.items.len() as i64,
            severity_dots(self.total_severity),
            format_float_up_to_prec(self.total_severity, 2)
        )
    }
}

/// Offsets for the neighbouring pages, if they exist
pub fn page_offsets(offset: i64, total_count: i64, page_size: i64) -> (Option<i64>, Option<i64>) {
    let previous = (offset > 0).then(|| (offset - page_size).max(0));
    let next = (offset + page_size < total_count).then_some(offset + page_size);
    (previous, next)
}

impl InfractionService {
    /// The listing page starting at `offset`, decayed with the guild's half-life
    pub async fn page(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        offset: i64,
    ) -> Result<InfractionPage, Error> {
        let settings = self.store().guild_settings(guild_id).await?;
        let half_life_days = settings.infraction_half_life_days;

        let (infractions, total_count) = self
            .list(guild_id, user_id, INFRACTION_PAGE_SIZE, offset)
            .await?;
        let total_severity = self
            .total_decayed_severity(guild_id, user_id, half_life_days)
            .await?;

        let now = self.clock().now();
        let items = infractions
            .iter()
            .map(|inf| {
                Ok(InfractionItem {
                    short_id: inf.short_id()?,
                    reason: inf.reason.clone(),
                    timestamp: inf.timestamp,
                    silent: inf.silent,
                    weight: inf.weight,
                    effective_weight: inf.effective_weight(now, half_life_days),
                    color: severity_color(inf.weight),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let (previous_offset, next_offset) =
            page_offsets(offset, total_count, INFRACTION_PAGE_SIZE);

        Ok(InfractionPage {
            items,
            offset,
            total_count,
            total_severity,
            previous_offset,
            next_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::capabilities::clock::{Clock, FixedClock};
    use crate::db::models::GuildSettings;
    use crate::db::MemoryStore;

    #[test]
    fn test_page_offsets() {
        assert_eq!(page_offsets(0, 3, 5), (None, None));
        assert_eq!(page_offsets(0, 12, 5), (None, Some(5)));
        assert_eq!(page_offsets(5, 12, 5), (Some(0), Some(10)));
        assert_eq!(page_offsets(10, 12, 5), (Some(5), None));
        assert_eq!(page_offsets(3, 12, 5), (Some(0), Some(8)));
        assert_eq!(page_offsets(5, 10, 5), (Some(0), None));
    }

    #[tokio::test]
    async fn test_page_model() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let service = InfractionService::new(store.clone(), clock.clone());
        let (guild, user, moderator) = (GuildId::new(1), UserId::new(2), UserId::new(3));

        let mut settings = GuildSettings::new(guild, clock.now());
        settings.set_half_life_days(2.0).unwrap();
        store.save_guild_settings(&settings).await.unwrap();

        for weight in [0.5, 1.0, 1.0, 2.0, 3.0, 0.5] {
            service
                .create(guild, user, moderator, "rule breach", weight, false)
                .await
                .unwrap();
            clock.advance(Duration::hours(1));
        }
        clock.advance(Duration::hours(42));

        let page = service.page(guild, user, 0).await.unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total_count, 6);
        assert_eq!(page.previous_offset, None);
        assert_eq!(page.next_offset, Some(5));
        assert!(page.summary().starts_with("(Viewing 1-5)"));

        // Newest first, decayed by slightly less than one half-life
        let newest = &page.items[0];
        assert_eq!(newest.weight, 0.5);
        assert!(newest.effective_weight < 0.5 && newest.effective_weight > 0.25);
        assert_eq!(newest.color, 0xFFFF00);
        assert_eq!(page.items[1].color, 0xFF0000);

        let sum: f64 = 8.0;
        assert!(page.total_severity < sum);

        let last = service.page(guild, user, 5).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.previous_offset, Some(0));
        assert_eq!(last.next_offset, None);
    }

    #[test]
    fn test_item_strikes() {
        let item = InfractionItem {
            short_id: "abcde".to_string(),
            reason: "spam".to_string(),
            timestamp: Utc::now(),
            silent: false,
            weight: 2.0,
            effective_weight: 1.5,
            color: severity_color(2.0),
        };
        assert_eq!(item.strikes(), "●◑ (1.5)\n(at warn time: 2)");
    }
}
