use super::config::TopStatsConfig;
use super::connection::{ConnectionError, GrantLedger};
use super::domain::PlayerStat;
use super::locale::Phrase;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

/// Suffix appended to the player name in the VIP ledger label.
pub const GRANT_LABEL_SUFFIX: &str = "Top-Player";

/// Result of a single VIP award attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    /// Award count or duration configured as zero.
    Disabled,
    BelowPopulation { current: usize, required: usize },
    /// Commander joined too late or did not support enough. Does not use an award slot.
    CommanderIneligible,
    AlreadyGranted,
    Granted { expires_at: DateTime<Utc>, local_expiry: String },
}

impl GrantOutcome {
    /// Whether the attempt consumed one of the leaderboard's award ranks.
    pub fn consumes_rank(&self) -> bool {
        !matches!(self, Self::CommanderIneligible)
    }
}

/// Applies the VIP eligibility rules for one match-end invocation.
pub struct GrantEngine<'a> {
    config: &'a TopStatsConfig,
    ledger: &'a dyn GrantLedger,
    session_players: usize,
    now: DateTime<Utc>,
}

impl<'a> GrantEngine<'a> {
    pub fn new(
        config: &'a TopStatsConfig,
        ledger: &'a dyn GrantLedger,
        session_players: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            config,
            ledger,
            session_players,
            now,
        }
    }

    pub fn try_grant(&self, player: &PlayerStat) -> Result<GrantOutcome, ConnectionError> {
        let policy = &self.config.grants;

        if !policy.is_enabled() {
            return Ok(GrantOutcome::Disabled);
        }

        if policy.seed_limit > 0 && self.session_players < policy.seed_limit {
            debug!(
                current = self.session_players,
                required = policy.seed_limit,
                "server seeding, VIP not awarded"
            );
            return Ok(GrantOutcome::BelowPopulation {
                current: self.session_players,
                required: policy.seed_limit,
            });
        }

        if player.role.is_commander() {
            let playtime = player.counters.playtime_minutes();
            if playtime < f64::from(policy.commander_min_playtime_mins)
                || player.counters.support < policy.commander_min_support
            {
                debug!(player = %player.name, playtime, support = player.counters.support, "commander below VIP minimums");
                return Ok(GrantOutcome::CommanderIneligible);
            }
        }

        let award = Duration::hours(i64::from(policy.hours));
        let threshold = self.now + award;

        let already_granted = self
            .ledger
            .vip_grants()?
            .iter()
            .filter(|grant| grant.player_id == player.player_id)
            .any(|grant| grant.expires_at.map_or(true, |expires_at| expires_at >= threshold));
        if already_granted {
            return Ok(GrantOutcome::AlreadyGranted);
        }

        let label = format!("{} {}", player.name, GRANT_LABEL_SUFFIX);
        let expiry = threshold.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        self.ledger.add_grant(&player.player_id, &label, &expiry)?;

        let local_expiry = threshold
            .with_timezone(&self.config.display.timezone)
            .format(&self.config.display.time_format)
            .to_string();

        info!(player = %player.name, player_id = %player.player_id, expires_at = %expiry, "awarded VIP");

        Ok(GrantOutcome::Granted {
            expires_at: threshold,
            local_expiry,
        })
    }

    /// Line appended under the player's leaderboard entry, if any.
    pub fn announcement(&self, outcome: &GrantOutcome) -> Option<String> {
        let locale = self.config.locale();
        match outcome {
            GrantOutcome::AlreadyGranted => Some(format!("{}\n", locale.text(Phrase::AlreadyVip))),
            GrantOutcome::Granted { local_expiry, .. } => Some(format!(
                "{} {} !\n",
                locale.text(Phrase::VipUntil),
                local_expiry
            )),
            GrantOutcome::Disabled
            | GrantOutcome::BelowPopulation { .. }
            | GrantOutcome::CommanderIneligible => None,
        }
    }
}
