use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::config::TopStatsConfig;
use super::connection::{broadcast, BroadcastSummary, ConnectionError, GameServer};
use super::domain::Mode;
use super::grants::GrantEngine;
use super::leaderboard::{LeaderboardBuilder, Leaderboards};
use super::report::Report;
use super::snapshot::Buckets;

/// Entry point invoked by the host on chat commands and match end.
pub struct TopStatsService<G> {
    config: Arc<TopStatsConfig>,
    server: Arc<G>,
}

/// What a trigger ended up doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// This server is not in the allow-list.
    ServerNotEnabled,
    /// Chat line was not the configured command.
    Ignored,
    Replied { report: Report, delivered: bool },
    Broadcast { report: Report, summary: BroadcastSummary },
    /// Match ended without any stats to announce.
    NoStats { report: Report },
}

impl<G> TopStatsService<G>
where
    G: GameServer + 'static,
{
    pub fn new(server: Arc<G>, config: TopStatsConfig) -> Self {
        Self {
            config: Arc::new(config),
            server,
        }
    }

    pub fn config(&self) -> &TopStatsConfig {
        &self.config
    }

    /// Builds the report for `mode`. In match-end mode this also issues VIP grants.
    pub fn report_at(&self, mode: Mode, now: DateTime<Utc>) -> Result<Report, TopStatsError> {
        let view = self.server.team_view()?;
        let buckets = Buckets::from_team_view(&view);

        let boards = match mode {
            Mode::LiveQuery => {
                let builder = LeaderboardBuilder::new(&self.config, mode);
                Leaderboards::build(&buckets, &builder)?
            }
            Mode::MatchEnd => {
                let session_players = self.server.session_player_count()?;
                let engine = GrantEngine::new(&self.config, &*self.server, session_players, now);
                let builder = LeaderboardBuilder::new(&self.config, mode).with_grants(&engine);
                Leaderboards::build(&buckets, &builder)?
            }
        };

        Ok(Report::compose(
            &boards,
            self.config.locale(),
            &self.config.weights,
        ))
    }

    /// Replies privately with the live leaderboards when `message` is the chat command.
    pub fn on_chat_command(
        &self,
        player_id: &str,
        message: &str,
    ) -> Result<TriggerOutcome, TopStatsError> {
        if !self.config.is_enabled_on_server() {
            return Ok(TriggerOutcome::ServerNotEnabled);
        }
        if player_id.is_empty() || message != self.config.chat_command {
            return Ok(TriggerOutcome::Ignored);
        }

        info!(player_id, "live leaderboards requested");
        let report = self.report_at(Mode::LiveQuery, Utc::now())?;

        let delivered = match self.server.message_player(player_id, &report.text) {
            Ok(()) => true,
            Err(err) => {
                warn!(player_id, error = %err, "unable to deliver leaderboards");
                false
            }
        };

        Ok(TriggerOutcome::Replied { report, delivered })
    }

    pub fn on_match_end(&self) -> Result<TriggerOutcome, TopStatsError> {
        self.on_match_end_at(Utc::now())
    }

    /// Issues match-end VIP grants and broadcasts the final leaderboards.
    pub fn on_match_end_at(&self, now: DateTime<Utc>) -> Result<TriggerOutcome, TopStatsError> {
        if !self.config.is_enabled_on_server() {
            return Ok(TriggerOutcome::ServerNotEnabled);
        }

        let report = self.report_at(Mode::MatchEnd, now)?;
        if !report.has_stats {
            info!("match ended without stats, nothing to broadcast");
            return Ok(TriggerOutcome::NoStats { report });
        }

        let summary = broadcast(&*self.server, &report.text)?;
        info!(
            delivered = summary.delivered,
            failed = summary.failed,
            "match-end leaderboards broadcast"
        );

        Ok(TriggerOutcome::Broadcast { report, summary })
    }
}

/// Error raised by the top stats service.
#[derive(Debug, thiserror::Error)]
pub enum TopStatsError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
