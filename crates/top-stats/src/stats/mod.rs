//! Live leaderboards and match-end VIP awards.
//!
//! A team view fetched from the game server is partitioned into role buckets, ranked by
//! several metrics and composed into a single text report. At match end the top players of
//! the awarding leaderboards receive time-limited VIP.

pub mod config;
pub mod connection;
pub mod domain;
pub mod grants;
pub mod leaderboard;
pub mod locale;
pub mod metrics;
pub mod report;
pub mod service;
pub mod snapshot;

pub use config::{DisplaySettings, GrantPolicy, ModeLimits, TopStatsConfig};
pub use connection::{
    broadcast, BroadcastSummary, ConnectionError, GameServer, GrantLedger, MessageChannel,
    TelemetrySource,
};
pub use domain::{
    ConnectedPlayer, Counters, GrantRecord, Mode, PlayerStat, Role, SquadKind, SquadStat,
    StatRecord, Team,
};
pub use grants::{GrantEngine, GrantOutcome};
pub use leaderboard::{LeaderboardBuilder, Leaderboards};
pub use locale::{Language, Locale, Phrase};
pub use metrics::{LineDetail, Metric, MetricWeights, Score, Weight};
pub use report::Report;
pub use service::{TopStatsError, TopStatsService, TriggerOutcome};
pub use snapshot::Buckets;
