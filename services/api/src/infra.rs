use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use top_stats::stats::{
    Buckets, ConnectedPlayer, ConnectionError, GrantLedger, GrantRecord, MessageChannel,
    TelemetrySource, TopStatsService,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) game: Arc<InMemoryGameServer>,
    pub(crate) service: Arc<TopStatsService<InMemoryGameServer>>,
}

impl AppState {
    pub(crate) fn new(
        readiness: Arc<AtomicBool>,
        metrics: PrometheusHandle,
        game: Arc<InMemoryGameServer>,
        service: TopStatsService<InMemoryGameServer>,
    ) -> Self {
        Self {
            readiness,
            metrics: Arc::new(metrics),
            game,
            service: Arc::new(service),
        }
    }
}

/// VIP entry as stored by the in-memory ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct VipEntry {
    pub(crate) player_id: String,
    pub(crate) label: String,
    pub(crate) expires_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct OutboundMessage {
    pub(crate) player_id: String,
    pub(crate) message: String,
}

#[derive(Default)]
struct MatchState {
    team_view: Value,
    session_players: usize,
    connected: Vec<ConnectedPlayer>,
}

/// Game server stand-in that keeps the match, the VIP ledger and sent messages in memory.
#[derive(Default)]
pub(crate) struct InMemoryGameServer {
    current: Mutex<MatchState>,
    vips: Mutex<Vec<VipEntry>>,
    outbox: Mutex<Vec<OutboundMessage>>,
}

impl InMemoryGameServer {
    /// Replaces the running match. Without an explicit roster every player of
    /// the team view is treated as connected. Returns the number of recipients.
    pub(crate) fn load_match(
        &self,
        team_view: Value,
        session_players: usize,
        connected: Option<Vec<ConnectedPlayer>>,
    ) -> usize {
        let connected = connected.unwrap_or_else(|| roster(&team_view));
        let recipients = connected.len();
        let mut guard = self.current.lock().expect("match mutex poisoned");
        *guard = MatchState {
            team_view,
            session_players,
            connected,
        };
        recipients
    }

    #[cfg(test)]
    pub(crate) fn seed_vip(&self, entry: VipEntry) {
        self.vips.lock().expect("vip mutex poisoned").push(entry);
    }

    pub(crate) fn vips(&self) -> Vec<VipEntry> {
        self.vips.lock().expect("vip mutex poisoned").clone()
    }

    pub(crate) fn messages(&self) -> Vec<OutboundMessage> {
        self.outbox.lock().expect("outbox mutex poisoned").clone()
    }
}

impl TelemetrySource for InMemoryGameServer {
    fn team_view(&self) -> Result<Value, ConnectionError> {
        let guard = self.current.lock().expect("match mutex poisoned");
        Ok(guard.team_view.clone())
    }

    fn session_player_count(&self) -> Result<usize, ConnectionError> {
        let guard = self.current.lock().expect("match mutex poisoned");
        Ok(guard.session_players)
    }
}

impl GrantLedger for InMemoryGameServer {
    fn vip_grants(&self) -> Result<Vec<GrantRecord>, ConnectionError> {
        let guard = self.vips.lock().expect("vip mutex poisoned");
        guard
            .iter()
            .map(|entry| {
                let expires_at = entry
                    .expires_at
                    .as_deref()
                    .map(parse_expiry)
                    .transpose()?;
                Ok(GrantRecord {
                    player_id: entry.player_id.clone(),
                    expires_at,
                })
            })
            .collect()
    }

    fn add_grant(
        &self,
        player_id: &str,
        label: &str,
        expires_at: &str,
    ) -> Result<(), ConnectionError> {
        parse_expiry(expires_at)?;
        let mut guard = self.vips.lock().expect("vip mutex poisoned");
        guard.retain(|entry| entry.player_id != player_id);
        guard.push(VipEntry {
            player_id: player_id.to_string(),
            label: label.to_string(),
            expires_at: Some(expires_at.to_string()),
        });
        Ok(())
    }
}

impl MessageChannel for InMemoryGameServer {
    fn connected_players(&self) -> Result<Vec<ConnectedPlayer>, ConnectionError> {
        let guard = self.current.lock().expect("match mutex poisoned");
        Ok(guard.connected.clone())
    }

    fn message_player(&self, player_id: &str, message: &str) -> Result<(), ConnectionError> {
        let mut guard = self.outbox.lock().expect("outbox mutex poisoned");
        guard.push(OutboundMessage {
            player_id: player_id.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

fn parse_expiry(raw: &str) -> Result<DateTime<Utc>, ConnectionError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| ConnectionError::Rejected(format!("invalid expiration '{raw}': {err}")))
}

/// Every commander and squad member of the team view.
pub(crate) fn roster(team_view: &Value) -> Vec<ConnectedPlayer> {
    let buckets = Buckets::from_team_view(team_view);
    buckets
        .commanders
        .iter()
        .chain(&buckets.infantry_players)
        .chain(&buckets.armor_players)
        .map(|player| ConnectedPlayer {
            name: player.name.clone(),
            player_id: player.player_id.clone(),
        })
        .collect()
}
