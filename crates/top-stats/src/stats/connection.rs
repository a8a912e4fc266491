use super::domain::{ConnectedPlayer, GrantRecord};
use serde::Serialize;
use tracing::warn;

/// Failure reported by the game-server control connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("game server unreachable: {0}")]
    Unavailable(String),
    #[error("game server rejected command: {0}")]
    Rejected(String),
}

/// Live match telemetry.
pub trait TelemetrySource: Send + Sync {
    /// Nested `team -> commander/squads -> players` view of the running match.
    fn team_view(&self) -> Result<serde_json::Value, ConnectionError>;
    fn session_player_count(&self) -> Result<usize, ConnectionError>;
}

/// VIP ledger of the game server.
pub trait GrantLedger: Send + Sync {
    fn vip_grants(&self) -> Result<Vec<GrantRecord>, ConnectionError>;
    /// `expires_at` is a UTC timestamp formatted as `%Y-%m-%dT%H:%M:%SZ`.
    fn add_grant(&self, player_id: &str, label: &str, expires_at: &str)
        -> Result<(), ConnectionError>;
}

/// In-game messaging.
pub trait MessageChannel: Send + Sync {
    fn connected_players(&self) -> Result<Vec<ConnectedPlayer>, ConnectionError>;
    fn message_player(&self, player_id: &str, message: &str) -> Result<(), ConnectionError>;
}

/// Full control connection, as exposed by a game-server admin tool.
pub trait GameServer: TelemetrySource + GrantLedger + MessageChannel {}

impl<T> GameServer for T where T: TelemetrySource + GrantLedger + MessageChannel {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastSummary {
    pub delivered: usize,
    pub failed: usize,
}

/// Sends `message` privately to every connected player.
///
/// A recipient that cannot be reached is counted in `failed` and does not stop delivery
/// to the others. Only a failure to list recipients is returned as an error.
pub fn broadcast(
    channel: &dyn MessageChannel,
    message: &str,
) -> Result<BroadcastSummary, ConnectionError> {
    let mut summary = BroadcastSummary::default();

    for player in channel.connected_players()? {
        match channel.message_player(&player.player_id, message) {
            Ok(()) => summary.delivered += 1,
            Err(err) => {
                warn!(player = %player.name, player_id = %player.player_id, error = %err, "broadcast delivery failed");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FlakyChannel {
        players: Vec<ConnectedPlayer>,
        unreachable: &'static str,
        sent: Mutex<Vec<String>>,
    }

    impl MessageChannel for FlakyChannel {
        fn connected_players(&self) -> Result<Vec<ConnectedPlayer>, ConnectionError> {
            Ok(self.players.clone())
        }

        fn message_player(&self, player_id: &str, _message: &str) -> Result<(), ConnectionError> {
            if player_id == self.unreachable {
                return Err(ConnectionError::Rejected("player left".to_string()));
            }
            self.sent
                .lock()
                .expect("sent mutex poisoned")
                .push(player_id.to_string());
            Ok(())
        }
    }

    fn player(name: &str, player_id: &str) -> ConnectedPlayer {
        ConnectedPlayer {
            name: name.to_string(),
            player_id: player_id.to_string(),
        }
    }

    #[test]
    fn broadcast_continues_past_unreachable_recipients() {
        let channel = FlakyChannel {
            players: vec![player("Able", "1"), player("Baker", "2"), player("Charlie", "3")],
            unreachable: "2",
            sent: Mutex::new(Vec::new()),
        };

        let summary = broadcast(&channel, "gg").expect("recipients listed");

        assert_eq!(
            summary,
            BroadcastSummary {
                delivered: 2,
                failed: 1
            }
        );
        assert_eq!(
            *channel.sent.lock().expect("sent mutex poisoned"),
            vec!["1".to_string(), "3".to_string()]
        );
    }
}
