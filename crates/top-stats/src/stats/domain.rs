use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One of the two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Allies,
    Axis,
}

impl Team {
    pub const fn ordered() -> [Self; 2] {
        [Self::Allies, Self::Axis]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Allies => "allies",
            Self::Axis => "axis",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// In-game role as reported by the telemetry source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    ArmyCommander,
    Officer,
    Rifleman,
    Assault,
    AutomaticRifleman,
    Medic,
    Support,
    HeavyMachineGunner,
    AntiTank,
    Engineer,
    TankCommander,
    Crewman,
    Spotter,
    Sniper,
    #[serde(other)]
    Other,
}

impl Role {
    pub const fn is_commander(self) -> bool {
        matches!(self, Self::ArmyCommander)
    }
}

/// Squad type classification used to route squads into buckets.
///
/// Recon squads rank alongside infantry; any other squad type is not ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquadKind {
    Infantry,
    Armor,
}

impl SquadKind {
    pub fn classify(squad_type: &str) -> Option<Self> {
        match squad_type.trim().to_ascii_lowercase().as_str() {
            "infantry" | "recon" => Some(Self::Infantry),
            "armor" => Some(Self::Armor),
            _ => None,
        }
    }
}

/// Raw match counters shared by players and squads. Missing counters read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub kills: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub deaths: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub combat: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub offense: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub defense: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub support: u32,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_default())
}

impl Counters {
    /// Approximate minutes played, derived from the time-based offense and defense scores.
    pub fn playtime_minutes(&self) -> f64 {
        (u64::from(self.offense) + u64::from(self.defense)) as f64 / 20.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStat {
    pub player_id: String,
    pub name: String,
    pub team: Team,
    pub role: Role,
    pub squad: Option<String>,
    pub counters: Counters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadStat {
    pub name: String,
    pub team: Team,
    pub kind: SquadKind,
    pub counters: Counters,
}

/// Read access shared by every record that can be ranked on a leaderboard.
pub trait StatRecord {
    fn display_name(&self) -> &str;
    fn team(&self) -> Team;
    fn counters(&self) -> &Counters;
}

impl StatRecord for PlayerStat {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn team(&self) -> Team {
        self.team
    }

    fn counters(&self) -> &Counters {
        &self.counters
    }
}

impl StatRecord for SquadStat {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn team(&self) -> Team {
        self.team
    }

    fn counters(&self) -> &Counters {
        &self.counters
    }
}

/// What triggered the current invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    LiveQuery,
    MatchEnd,
}

/// Existing VIP entry as reported by the grant ledger. `expires_at` of `None` is permanent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRecord {
    pub player_id: String,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Player currently connected to the server, used as a broadcast recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedPlayer {
    pub name: String,
    pub player_id: String,
}
