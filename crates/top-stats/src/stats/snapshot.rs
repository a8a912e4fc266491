use super::domain::{Counters, PlayerStat, Role, SquadKind, SquadStat, Team};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Role-classified ranking inputs built from one team view.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Buckets {
    pub commanders: Vec<PlayerStat>,
    pub infantry_players: Vec<PlayerStat>,
    pub armor_players: Vec<PlayerStat>,
    pub infantry_squads: Vec<SquadStat>,
    pub armor_squads: Vec<SquadStat>,
}

impl Buckets {
    /// Partitions a raw team view into typed buckets.
    ///
    /// Missing teams, a null commander or an empty squad map contribute nothing. Records that
    /// fail to deserialize are skipped with a warning; squads of an unranked type are dropped
    /// together with their members.
    pub fn from_team_view(view: &Value) -> Self {
        let mut buckets = Self::default();

        for team in Team::ordered() {
            let Some(raw) = view.get(team.key()).filter(|value| !value.is_null()) else {
                continue;
            };
            let raw_team = match RawTeam::deserialize(raw) {
                Ok(raw_team) => raw_team,
                Err(err) => {
                    warn!(%team, error = %err, "skipping malformed team view");
                    continue;
                }
            };

            if let Some(commander) = raw_team.commander.as_ref().filter(|value| !value.is_null()) {
                if let Some(player) = parse_player(commander, team, None) {
                    buckets.commanders.push(player);
                }
            }

            for (squad_name, detail) in &raw_team.squads {
                buckets.push_squad(team, squad_name, detail);
            }
        }

        buckets
    }

    /// Every player belonging to squads of `kind`.
    pub fn players(&self, kind: SquadKind) -> &[PlayerStat] {
        match kind {
            SquadKind::Infantry => &self.infantry_players,
            SquadKind::Armor => &self.armor_players,
        }
    }

    pub fn squads(&self, kind: SquadKind) -> &[SquadStat] {
        match kind {
            SquadKind::Infantry => &self.infantry_squads,
            SquadKind::Armor => &self.armor_squads,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commanders.is_empty()
            && self.infantry_players.is_empty()
            && self.armor_players.is_empty()
            && self.infantry_squads.is_empty()
            && self.armor_squads.is_empty()
    }

    fn push_squad(&mut self, team: Team, squad_name: &str, detail: &Value) {
        let raw = match RawSquad::deserialize(detail) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%team, squad = squad_name, error = %err, "skipping malformed squad record");
                return;
            }
        };

        let Some(kind) = SquadKind::classify(&raw.squad_type) else {
            debug!(%team, squad = squad_name, squad_type = %raw.squad_type, "squad type not ranked");
            return;
        };

        let members = raw
            .players
            .iter()
            .filter_map(|player| parse_player(player, team, Some(squad_name)));

        match kind {
            SquadKind::Infantry => self.infantry_players.extend(members),
            SquadKind::Armor => self.armor_players.extend(members),
        }

        let squad = SquadStat {
            name: squad_name.to_string(),
            team,
            kind,
            counters: raw.counters,
        };
        match kind {
            SquadKind::Infantry => self.infantry_squads.push(squad),
            SquadKind::Armor => self.armor_squads.push(squad),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    #[serde(default)]
    commander: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty_map")]
    squads: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawSquad {
    #[serde(rename = "type")]
    squad_type: String,
    #[serde(default)]
    players: Vec<Value>,
    #[serde(flatten)]
    counters: Counters,
}

#[derive(Debug, Deserialize)]
struct RawPlayer {
    name: String,
    player_id: String,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    unit_name: Option<String>,
    #[serde(flatten)]
    counters: Counters,
}

fn null_as_empty_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

fn parse_player(value: &Value, team: Team, squad: Option<&str>) -> Option<PlayerStat> {
    match RawPlayer::deserialize(value) {
        Ok(raw) => Some(PlayerStat {
            player_id: raw.player_id,
            name: raw.name,
            team,
            role: raw.role.unwrap_or(Role::Other),
            squad: squad
                .map(str::to_string)
                .or(raw.unit_name.filter(|unit| !unit.is_empty())),
            counters: raw.counters,
        }),
        Err(err) => {
            warn!(%team, squad = squad.unwrap_or("-"), error = %err, "skipping malformed player record");
            None
        }
    }
}
