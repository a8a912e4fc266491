use super::config::TopStatsConfig;
use super::connection::ConnectionError;
use super::domain::{Mode, PlayerStat, SquadKind, SquadStat, StatRecord};
use super::grants::GrantEngine;
use super::metrics::{Metric, Score};
use super::snapshot::Buckets;
use serde::Serialize;

/// Marker printed in front of every squad entry.
pub const SQUAD_MARKER: &str = "■ ";

/// Builds the formatted top-N listings for one invocation.
pub struct LeaderboardBuilder<'a> {
    config: &'a TopStatsConfig,
    mode: Mode,
    grants: Option<&'a GrantEngine<'a>>,
}

impl<'a> LeaderboardBuilder<'a> {
    pub fn new(config: &'a TopStatsConfig, mode: Mode) -> Self {
        Self {
            config,
            mode,
            grants: None,
        }
    }

    /// Enables VIP awards for player leaderboards. Ignored outside match end.
    pub fn with_grants(mut self, engine: &'a GrantEngine<'a>) -> Self {
        if self.mode == Mode::MatchEnd {
            self.grants = Some(engine);
        }
        self
    }

    pub fn top_players(
        &self,
        players: &[PlayerStat],
        metric: Metric,
    ) -> Result<String, ConnectionError> {
        let limit = self.config.limits(self.mode).players;
        let mut output = String::new();
        let mut rank = 1;

        for (player, score) in self.ranked(players, metric).into_iter().take(limit) {
            if !score.is_zero() {
                output.push_str(&self.entry_line(player, metric));

                if let Some(engine) = self.grant_engine_for(metric, rank) {
                    let outcome = engine.try_grant(player)?;
                    if !outcome.consumes_rank() {
                        continue;
                    }
                    if let Some(announcement) = engine.announcement(&outcome) {
                        output.push_str(&announcement);
                    }
                }
            }
            rank += 1;
        }

        Ok(output)
    }

    /// `members` is the player bucket matching the squads' kind, used for roster lines.
    pub fn top_squads(&self, squads: &[SquadStat], metric: Metric, members: &[PlayerStat]) -> String {
        let limits = self.config.limits(self.mode);
        let mut output = String::new();

        for (index, (squad, score)) in self
            .ranked(squads, metric)
            .into_iter()
            .take(limits.squads)
            .enumerate()
        {
            if score.is_zero() {
                continue;
            }

            output.push_str(SQUAD_MARKER);
            output.push_str(&self.entry_line(squad, metric));

            if index < limits.squad_members {
                let roster = members
                    .iter()
                    .filter(|player| {
                        player.team == squad.team && player.squad.as_deref() == Some(&squad.name)
                    })
                    .map(|player| player.name.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                output.push_str(&roster);
                output.push('\n');
            }
        }

        output
    }

    fn ranked<'r, R: StatRecord>(&self, records: &'r [R], metric: Metric) -> Vec<(&'r R, Score)> {
        let mut ranked: Vec<_> = records
            .iter()
            .map(|record| (record, metric.score(record, &self.config.weights)))
            .collect();
        // stable: equal scores keep snapshot order
        ranked.sort_by(|a, b| b.1.as_f64().total_cmp(&a.1.as_f64()));
        ranked
    }

    fn entry_line(&self, record: &impl StatRecord, metric: Metric) -> String {
        let locale = self.config.locale();
        format!(
            "{} ({}): {}\n",
            record.display_name(),
            locale.team(record.team()),
            metric.detail(record, &self.config.weights)
        )
    }

    fn grant_engine_for(&self, metric: Metric, rank: usize) -> Option<&'a GrantEngine<'a>> {
        self.grants
            .filter(|_| metric.awards_grants() && rank <= self.config.grants.winners)
    }
}

/// The nine leaderboards shown in a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Leaderboards {
    pub commanders_teamplay: String,
    pub infantry_offense: String,
    pub infantry_teamplay: String,
    pub infantry_ratio: String,
    pub infantry_kill_rate: String,
    pub infantry_squads_offense: String,
    pub infantry_squads_teamplay: String,
    pub armor_squads_offense: String,
    pub armor_squads_teamplay: String,
}

impl Leaderboards {
    /// Player leaderboards are built first, in award order: commanders, then infantry.
    pub fn build(buckets: &Buckets, builder: &LeaderboardBuilder<'_>) -> Result<Self, ConnectionError> {
        let infantry = buckets.players(SquadKind::Infantry);
        let armor = buckets.players(SquadKind::Armor);

        Ok(Self {
            commanders_teamplay: builder.top_players(&buckets.commanders, Metric::TeamplayWeighted)?,
            infantry_offense: builder.top_players(infantry, Metric::OffenseWeighted)?,
            infantry_teamplay: builder.top_players(infantry, Metric::TeamplayWeighted)?,
            infantry_ratio: builder.top_players(infantry, Metric::Ratio)?,
            infantry_kill_rate: builder.top_players(infantry, Metric::KillRate)?,
            infantry_squads_offense: builder.top_squads(
                buckets.squads(SquadKind::Infantry),
                Metric::OffenseWeighted,
                infantry,
            ),
            infantry_squads_teamplay: builder.top_squads(
                buckets.squads(SquadKind::Infantry),
                Metric::TeamplayWeighted,
                infantry,
            ),
            armor_squads_offense: builder.top_squads(
                buckets.squads(SquadKind::Armor),
                Metric::OffenseWeighted,
                armor,
            ),
            armor_squads_teamplay: builder.top_squads(
                buckets.squads(SquadKind::Armor),
                Metric::TeamplayWeighted,
                armor,
            ),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.player_sections_empty() && self.squad_sections_empty()
    }

    pub(crate) fn player_sections_empty(&self) -> bool {
        self.commanders_teamplay.is_empty()
            && self.infantry_offense.is_empty()
            && self.infantry_teamplay.is_empty()
            && self.infantry_ratio.is_empty()
            && self.infantry_kill_rate.is_empty()
    }

    pub(crate) fn squad_sections_empty(&self) -> bool {
        self.infantry_squads_offense.is_empty()
            && self.infantry_squads_teamplay.is_empty()
            && self.armor_squads_offense.is_empty()
            && self.armor_squads_teamplay.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::connection::GrantLedger;
    use crate::stats::domain::{Counters, GrantRecord, Role, Team};
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingLedger {
        added: Mutex<Vec<String>>,
    }

    impl GrantLedger for CountingLedger {
        fn vip_grants(&self) -> Result<Vec<GrantRecord>, ConnectionError> {
            let added = self.added.lock().expect("ledger mutex poisoned");
            Ok(added
                .iter()
                .map(|player_id| GrantRecord {
                    player_id: player_id.clone(),
                    expires_at: None,
                })
                .collect())
        }

        fn add_grant(&self, player_id: &str, _label: &str, _expires_at: &str) -> Result<(), ConnectionError> {
            self.added
                .lock()
                .expect("ledger mutex poisoned")
                .push(player_id.to_string());
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 20, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn player(name: &str, team: Team, squad: &str, combat: u32) -> PlayerStat {
        PlayerStat {
            player_id: format!("id-{name}"),
            name: name.to_string(),
            team,
            role: Role::Rifleman,
            squad: Some(squad.to_string()),
            counters: Counters {
                kills: 10,
                deaths: 4,
                combat,
                offense: 300,
                defense: 300,
                support: 0,
            },
        }
    }

    fn squad(name: &str, team: Team, combat: u32) -> SquadStat {
        SquadStat {
            name: name.to_string(),
            team,
            kind: SquadKind::Infantry,
            counters: Counters {
                combat,
                offense: 100,
                defense: 50,
                ..Counters::default()
            },
        }
    }

    fn config_with_limit(limit: usize) -> TopStatsConfig {
        let mut config = TopStatsConfig::default();
        config.chat.players = limit;
        config.chat.squads = limit;
        config.match_end.players = limit;
        config.match_end.squads = limit;
        config
    }

    #[test]
    fn keeps_top_entries_in_stable_order_and_hides_zero_scores() {
        let config = config_with_limit(3);
        let builder = LeaderboardBuilder::new(&config, Mode::LiveQuery);
        let players = vec![
            player("First", Team::Allies, "able", 50),
            player("Second", Team::Axis, "anton", 50),
            player("Third", Team::Allies, "able", 30),
            player("Idle", Team::Axis, "anton", 0),
            player("Fifth", Team::Allies, "baker", 10),
        ];

        let output = builder
            .top_players(&players, Metric::TeamplayWeighted)
            .expect("no grants issued");

        assert_eq!(
            output,
            "First (all): 50 ; 0\nSecond (axi): 50 ; 0\nThird (all): 30 ; 0\n"
        );
    }

    #[test]
    fn zero_scores_never_print_even_inside_the_limit() {
        let config = config_with_limit(5);
        let builder = LeaderboardBuilder::new(&config, Mode::LiveQuery);
        let players = vec![
            player("Idle", Team::Axis, "anton", 0),
            player("Busy", Team::Allies, "able", 40),
        ];

        let output = builder
            .top_players(&players, Metric::TeamplayWeighted)
            .expect("no grants issued");

        assert_eq!(output, "Busy (all): 40 ; 0\n");
    }

    #[test]
    fn rate_metrics_print_the_computed_value() {
        let config = config_with_limit(3);
        let builder = LeaderboardBuilder::new(&config, Mode::LiveQuery);
        let players = vec![player("Sharp", Team::Axis, "anton", 10)];

        let ratio = builder
            .top_players(&players, Metric::Ratio)
            .expect("no grants issued");
        let kill_rate = builder
            .top_players(&players, Metric::KillRate)
            .expect("no grants issued");

        assert_eq!(ratio, "Sharp (axi): 2.5\n");
        // 600 / 20 = 30 minutes
        assert_eq!(kill_rate, "Sharp (axi): 0.3\n");
    }

    #[test]
    fn squads_list_members_for_the_configured_depth() {
        let mut config = config_with_limit(3);
        config.chat.squad_members = 1;
        let builder = LeaderboardBuilder::new(&config, Mode::LiveQuery);
        let squads = vec![squad("able", Team::Allies, 90), squad("able", Team::Axis, 120)];
        let members = vec![
            player("Smith", Team::Allies, "able", 10),
            player("Muller", Team::Axis, "able", 10),
            player("Weber", Team::Axis, "able", 10),
        ];

        let output = builder.top_squads(&squads, Metric::TeamplayWeighted, &members);

        assert_eq!(
            output,
            "■ able (axi): 120 ; 0\nMuller; Weber\n■ able (all): 90 ; 0\n"
        );
    }

    #[test]
    fn live_queries_never_grant() {
        let config = config_with_limit(3);
        let ledger = CountingLedger::default();
        let engine = GrantEngine::new(&config, &ledger, 100, now());
        let builder = LeaderboardBuilder::new(&config, Mode::LiveQuery).with_grants(&engine);
        let players = vec![player("First", Team::Allies, "able", 50)];

        let output = builder
            .top_players(&players, Metric::TeamplayWeighted)
            .expect("ledger reachable");

        assert_eq!(output, "First (all): 50 ; 0\n");
        assert!(ledger.added.lock().expect("ledger mutex poisoned").is_empty());
    }

    #[test]
    fn match_end_grants_top_winners_on_awarding_metrics_only() {
        let mut config = config_with_limit(3);
        config.grants.winners = 2;
        let ledger = CountingLedger::default();
        let engine = GrantEngine::new(&config, &ledger, 100, now());
        let builder = LeaderboardBuilder::new(&config, Mode::MatchEnd).with_grants(&engine);
        let players = vec![
            player("First", Team::Allies, "able", 50),
            player("Second", Team::Axis, "anton", 40),
            player("Third", Team::Allies, "able", 30),
        ];

        let ratio = builder
            .top_players(&players, Metric::Ratio)
            .expect("ledger reachable");
        assert!(!ratio.contains("VIP"));
        assert!(ledger.added.lock().expect("ledger mutex poisoned").is_empty());

        let output = builder
            .top_players(&players, Metric::TeamplayWeighted)
            .expect("ledger reachable");

        assert_eq!(
            output,
            "First (all): 50 ; 0\nVIP until 02/06/2025 à 07h00 !\n\
             Second (axi): 40 ; 0\nVIP until 02/06/2025 à 07h00 !\n\
             Third (all): 30 ; 0\n"
        );

        let again = builder
            .top_players(&players, Metric::TeamplayWeighted)
            .expect("ledger reachable");
        assert!(again.contains("First (all): 50 ; 0\nAlready VIP !\n"));
        assert_eq!(ledger.added.lock().expect("ledger mutex poisoned").len(), 2);
    }

    #[test]
    fn skipped_commander_does_not_use_an_award_rank() {
        let config = config_with_limit(3);
        let ledger = CountingLedger::default();
        let engine = GrantEngine::new(&config, &ledger, 100, now());
        let builder = LeaderboardBuilder::new(&config, Mode::MatchEnd).with_grants(&engine);

        let mut late = player("Late", Team::Allies, "command", 900);
        late.role = Role::ArmyCommander;
        late.counters.support = 5000;
        late.counters.offense = 100;
        late.counters.defense = 100;
        let mut steady = player("Steady", Team::Axis, "command", 500);
        steady.role = Role::ArmyCommander;
        steady.counters.support = 2500;
        steady.counters.offense = 600;
        steady.counters.defense = 400;

        let output = builder
            .top_players(&[late, steady], Metric::TeamplayWeighted)
            .expect("ledger reachable");

        assert_eq!(
            output,
            "Late (all): 8400 ; 5000\nSteady (axi): 4250 ; 2500\nVIP until 02/06/2025 à 07h00 !\n"
        );
        assert_eq!(
            *ledger.added.lock().expect("ledger mutex poisoned"),
            vec!["id-Steady".to_string()]
        );
    }

    #[test]
    fn build_fills_all_nine_boards() {
        let config = config_with_limit(3);
        let builder = LeaderboardBuilder::new(&config, Mode::LiveQuery);
        let buckets = Buckets {
            infantry_players: vec![player("Smith", Team::Allies, "able", 50)],
            infantry_squads: vec![squad("able", Team::Allies, 90)],
            ..Buckets::default()
        };

        let boards = Leaderboards::build(&buckets, &builder).expect("no grants issued");

        assert!(boards.commanders_teamplay.is_empty());
        assert!(!boards.infantry_offense.is_empty());
        assert!(!boards.infantry_ratio.is_empty());
        assert!(!boards.infantry_squads_teamplay.is_empty());
        assert!(boards.armor_squads_offense.is_empty());
        assert!(!boards.is_empty());
        assert!(Leaderboards::default().is_empty());
    }
}
