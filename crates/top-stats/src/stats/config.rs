use super::domain::Mode;
use super::locale::{Language, Locale};
use super::metrics::{MetricWeights, Weight};
use chrono_tz::Tz;

/// Leaderboard sizes for one trigger mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeLimits {
    pub players: usize,
    pub squads: usize,
    /// Number of top squads whose member names are listed. 0 disables.
    pub squad_members: usize,
}

/// Match-end VIP award rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantPolicy {
    /// Top N players of each awarding leaderboard. 0 disables grants.
    pub winners: usize,
    pub hours: u32,
    /// Minimum in-session players for grants to be issued. 0 disables the gate.
    pub seed_limit: usize,
    pub commander_min_playtime_mins: u32,
    pub commander_min_support: u32,
}

impl GrantPolicy {
    pub fn is_enabled(&self) -> bool {
        self.winners > 0 && self.hours > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    pub language: Language,
    pub timezone: Tz,
    /// `strftime`-style pattern used for VIP expiry announcements.
    pub time_format: String,
}

/// Immutable engine configuration, built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct TopStatsConfig {
    /// Identifier of the game server this process is attached to.
    pub server_number: String,
    pub enabled_servers: Vec<String>,
    pub chat_command: String,
    pub weights: MetricWeights,
    pub chat: ModeLimits,
    pub match_end: ModeLimits,
    pub grants: GrantPolicy,
    pub display: DisplaySettings,
}

impl TopStatsConfig {
    pub fn limits(&self, mode: Mode) -> ModeLimits {
        match mode {
            Mode::LiveQuery => self.chat,
            Mode::MatchEnd => self.match_end,
        }
    }

    pub fn locale(&self) -> Locale {
        Locale::new(self.display.language)
    }

    pub fn is_enabled_on_server(&self) -> bool {
        self.enabled_servers
            .iter()
            .any(|server| server == &self.server_number)
    }
}

impl Default for TopStatsConfig {
    fn default() -> Self {
        Self {
            server_number: "1".to_string(),
            enabled_servers: vec!["1".to_string()],
            chat_command: "!top".to_string(),
            weights: MetricWeights {
                offense_defense: Weight::new(1.5),
                combat_support: Weight::new(1.5),
            },
            chat: ModeLimits {
                players: 3,
                squads: 3,
                squad_members: 0,
            },
            match_end: ModeLimits {
                players: 3,
                squads: 3,
                squad_members: 1,
            },
            grants: GrantPolicy {
                winners: 1,
                hours: 14,
                seed_limit: 70,
                commander_min_playtime_mins: 40,
                commander_min_support: 2000,
            },
            display: DisplaySettings {
                language: Language::English,
                timezone: chrono_tz::Brazil::East,
                time_format: "%d/%m/%Y à %Hh%M".to_string(),
            },
        }
    }
}
