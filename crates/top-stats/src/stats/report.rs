use super::leaderboard::Leaderboards;
use super::locale::{Locale, Phrase};
use super::metrics::MetricWeights;
use serde::Serialize;
use std::fmt::Write as _;

/// Text sent to players for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub text: String,
    /// `false` when `text` is only the "no stats yet" notice.
    pub has_stats: bool,
}

impl Report {
    pub fn compose(boards: &Leaderboards, locale: Locale, weights: &MetricWeights) -> Self {
        if boards.is_empty() {
            return Self {
                text: locale.text(Phrase::NoStatsYet).to_string(),
                has_stats: false,
            };
        }

        let mut text = String::new();
        let metric_header = |first: Phrase, second: Phrase| {
            format!("─ {} / {} ─", locale.text(first), locale.text(second))
        };
        let offense_header = metric_header(Phrase::Offense, Phrase::Defense);
        let teamplay_header = metric_header(Phrase::Combat, Phrase::Support);
        let ratio_header = format!("─ {} ─", locale.text(Phrase::Ratio));
        let kill_rate_header = format!("─ {} ─", locale.text(Phrase::KillRate));

        if !boards.player_sections_empty() {
            write!(text, "█ {} █\n\n", locale.text(Phrase::BestPlayers))
                .expect("write players title");

            if !boards.commanders_teamplay.is_empty() {
                write!(
                    text,
                    "▓ {} ▓\n\n─ {} + ({} * {}) ─\n{}\n",
                    locale.text(Phrase::ArmyCommander),
                    locale.text(Phrase::Combat),
                    locale.text(Phrase::Support),
                    weights.combat_support.factor(),
                    boards.commanders_teamplay
                )
                .expect("write commander board");
            }

            push_group(
                &mut text,
                locale.text(Phrase::Infantry),
                &[
                    (offense_header.as_str(), &boards.infantry_offense),
                    (teamplay_header.as_str(), &boards.infantry_teamplay),
                    (ratio_header.as_str(), &boards.infantry_ratio),
                    (kill_rate_header.as_str(), &boards.infantry_kill_rate),
                ],
            );
        }

        if !boards.squad_sections_empty() {
            write!(text, "\n█ {} █\n\n", locale.text(Phrase::BestSquads))
                .expect("write squads title");

            push_group(
                &mut text,
                locale.text(Phrase::Infantry),
                &[
                    (offense_header.as_str(), &boards.infantry_squads_offense),
                    (teamplay_header.as_str(), &boards.infantry_squads_teamplay),
                ],
            );
            push_group(
                &mut text,
                locale.text(Phrase::Tankers),
                &[
                    (offense_header.as_str(), &boards.armor_squads_offense),
                    (teamplay_header.as_str(), &boards.armor_squads_teamplay),
                ],
            );
        }

        Self {
            text,
            has_stats: true,
        }
    }
}

/// Writes a `▓ title ▓` group followed by its non-empty boards. Nothing if all are empty.
fn push_group(text: &mut String, title: &str, boards: &[(&str, &String)]) {
    if boards.iter().all(|(_, board)| board.is_empty()) {
        return;
    }

    write!(text, "▓ {title} ▓\n\n").expect("write group title");
    for (header, board) in boards.iter().filter(|(_, board)| !board.is_empty()) {
        write!(text, "{header}\n{board}\n").expect("write board");
    }
}
