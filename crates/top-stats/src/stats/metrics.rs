use super::domain::{Counters, StatRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weighting coefficient. The sign is discarded on construction and zero disables weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Weight(f64);

impl Weight {
    pub fn new(raw: f64) -> Self {
        Self(raw.abs())
    }

    /// Multiplier actually applied. Zero means "disabled" and behaves as 1.
    pub fn factor(self) -> f64 {
        if self.0 == 0.0 {
            1.0
        } else {
            self.0
        }
    }
}

impl From<f64> for Weight {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Weight> for f64 {
    fn from(value: Weight) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricWeights {
    pub offense_defense: Weight,
    pub combat_support: Weight,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            offense_defense: Weight::new(1.5),
            combat_support: Weight::new(1.5),
        }
    }
}

/// Leaderboard scoring functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// kills / deaths
    Ratio,
    /// offense x (defense x weight)
    OffenseWeighted,
    /// combat + (support x weight)
    TeamplayWeighted,
    /// kills per minute of estimated playtime
    KillRate,
}

impl Metric {
    pub fn score(self, record: &impl StatRecord, weights: &MetricWeights) -> Score {
        let counters = record.counters();
        match self {
            Self::Ratio => Score::Rate(ratio(counters)),
            Self::OffenseWeighted => {
                Score::Points(offense_weighted(counters, weights.offense_defense))
            }
            Self::TeamplayWeighted => {
                Score::Points(teamplay_weighted(counters, weights.combat_support))
            }
            Self::KillRate => Score::Rate(kill_rate(counters)),
        }
    }

    /// Rate leaderboards never award VIP.
    pub const fn awards_grants(self) -> bool {
        matches!(self, Self::OffenseWeighted | Self::TeamplayWeighted)
    }

    pub fn detail(self, record: &impl StatRecord, weights: &MetricWeights) -> LineDetail {
        let counters = record.counters();
        match self {
            Self::OffenseWeighted => LineDetail::RawPair {
                first: counters.offense,
                second: counters.defense,
            },
            Self::TeamplayWeighted => LineDetail::RawPair {
                first: counters.combat,
                second: counters.support,
            },
            Self::Ratio | Self::KillRate => LineDetail::ComputedRate(self.score(record, weights)),
        }
    }
}

/// Value a record is ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Score {
    Points(u64),
    Rate(f64),
}

impl Score {
    pub fn is_zero(self) -> bool {
        match self {
            Self::Points(points) => points == 0,
            Self::Rate(rate) => rate == 0.0,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Self::Points(points) => points as f64,
            Self::Rate(rate) => rate,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Points(points) => write!(f, "{points}"),
            Self::Rate(rate) => write!(f, "{rate:.1}"),
        }
    }
}

/// Columns printed after a leaderboard entry's name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineDetail {
    RawPair { first: u32, second: u32 },
    ComputedRate(Score),
}

impl fmt::Display for LineDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawPair { first, second } => write!(f, "{first} ; {second}"),
            Self::ComputedRate(score) => write!(f, "{score}"),
        }
    }
}

/// One decimal, exact halves rounded to the even digit.
fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

pub fn ratio(counters: &Counters) -> f64 {
    let deaths = counters.deaths.max(1);
    round_tenths(f64::from(counters.kills) / f64::from(deaths))
}

pub fn offense_weighted(counters: &Counters, weight: Weight) -> u64 {
    let product = f64::from(counters.offense) * (f64::from(counters.defense) * weight.factor());
    product as u64
}

pub fn teamplay_weighted(counters: &Counters, weight: Weight) -> u64 {
    let sum = f64::from(counters.combat) + f64::from(counters.support) * weight.factor();
    sum as u64
}

pub fn kill_rate(counters: &Counters) -> f64 {
    if counters.kills == 0 || (counters.offense == 0 && counters.defense == 0) {
        return 0.0;
    }
    let minutes = counters.playtime_minutes();
    round_tenths(f64::from(counters.kills) / minutes)
}
