use crate::stats::{
    DisplaySettings, GrantPolicy, Language, MetricWeights, ModeLimits, TopStatsConfig, Weight,
};
use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub top_stats: TopStatsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                show_targets: environment == AppEnvironment::Development,
            },
            top_stats: load_top_stats()?,
        })
    }
}

fn load_top_stats() -> Result<TopStatsConfig, ConfigError> {
    let defaults = TopStatsConfig::default();

    let language = match env::var("TOPSTATS_LANGUAGE") {
        Ok(value) => Language::parse(&value).ok_or(ConfigError::InvalidLanguage { value })?,
        Err(_) => defaults.display.language,
    };

    let timezone = match env::var("TOPSTATS_TIMEZONE") {
        Ok(value) => value
            .trim()
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone { value })?,
        Err(_) => defaults.display.timezone,
    };

    let time_format =
        env::var("TOPSTATS_TIME_FORMAT").unwrap_or_else(|_| defaults.display.time_format.clone());
    if StrftimeItems::new(&time_format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidTimeFormat { value: time_format });
    }

    let enabled_servers = match env::var("TOPSTATS_ENABLED_SERVERS") {
        Ok(value) => value
            .split(',')
            .map(str::trim)
            .filter(|server| !server.is_empty())
            .map(str::to_string)
            .collect(),
        Err(_) => defaults.enabled_servers.clone(),
    };

    Ok(TopStatsConfig {
        server_number: env::var("TOPSTATS_SERVER_NUMBER")
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|_| defaults.server_number.clone()),
        enabled_servers,
        chat_command: env::var("TOPSTATS_CHAT_COMMAND")
            .unwrap_or_else(|_| defaults.chat_command.clone()),
        weights: MetricWeights {
            offense_defense: weight(
                "TOPSTATS_OFFENSE_DEFENSE_WEIGHT",
                defaults.weights.offense_defense,
            )?,
            combat_support: weight(
                "TOPSTATS_COMBAT_SUPPORT_WEIGHT",
                defaults.weights.combat_support,
            )?,
        },
        chat: mode_limits("TOPSTATS_CHAT", defaults.chat)?,
        match_end: mode_limits("TOPSTATS_MATCHEND", defaults.match_end)?,
        grants: GrantPolicy {
            winners: env_or("TOPSTATS_VIP_WINNERS", defaults.grants.winners)?,
            hours: env_or("TOPSTATS_VIP_HOURS", defaults.grants.hours)?,
            seed_limit: env_or("TOPSTATS_SEED_LIMIT", defaults.grants.seed_limit)?,
            commander_min_playtime_mins: env_or(
                "TOPSTATS_VIP_COMMANDER_MIN_PLAYTIME_MINS",
                defaults.grants.commander_min_playtime_mins,
            )?,
            commander_min_support: env_or(
                "TOPSTATS_VIP_COMMANDER_MIN_SUPPORT",
                defaults.grants.commander_min_support,
            )?,
        },
        display: DisplaySettings {
            language,
            timezone,
            time_format,
        },
    })
}

fn mode_limits(prefix: &str, defaults: ModeLimits) -> Result<ModeLimits, ConfigError> {
    Ok(ModeLimits {
        players: env_or(&format!("{prefix}_TOP_PLAYERS"), defaults.players)?,
        squads: env_or(&format!("{prefix}_TOP_SQUADS"), defaults.squads)?,
        squad_members: env_or(&format!("{prefix}_SQUAD_MEMBERS"), defaults.squad_members)?,
    })
}

/// NaN and infinities are rejected.
fn weight(key: &str, default: Weight) -> Result<Weight, ConfigError> {
    let Ok(value) = env::var(key) else {
        return Ok(default);
    };
    match value.trim().parse::<f64>() {
        Ok(raw) if raw.is_finite() => Ok(Weight::new(raw)),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub show_targets: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { key: String, value: String },
    InvalidLanguage { value: String },
    InvalidTimezone { value: String },
    InvalidTimeFormat { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} has an invalid value '{value}'")
            }
            ConfigError::InvalidLanguage { value } => write!(
                f,
                "TOPSTATS_LANGUAGE '{value}' is not one of en, fr, de, pt-br"
            ),
            ConfigError::InvalidTimezone { value } => {
                write!(f, "TOPSTATS_TIMEZONE '{value}' is not an IANA time zone")
            }
            ConfigError::InvalidTimeFormat { value } => {
                write!(f, "TOPSTATS_TIME_FORMAT '{value}' is not a valid strftime pattern")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidValue { .. }
            | ConfigError::InvalidLanguage { .. }
            | ConfigError::InvalidTimezone { .. }
            | ConfigError::InvalidTimeFormat { .. } => None,
        }
    }
}
