use crate::infra::{roster, InMemoryGameServer};
use crate::server;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use top_stats::config::AppConfig;
use top_stats::error::AppError;
use top_stats::stats::{Mode, TelemetrySource, TopStatsService, TriggerOutcome};

#[derive(Parser, Debug)]
#[command(
    name = "Top Stats",
    about = "Leaderboards and match-end VIP rewards for a game server",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Render the leaderboards for a saved team view
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReportMode {
    /// Live leaderboards as sent for the chat command
    Chat,
    /// Final leaderboards, issuing VIP grants
    MatchEnd,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Team view JSON file as returned by the game server
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    #[arg(long, value_enum, default_value_t = ReportMode::Chat)]
    pub(crate) mode: ReportMode,
    /// Players on the server (defaults to the players found in the team view)
    #[arg(long)]
    pub(crate) players: Option<usize>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args),
    }
}

fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        snapshot,
        mode,
        players,
    } = args;

    let config = AppConfig::load()?;
    let raw = std::fs::read_to_string(&snapshot)?;
    let team_view: serde_json::Value = serde_json::from_str(&raw)?;
    let session_players = players.unwrap_or_else(|| roster(&team_view).len());

    let game = Arc::new(InMemoryGameServer::default());
    game.load_match(team_view, session_players, None);

    let service = TopStatsService::new(Arc::clone(&game), config.top_stats);

    match mode {
        ReportMode::Chat => {
            let report = service.report_at(Mode::LiveQuery, Utc::now())?;
            println!("{}", report.text);
        }
        ReportMode::MatchEnd => match service.on_match_end()? {
            TriggerOutcome::ServerNotEnabled => {
                println!("Top stats are not enabled on this server.");
            }
            TriggerOutcome::NoStats { report } => println!("{}", report.text),
            TriggerOutcome::Broadcast { report, summary } => {
                println!("{}", report.text);
                println!(
                    "Broadcast to {} player(s), {} failed.",
                    summary.delivered, summary.failed
                );
                render_grants(&game);
            }
            TriggerOutcome::Ignored | TriggerOutcome::Replied { .. } => {}
        },
    }

    Ok(())
}

fn render_grants(game: &InMemoryGameServer) {
    let grants = game.vips();
    if grants.is_empty() {
        println!("No VIP granted (population {}).", session_label(game));
        return;
    }

    println!("VIP granted:");
    for grant in grants {
        println!(
            "- {} ({}) until {}",
            grant.label,
            grant.player_id,
            grant.expires_at.as_deref().unwrap_or("never")
        );
    }
}

fn session_label(game: &InMemoryGameServer) -> String {
    game.session_player_count()
        .map(|count| count.to_string())
        .unwrap_or_else(|err| err.to_string())
}
