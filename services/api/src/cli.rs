use crate::infra;
use crate::render::render_outcome;
use crate::server;
use clap::{Args, Parser, Subcommand};
use ctf_standings::config::AppConfig;
use ctf_standings::error::AppError;
use ctf_standings::standings::{
    Command, CommandOutcome, EventId, GroupId, RefreshOutcome, Score, StandingsService,
    TableStore,
};
use ctf_standings::telemetry;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "ctf-standings",
    about = "Track group scores and best ranks across CTF events",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Register, inspect and remove groups
    Group {
        #[command(subcommand)]
        command: GroupCommand,
    },
    /// Record or withdraw a group's score in an event
    Score {
        #[command(subcommand)]
        command: ScoreCommand,
    },
    /// Inspect event rankings
    Event {
        #[command(subcommand)]
        command: EventCommand,
    },
    /// Write every placement as CSV
    Export(ExportArgs),
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    /// Register a new group
    Add { description: String },
    /// List every group ordered by best rank
    List,
    /// Show one group with its placements
    Show { group_id: u32 },
    /// Remove a group together with all of its participations
    Remove { group_id: u32 },
}

#[derive(Subcommand, Debug)]
enum ScoreCommand {
    /// Record (or overwrite) the score of a group in an event
    Report {
        event_id: u32,
        group_id: u32,
        #[arg(allow_negative_numbers = true)]
        score: Score,
    },
    /// Delete the participation of a group in an event
    Withdraw { event_id: u32, group_id: u32 },
}

#[derive(Subcommand, Debug)]
enum EventCommand {
    /// Show the full ranking of an event
    Show { event_id: u32 },
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

#[derive(Args, Debug, Default)]
struct ExportArgs {
    /// Destination file (defaults to stdout)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl From<GroupCommand> for Command {
    fn from(value: GroupCommand) -> Self {
        match value {
            GroupCommand::Add { description } => Command::AddGroup { description },
            GroupCommand::List => Command::ListGroups,
            GroupCommand::Show { group_id } => Command::ShowGroup {
                group_id: GroupId(group_id),
            },
            GroupCommand::Remove { group_id } => Command::RemoveGroup {
                group_id: GroupId(group_id),
            },
        }
    }
}

impl From<ScoreCommand> for Command {
    fn from(value: ScoreCommand) -> Self {
        match value {
            ScoreCommand::Report {
                event_id,
                group_id,
                score,
            } => Command::ReportScore {
                event_id: EventId(event_id),
                group_id: GroupId(group_id),
                score,
            },
            ScoreCommand::Withdraw { event_id, group_id } => Command::WithdrawParticipation {
                event_id: EventId(event_id),
                group_id: GroupId(group_id),
            },
        }
    }
}

impl From<EventCommand> for Command {
    fn from(value: EventCommand) -> Self {
        match value {
            EventCommand::Show { event_id } => Command::ShowEvent {
                event_id: EventId(event_id),
            },
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| CliCommand::Serve(ServeArgs::default()));

    match command {
        CliCommand::Serve(args) => server::run(args).await,
        CliCommand::Group { command } => execute(command.into()),
        CliCommand::Score { command } => execute(command.into()),
        CliCommand::Event { command } => execute(command.into()),
        CliCommand::Export(args) => export(args),
    }
}

fn bootstrap() -> Result<Arc<StandingsService<TableStore>>, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(infra::standings_service(&config.storage)?)
}

fn execute(command: Command) -> Result<(), AppError> {
    let service = bootstrap()?;
    let outcome = service.execute(command)?;
    println!("{}", render_outcome(&outcome));

    if outcome.succeeded() {
        Ok(())
    } else {
        let reason = deferred_reason(&outcome).unwrap_or("refresh deferred");
        Err(AppError::Incomplete(reason.to_string()))
    }
}

fn deferred_reason(outcome: &CommandOutcome) -> Option<&str> {
    let rankings = match outcome {
        CommandOutcome::ScoreRecorded(receipt) => &receipt.rankings,
        CommandOutcome::ParticipationWithdrawn(rankings) => rankings,
        CommandOutcome::GroupRemoved(report) => &report.rankings,
        _ => return None,
    };
    match rankings {
        RefreshOutcome::Deferred { reason } => Some(reason.as_str()),
        RefreshOutcome::Applied { .. } => None,
    }
}

fn export(args: ExportArgs) -> Result<(), AppError> {
    let service = bootstrap()?;

    match args.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(&path)?);
            service.reporting().export_csv(&mut writer)?;
            writer.flush()?;
            info!(path = %path.display(), "standings exported");
        }
        None => {
            let stdout = std::io::stdout();
            service.reporting().export_csv(stdout.lock())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliCommand {
        Cli::try_parse_from(std::iter::once("ctf-standings").chain(args.iter().copied()))
            .expect("arguments parse")
            .command
            .expect("subcommand present")
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["ctf-standings"]).expect("no arguments parse");
        assert!(cli.command.is_none());

        match parse(&["serve", "--port", "8080"]) {
            CliCommand::Serve(args) => {
                assert_eq!(args.port, Some(8080));
                assert!(args.host.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn score_report_accepts_negative_scores() {
        match parse(&["score", "report", "3", "1", "-20"]) {
            CliCommand::Score { command } => assert_eq!(
                Command::from(command),
                Command::ReportScore {
                    event_id: EventId(3),
                    group_id: GroupId(1),
                    score: -20,
                }
            ),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn group_subcommands_map_onto_commands() {
        let cases = [
            (
                vec!["group", "add", "Null Pointers"],
                Command::AddGroup {
                    description: "Null Pointers".to_string(),
                },
            ),
            (vec!["group", "list"], Command::ListGroups),
            (
                vec!["group", "show", "4"],
                Command::ShowGroup {
                    group_id: GroupId(4),
                },
            ),
            (
                vec!["group", "remove", "4"],
                Command::RemoveGroup {
                    group_id: GroupId(4),
                },
            ),
        ];

        for (args, expected) in cases {
            match parse(&args) {
                CliCommand::Group { command } => assert_eq!(Command::from(command), expected),
                other => panic!("unexpected command {other:?}"),
            }
        }
    }

    #[test]
    fn non_numeric_ids_are_rejected() {
        let result = Cli::try_parse_from(["ctf-standings", "event", "show", "ten"]);
        assert!(result.is_err());
    }

    #[test]
    fn export_takes_an_optional_output_path() {
        match parse(&["export", "--output", "standings.csv"]) {
            CliCommand::Export(args) => {
                assert_eq!(args.output, Some(PathBuf::from("standings.csv")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn deferred_refresh_reason_is_surfaced() {
        let outcome = CommandOutcome::ParticipationWithdrawn(RefreshOutcome::Deferred {
            reason: "store unavailable".to_string(),
        });
        assert!(!outcome.succeeded());
        assert_eq!(deferred_reason(&outcome), Some("store unavailable"));
    }
}
