use std::sync::Arc;

use serde::Serialize;

use super::coordinator::{
    ConsistencyCoordinator, RefreshOutcome, RemovalReport, ScoreReceipt, StandingsError,
};
use super::domain::{EventId, Group, GroupId, Score};
use super::reporting::{EventStandings, GroupReport, Leaderboard, ReportingFacade};
use super::store::StandingsStore;

/// Every operation the front-ends can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddGroup { description: String },
    ReportScore { event_id: EventId, group_id: GroupId, score: Score },
    WithdrawParticipation { event_id: EventId, group_id: GroupId },
    RemoveGroup { group_id: GroupId },
    ShowGroup { group_id: GroupId },
    ListGroups,
    ShowEvent { event_id: EventId },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "data")]
pub enum CommandOutcome {
    GroupAdded(Group),
    ScoreRecorded(ScoreReceipt),
    ParticipationWithdrawn(RefreshOutcome),
    GroupRemoved(RemovalReport),
    Group(GroupReport),
    Leaderboard(Leaderboard),
    Event(EventStandings),
}

impl CommandOutcome {
    /// Whether the command fully completed, including any best-rank refresh.
    pub fn succeeded(&self) -> bool {
        match self {
            Self::ScoreRecorded(receipt) => receipt.rankings.is_applied(),
            Self::ParticipationWithdrawn(rankings) => rankings.is_applied(),
            Self::GroupRemoved(report) => report.rankings.is_applied(),
            Self::GroupAdded(_) | Self::Group(_) | Self::Leaderboard(_) | Self::Event(_) => true,
        }
    }
}

/// Facade pairing the write coordinator with the read-only reporting views.
pub struct StandingsService<S> {
    coordinator: ConsistencyCoordinator<S>,
    reporting: ReportingFacade<S>,
}

impl<S> StandingsService<S>
where
    S: StandingsStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            coordinator: ConsistencyCoordinator::new(store.clone()),
            reporting: ReportingFacade::new(store),
        }
    }

    pub fn coordinator(&self) -> &ConsistencyCoordinator<S> {
        &self.coordinator
    }

    pub fn reporting(&self) -> &ReportingFacade<S> {
        &self.reporting
    }

    pub fn execute(&self, command: Command) -> Result<CommandOutcome, StandingsError> {
        let outcome = match command {
            Command::AddGroup { description } => {
                CommandOutcome::GroupAdded(self.coordinator.add_group(&description)?)
            }
            Command::ReportScore {
                event_id,
                group_id,
                score,
            } => CommandOutcome::ScoreRecorded(
                self.coordinator.report_score(event_id, group_id, score)?,
            ),
            Command::WithdrawParticipation { event_id, group_id } => {
                CommandOutcome::ParticipationWithdrawn(
                    self.coordinator.withdraw_participation(event_id, group_id)?,
                )
            }
            Command::RemoveGroup { group_id } => {
                CommandOutcome::GroupRemoved(self.coordinator.remove_group(group_id)?)
            }
            Command::ShowGroup { group_id } => {
                CommandOutcome::Group(self.reporting.group_report(group_id)?)
            }
            Command::ListGroups => CommandOutcome::Leaderboard(self.reporting.leaderboard()?),
            Command::ShowEvent { event_id } => {
                CommandOutcome::Event(self.reporting.event_standings(event_id)?)
            }
        };
        Ok(outcome)
    }
}
