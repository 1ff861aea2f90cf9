//! Group standings: ranking, transactional maintenance and read-only views.

pub mod command;
pub mod coordinator;
pub mod domain;
pub mod memory;
pub mod ranking;
pub mod reporting;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use command::{Command, CommandOutcome, StandingsService};
pub use coordinator::{
    ConsistencyCoordinator, RefreshOutcome, RemovalPhase, RemovalReport, ScoreReceipt,
    StandingsError,
};
pub use domain::{EventId, EventPlacement, Group, GroupId, Participation, Rank, Score};
pub use memory::{TableStore, TableTransaction, Tables};
pub use reporting::{
    EventStandings, ExportError, GroupReport, Leaderboard, PlacementView, ReportingFacade,
    StandingEntry, StandingsSnapshot,
};
pub use router::standings_router;
pub use store::{StandingsStore, StoreError, StoreTransaction, UpsertOutcome};
