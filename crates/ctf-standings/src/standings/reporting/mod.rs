//! Read-only standings views for the CLI and HTTP consumers.

mod export;
pub mod views;

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::coordinator::StandingsError;
use super::domain::{EventId, Group, GroupId, Participation, Rank};
use super::ranking::{best_placement_per_group, best_rank_per_group, rank_all_events, rank_event};
use super::store::StandingsStore;

pub use views::{EventStandings, GroupReport, Leaderboard, PlacementView, StandingEntry};

/// Both tables as read at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct StandingsSnapshot {
    pub groups: Vec<Group>,
    pub participations: Vec<Participation>,
}

impl StandingsSnapshot {
    /// Fresh best rank for every group in the snapshot, `None` when it has no
    /// participations.
    pub fn best_ranks(&self) -> BTreeMap<GroupId, Option<Rank>> {
        let best = best_rank_per_group(&self.participations);
        self.groups
            .iter()
            .map(|group| (group.id, best.get(&group.id).copied()))
            .collect()
    }

    fn group_reports(&self) -> Vec<GroupReport> {
        let ranked = rank_all_events(&self.participations);
        let best = best_placement_per_group(&self.participations);

        self.groups
            .iter()
            .map(|group| {
                let placements = ranked
                    .values()
                    .flatten()
                    .filter(|placement| placement.group_id == group.id)
                    .map(|placement| PlacementView {
                        event_id: placement.event_id,
                        score: placement.score,
                        rank: placement.rank,
                    })
                    .collect();
                let fresh = best.get(&group.id);

                GroupReport {
                    group_id: group.id,
                    description: group.description.clone(),
                    best_rank: group.best_rank,
                    best_event: fresh.map(|placement| placement.event_id),
                    cache_stale: group.best_rank != fresh.map(|placement| placement.rank),
                    placements,
                }
            })
            .collect()
    }
}

/// Assembles participation and ranking views without writing anything.
pub struct ReportingFacade<S> {
    store: Arc<S>,
}

impl<S> ReportingFacade<S>
where
    S: StandingsStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn snapshot(&self) -> Result<StandingsSnapshot, StandingsError> {
        Ok(StandingsSnapshot {
            groups: self.store.list_groups()?,
            participations: self.store.list_participations()?,
        })
    }

    pub fn group_report(&self, group_id: GroupId) -> Result<GroupReport, StandingsError> {
        self.snapshot()?
            .group_reports()
            .into_iter()
            .find(|report| report.group_id == group_id)
            .ok_or(StandingsError::GroupNotFound(group_id))
    }

    /// Every group, best ranked first; groups without a rank come last.
    pub fn leaderboard(&self) -> Result<Leaderboard, StandingsError> {
        let mut groups = self.snapshot()?.group_reports();
        groups.sort_by_key(|report| (report.best_rank.is_none(), report.best_rank, report.group_id));

        Ok(Leaderboard {
            generated_at: Utc::now(),
            groups,
        })
    }

    pub fn event_standings(&self, event_id: EventId) -> Result<EventStandings, StandingsError> {
        let snapshot = self.snapshot()?;
        let rows: Vec<Participation> = snapshot
            .participations
            .iter()
            .filter(|row| row.event_id == event_id)
            .cloned()
            .collect();
        if rows.is_empty() {
            return Err(StandingsError::EventNotFound(event_id));
        }

        let descriptions: BTreeMap<GroupId, &str> = snapshot
            .groups
            .iter()
            .map(|group| (group.id, group.description.as_str()))
            .collect();

        let entries: Vec<StandingEntry> = rank_event(&rows)
            .into_iter()
            .map(|placement| StandingEntry {
                rank: placement.rank,
                group_id: placement.group_id,
                description: descriptions
                    .get(&placement.group_id)
                    .copied()
                    .unwrap_or_default()
                    .to_string(),
                score: placement.score,
            })
            .collect();

        Ok(EventStandings {
            event_id,
            participants: entries.len(),
            winner: entries.first().cloned(),
            entries,
        })
    }

    /// Export every group and placement as CSV.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let reports = self.snapshot()?.group_reports();
        export::write_reports(&reports, writer)?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Standings(#[from] StandingsError),
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
}
