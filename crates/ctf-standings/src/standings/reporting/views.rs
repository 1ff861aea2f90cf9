use chrono::{DateTime, Utc};
use serde::Serialize;

use super::super::domain::{EventId, GroupId, Rank, Score};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementView {
    pub event_id: EventId,
    pub score: Score,
    pub rank: Rank,
}

/// A group with every event it took part in.
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub group_id: GroupId,
    pub description: String,
    /// Cached value as stored on the group.
    pub best_rank: Option<Rank>,
    /// Event where the freshly computed best rank was reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_event: Option<EventId>,
    /// The cached best rank differs from a fresh computation.
    pub cache_stale: bool,
    pub placements: Vec<PlacementView>,
}

impl GroupReport {
    pub fn best_placement(&self) -> Option<&PlacementView> {
        let event_id = self.best_event?;
        self.placements
            .iter()
            .find(|placement| placement.event_id == event_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub generated_at: DateTime<Utc>,
    pub groups: Vec<GroupReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingEntry {
    pub rank: Rank,
    pub group_id: GroupId,
    pub description: String,
    pub score: Score,
}

/// Full ranking of one event.
#[derive(Debug, Clone, Serialize)]
pub struct EventStandings {
    pub event_id: EventId,
    pub participants: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<StandingEntry>,
    pub entries: Vec<StandingEntry>,
}
