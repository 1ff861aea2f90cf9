use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{EventId, Group, GroupId, Participation, Score};
use super::ranking::best_rank_per_group;
use super::store::{StandingsStore, StoreError, StoreTransaction, UpsertOutcome};

/// Runs the multi-step writes that must keep each group's cached best rank in line
/// with the participation table.
pub struct ConsistencyCoordinator<S> {
    store: Arc<S>,
}

impl<S> ConsistencyCoordinator<S>
where
    S: StandingsStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn add_group(&self, description: &str) -> Result<Group, StandingsError> {
        let group = self.store.insert_group(description)?;
        info!(group = %group.id, description = %group.description, "group added");
        Ok(group)
    }

    /// Record a group's score for an event, then refresh every best rank.
    ///
    /// The upsert commits on its own; the refresh is a separate pass whose outcome
    /// is reported in the receipt. A failed upsert returns before any refresh.
    pub fn report_score(
        &self,
        event_id: EventId,
        group_id: GroupId,
        score: Score,
    ) -> Result<ScoreReceipt, StandingsError> {
        let group = self
            .store
            .find_group(group_id)?
            .ok_or(StandingsError::GroupNotFound(group_id))?;

        // the group may be removed between the lookup and the write
        let write = match self.store.upsert_participation(event_id, group_id, score) {
            Ok(write) => write,
            Err(StoreError::NotFound(_)) => return Err(StandingsError::GroupNotFound(group_id)),
            Err(err) => return Err(err.into()),
        };
        info!(
            event = %event_id,
            group = %group_id,
            score,
            ?write,
            "score recorded"
        );

        let rankings = self.refresh_after_write();
        Ok(ScoreReceipt {
            participation: Participation::new(event_id, group_id, score),
            description: group.description,
            write,
            rankings,
        })
    }

    /// Delete one participation, then refresh every best rank.
    pub fn withdraw_participation(
        &self,
        event_id: EventId,
        group_id: GroupId,
    ) -> Result<RefreshOutcome, StandingsError> {
        match self.store.delete_participation(event_id, group_id) {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                return Err(StandingsError::ParticipationNotFound { event_id, group_id })
            }
            Err(err) => return Err(err.into()),
        }
        info!(event = %event_id, group = %group_id, "participation withdrawn");

        Ok(self.refresh_after_write())
    }

    /// Remove a group and all of its participations as one transaction.
    ///
    /// The best rank is cleared first, then the participations, then the group row.
    /// Any failure before the commit rolls everything back. Rankings of the remaining
    /// groups are refreshed after the commit, outside the transaction.
    pub fn remove_group(&self, group_id: GroupId) -> Result<RemovalReport, StandingsError> {
        let mut tx = self.store.begin()?;

        let Some(group) = tx.find_group(group_id)? else {
            tx.rollback();
            return Err(StandingsError::GroupNotFound(group_id));
        };

        let mut phase = RemovalPhase::Active;
        let removed = match Self::apply_removal(&mut tx, group_id, &mut phase) {
            Ok(removed) => removed,
            Err(source) => {
                tx.rollback();
                warn!(group = %group_id, %phase, error = %source, "group removal rolled back");
                return Err(StandingsError::RemovalAborted {
                    group_id,
                    phase,
                    source,
                });
            }
        };

        if let Err(source) = tx.commit() {
            warn!(group = %group_id, %phase, error = %source, "group removal commit failed");
            return Err(StandingsError::RemovalAborted {
                group_id,
                phase,
                source,
            });
        }

        let mut events: Vec<EventId> = removed.iter().map(|row| row.event_id).collect();
        events.sort();
        info!(
            group = %group_id,
            description = %group.description,
            participations = events.len(),
            "group removed"
        );

        let rankings = self.refresh_after_write();
        Ok(RemovalReport {
            group_id,
            description: group.description,
            events,
            rankings,
        })
    }

    fn apply_removal(
        tx: &mut S::Transaction<'_>,
        group_id: GroupId,
        phase: &mut RemovalPhase,
    ) -> Result<Vec<Participation>, StoreError> {
        tx.set_best_rank(group_id, None)?;
        *phase = RemovalPhase::RankCleared;
        debug!(group = %group_id, %phase, "removal step applied");

        let removed = tx.delete_participations_for_group(group_id)?;
        *phase = RemovalPhase::ParticipationsCleared;
        debug!(group = %group_id, %phase, rows = removed.len(), "removal step applied");

        tx.delete_group(group_id)?;
        *phase = RemovalPhase::Removed;
        debug!(group = %group_id, %phase, "removal step applied");

        Ok(removed)
    }

    /// Recompute best ranks from the participation table and store every change.
    ///
    /// Reads and writes happen inside one transaction. Groups without participations
    /// are reset to no rank. Returns how many groups changed.
    pub fn refresh_best_ranks(&self) -> Result<usize, StandingsError> {
        let mut tx = self.store.begin()?;
        let best = best_rank_per_group(&tx.list_participations()?);

        let mut updated = 0;
        for group in tx.list_groups()? {
            let target = best.get(&group.id).copied();
            if group.best_rank != target {
                tx.set_best_rank(group.id, target)?;
                updated += 1;
            }
        }

        tx.commit()?;
        debug!(updated, "best ranks refreshed");
        Ok(updated)
    }

    fn refresh_after_write(&self) -> RefreshOutcome {
        match self.refresh_best_ranks() {
            Ok(updated) => RefreshOutcome::Applied { updated },
            Err(err) => {
                warn!(error = %err, "best rank refresh deferred");
                RefreshOutcome::Deferred {
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// States a group passes through while it is being removed. Only `Removed` is ever
/// made durable; a failure in any earlier state rolls back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPhase {
    Active,
    RankCleared,
    ParticipationsCleared,
    Removed,
}

impl RemovalPhase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::RankCleared => "rank cleared",
            Self::ParticipationsCleared => "participations cleared",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for RemovalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of the best-rank pass that follows a committed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RefreshOutcome {
    Applied { updated: usize },
    Deferred { reason: String },
}

impl RefreshOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreReceipt {
    pub participation: Participation,
    pub description: String,
    pub write: UpsertOutcome,
    pub rankings: RefreshOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovalReport {
    pub group_id: GroupId,
    pub description: String,
    /// Events the group had participations in, ascending.
    pub events: Vec<EventId>,
    pub rankings: RefreshOutcome,
}

/// Error raised by the standings workflows.
#[derive(Debug, thiserror::Error)]
pub enum StandingsError {
    #[error("group {0} does not exist")]
    GroupNotFound(GroupId),
    #[error("group {group_id} has no participation in event {event_id}")]
    ParticipationNotFound { event_id: EventId, group_id: GroupId },
    #[error("event {0} has no participations")]
    EventNotFound(EventId),
    #[error("removal of group {group_id} rolled back after reaching '{phase}': {source}")]
    RemovalAborted {
        group_id: GroupId,
        phase: RemovalPhase,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StandingsError {
    /// Missing records are reported to the caller rather than treated as failures
    /// of the store.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GroupNotFound(_) | Self::ParticipationNotFound { .. } | Self::EventNotFound(_)
        )
    }
}
