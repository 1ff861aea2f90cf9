use serde::Serialize;

use super::domain::{EventId, Group, GroupId, Participation, Rank, Score};

/// Storage abstraction for the group and participation tables.
///
/// Methods on the store itself are auto-commit: each one is atomic on its own.
/// Multi-step writes go through [`StandingsStore::begin`], which hands out a scoped
/// [`StoreTransaction`]. While a transaction is open no other writer observes its
/// intermediate steps.
pub trait StandingsStore: Send + Sync {
    type Transaction<'a>: StoreTransaction
    where
        Self: 'a;

    fn begin(&self) -> Result<Self::Transaction<'_>, StoreError>;

    /// Insert a group and return it with its newly assigned id.
    fn insert_group(&self, description: &str) -> Result<Group, StoreError>;
    fn find_group(&self, id: GroupId) -> Result<Option<Group>, StoreError>;
    fn list_groups(&self) -> Result<Vec<Group>, StoreError>;

    /// All participations in store iteration order.
    fn list_participations(&self) -> Result<Vec<Participation>, StoreError>;
    fn find_participation(
        &self,
        event_id: EventId,
        group_id: GroupId,
    ) -> Result<Option<Participation>, StoreError>;
    /// Fails with `Conflict` on a duplicate key and `NotFound` when the group is missing.
    fn insert_participation(&self, participation: Participation) -> Result<(), StoreError>;
    /// Fails with `NotFound` when there is no row for the pair.
    fn update_score(
        &self,
        event_id: EventId,
        group_id: GroupId,
        score: Score,
    ) -> Result<(), StoreError>;
    fn delete_participation(&self, event_id: EventId, group_id: GroupId)
        -> Result<(), StoreError>;

    /// Insert the participation, or overwrite its score when the pair already exists.
    fn upsert_participation(
        &self,
        event_id: EventId,
        group_id: GroupId,
        score: Score,
    ) -> Result<UpsertOutcome, StoreError> {
        match self.find_participation(event_id, group_id)? {
            Some(_) => {
                self.update_score(event_id, group_id, score)?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                self.insert_participation(Participation::new(event_id, group_id, score))?;
                Ok(UpsertOutcome::Inserted)
            }
        }
    }
}

/// A unit of work against the store.
///
/// Nothing is visible to other readers until [`StoreTransaction::commit`] succeeds.
/// Implementations must roll back when the value is dropped without a commit, so an
/// early return or `?` never leaves a half-applied write behind.
pub trait StoreTransaction {
    fn find_group(&self, id: GroupId) -> Result<Option<Group>, StoreError>;
    fn list_groups(&self) -> Result<Vec<Group>, StoreError>;
    fn list_participations(&self) -> Result<Vec<Participation>, StoreError>;

    /// Fails with `NotFound` when the group does not exist.
    fn set_best_rank(&mut self, id: GroupId, rank: Option<Rank>) -> Result<(), StoreError>;
    /// Returns the removed rows; removing nothing is not an error.
    fn delete_participations_for_group(
        &mut self,
        id: GroupId,
    ) -> Result<Vec<Participation>, StoreError>;
    /// Fails with `NotFound` when missing and `Conflict` while participations still
    /// reference the group.
    fn delete_group(&mut self, id: GroupId) -> Result<Group, StoreError>;

    fn commit(self) -> Result<(), StoreError>;
    fn rollback(self);
}

/// Which branch an upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Error enumeration for storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("constraint violated: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("snapshot persistence failed: {0}")]
    Persistence(String),
}
