use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{EventId, Group, GroupId, Participation, Rank, Score};
use super::store::{StandingsStore, StoreError, StoreTransaction, UpsertOutcome};

/// Both tables plus the id sequence, as held in memory and written to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tables {
    next_group_id: u32,
    groups: BTreeMap<GroupId, Group>,
    participations: Vec<Participation>,
}

impl Tables {
    /// Next free id, never below one past the highest id already in the table.
    fn allocate_group_id(&mut self) -> GroupId {
        let after_last = self.groups.keys().next_back().map_or(1, |id| id.0 + 1);
        self.next_group_id = self.next_group_id.max(after_last);
        let id = GroupId(self.next_group_id);
        self.next_group_id += 1;
        id
    }

    fn position(&self, event_id: EventId, group_id: GroupId) -> Option<usize> {
        self.participations
            .iter()
            .position(|row| row.key() == (event_id, group_id))
    }

    fn group_mut(&mut self, id: GroupId) -> Result<&mut Group, StoreError> {
        self.groups
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("group {id}")))
    }
}

/// In-process implementation of [`StandingsStore`].
///
/// With a data path the tables are loaded from a JSON snapshot at open and the
/// snapshot is rewritten after every committed write. A snapshot that cannot be
/// written fails the write and the in-memory tables stay as they were.
#[derive(Debug, Default)]
pub struct TableStore {
    tables: Mutex<Tables>,
    snapshot_path: Option<PathBuf>,
}

impl TableStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store persisted at `path`, starting empty when the file is absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let tables = if path.exists() {
            let file = File::open(&path).map_err(|err| persistence_error(&path, err))?;
            serde_json::from_reader(BufReader::new(file))
                .map_err(|err| persistence_error(&path, err))?
        } else {
            Tables::default()
        };

        debug!(path = %path.display(), groups = tables.groups.len(), "table store opened");

        Ok(Self {
            tables: Mutex::new(tables),
            snapshot_path: Some(path),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// A copy of the current committed tables.
    pub fn tables(&self) -> Result<Tables, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("table lock poisoned".to_string()))
    }

    /// Apply `change` to a copy of the tables and publish it only when the change and
    /// the snapshot write both succeed.
    fn write<T>(
        &self,
        change: impl FnOnce(&mut Tables) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.lock()?;
        let mut working = guard.clone();
        let value = change(&mut working)?;
        self.persist(&working)?;
        *guard = working;
        Ok(value)
    }

    fn persist(&self, tables: &Tables) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let staging = path.with_extension("json.tmp");
        let file = File::create(&staging).map_err(|err| persistence_error(&staging, err))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, tables)
            .map_err(|err| persistence_error(&staging, err))?;
        writer
            .flush()
            .map_err(|err| persistence_error(&staging, err))?;
        fs::rename(&staging, path).map_err(|err| persistence_error(path, err))
    }
}

fn persistence_error(path: &Path, err: impl std::fmt::Display) -> StoreError {
    StoreError::Persistence(format!("{}: {err}", path.display()))
}

impl StandingsStore for TableStore {
    type Transaction<'a> = TableTransaction<'a>;

    fn begin(&self) -> Result<TableTransaction<'_>, StoreError> {
        let guard = self.lock()?;
        let working = guard.clone();
        Ok(TableTransaction {
            store: self,
            guard: Some(guard),
            working,
        })
    }

    fn insert_group(&self, description: &str) -> Result<Group, StoreError> {
        self.write(|tables| {
            let group = Group {
                id: tables.allocate_group_id(),
                description: description.to_string(),
                best_rank: None,
            };
            if tables.groups.contains_key(&group.id) {
                return Err(StoreError::Conflict(format!("group {} already exists", group.id)));
            }
            tables.groups.insert(group.id, group.clone());
            Ok(group)
        })
    }

    fn find_group(&self, id: GroupId) -> Result<Option<Group>, StoreError> {
        Ok(self.lock()?.groups.get(&id).cloned())
    }

    fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        Ok(self.lock()?.groups.values().cloned().collect())
    }

    fn list_participations(&self) -> Result<Vec<Participation>, StoreError> {
        Ok(self.lock()?.participations.clone())
    }

    fn find_participation(
        &self,
        event_id: EventId,
        group_id: GroupId,
    ) -> Result<Option<Participation>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .position(event_id, group_id)
            .map(|index| tables.participations[index].clone()))
    }

    fn insert_participation(&self, participation: Participation) -> Result<(), StoreError> {
        self.write(|tables| {
            let (event_id, group_id) = participation.key();
            if !tables.groups.contains_key(&group_id) {
                return Err(StoreError::NotFound(format!("group {group_id}")));
            }
            if tables.position(event_id, group_id).is_some() {
                return Err(StoreError::Conflict(format!(
                    "group {group_id} already has a score in event {event_id}"
                )));
            }
            tables.participations.push(participation);
            Ok(())
        })
    }

    fn update_score(
        &self,
        event_id: EventId,
        group_id: GroupId,
        score: Score,
    ) -> Result<(), StoreError> {
        self.write(|tables| {
            let index = tables.position(event_id, group_id).ok_or_else(|| {
                StoreError::NotFound(format!("participation of group {group_id} in event {event_id}"))
            })?;
            tables.participations[index].score = score;
            Ok(())
        })
    }

    fn delete_participation(
        &self,
        event_id: EventId,
        group_id: GroupId,
    ) -> Result<(), StoreError> {
        self.write(|tables| {
            let index = tables.position(event_id, group_id).ok_or_else(|| {
                StoreError::NotFound(format!("participation of group {group_id} in event {event_id}"))
            })?;
            tables.participations.remove(index);
            Ok(())
        })
    }

    /// Lookup and write happen under one lock, so racing first reports for the same
    /// pair resolve to one insert followed by updates.
    fn upsert_participation(
        &self,
        event_id: EventId,
        group_id: GroupId,
        score: Score,
    ) -> Result<UpsertOutcome, StoreError> {
        self.write(|tables| {
            if let Some(index) = tables.position(event_id, group_id) {
                tables.participations[index].score = score;
                return Ok(UpsertOutcome::Updated);
            }
            if !tables.groups.contains_key(&group_id) {
                return Err(StoreError::NotFound(format!("group {group_id}")));
            }
            tables
                .participations
                .push(Participation::new(event_id, group_id, score));
            Ok(UpsertOutcome::Inserted)
        })
    }
}

/// Transaction over a [`TableStore`].
///
/// Holds the table lock until it is committed, rolled back or dropped, and applies
/// every step to a private copy of the tables.
pub struct TableTransaction<'a> {
    store: &'a TableStore,
    guard: Option<MutexGuard<'a, Tables>>,
    working: Tables,
}

impl StoreTransaction for TableTransaction<'_> {
    fn find_group(&self, id: GroupId) -> Result<Option<Group>, StoreError> {
        Ok(self.working.groups.get(&id).cloned())
    }

    fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        Ok(self.working.groups.values().cloned().collect())
    }

    fn list_participations(&self) -> Result<Vec<Participation>, StoreError> {
        Ok(self.working.participations.clone())
    }

    fn set_best_rank(&mut self, id: GroupId, rank: Option<Rank>) -> Result<(), StoreError> {
        self.working.group_mut(id)?.best_rank = rank;
        Ok(())
    }

    fn delete_participations_for_group(
        &mut self,
        id: GroupId,
    ) -> Result<Vec<Participation>, StoreError> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.working.participations)
            .into_iter()
            .partition(|row| row.group_id == id);
        self.working.participations = kept;
        Ok(removed)
    }

    fn delete_group(&mut self, id: GroupId) -> Result<Group, StoreError> {
        if self.working.participations.iter().any(|row| row.group_id == id) {
            return Err(StoreError::Conflict(format!(
                "group {id} is still referenced by participations"
            )));
        }
        self.working
            .groups
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("group {id}")))
    }

    fn commit(mut self) -> Result<(), StoreError> {
        let working = std::mem::take(&mut self.working);
        self.store.persist(&working)?;
        if let Some(mut guard) = self.guard.take() {
            *guard = working;
        }
        Ok(())
    }

    fn rollback(self) {}
}

impl Drop for TableTransaction<'_> {
    fn drop(&mut self) {
        if self.guard.is_some() {
            debug!("table transaction rolled back");
        }
    }
}
