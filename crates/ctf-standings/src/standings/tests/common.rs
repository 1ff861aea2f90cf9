use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::standings::{
    standings_router, EventId, Group, GroupId, Participation, Rank, Score, StandingsService,
    StandingsStore, StoreError, StoreTransaction, TableStore, TableTransaction, Tables,
};

/// Groups and their (event, score) rows, inserted in order.
pub(super) type Seed<'a> = &'a [(&'a str, &'a [(u32, Score)])];

pub(super) fn seeded_service<S: StandingsStore>(store: Arc<S>, seed: Seed<'_>) -> StandingsService<S> {
    let service = StandingsService::new(store);
    for (description, rows) in seed {
        let group = service
            .coordinator()
            .add_group(description)
            .expect("group inserted");
        for (event, score) in rows.iter() {
            service
                .coordinator()
                .report_score(EventId(*event), group.id, *score)
                .expect("score recorded");
        }
    }
    service
}

pub(super) fn memory_service(seed: Seed<'_>) -> (StandingsService<TableStore>, Arc<TableStore>) {
    let store = Arc::new(TableStore::in_memory());
    (seeded_service(store.clone(), seed), store)
}

/// G1 {event10: 50, event20: 90} and G2 {event10: 80}.
pub(super) const TWO_GROUPS: Seed<'static> = &[
    ("Null Pointers", &[(10, 50), (20, 90)]),
    ("Segfault Society", &[(10, 80)]),
];

/// Group 3 wins both events it entered, so removing it promotes the others.
pub(super) const THREE_GROUPS: Seed<'static> = &[
    ("Null Pointers", &[(10, 50)]),
    ("Segfault Society", &[(10, 40), (20, 30)]),
    ("Stack Smashers", &[(10, 90), (20, 70)]),
];

pub(super) fn best_ranks<S: StandingsStore>(store: &S) -> Vec<(GroupId, Option<Rank>)> {
    store
        .list_groups()
        .expect("groups listed")
        .into_iter()
        .map(|group| (group.id, group.best_rank))
        .collect()
}

pub(super) fn table_bytes(store: &TableStore) -> Vec<u8> {
    serde_json::to_vec(&store.tables().expect("tables readable")).expect("tables serialize")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with(seed: Seed<'_>) -> (axum::Router, Arc<TableStore>) {
    let (service, store) = memory_service(seed);
    (standings_router(Arc::new(service)), store)
}

/// Point at which [`FaultyStore`] simulates a storage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Fault {
    Begin,
    Upsert,
    GroupVanishes,
    ClearRank,
    DeleteParticipations,
    DeleteGroup,
    Commit,
}

fn injected() -> StoreError {
    StoreError::Unavailable("injected failure".to_string())
}

/// Table store wrapper that fails at one configured step.
pub(super) struct FaultyStore {
    inner: TableStore,
    fault: Mutex<Option<Fault>>,
}

impl FaultyStore {
    pub(super) fn new() -> Self {
        Self {
            inner: TableStore::in_memory(),
            fault: Mutex::new(None),
        }
    }

    pub(super) fn arm(&self, fault: Fault) {
        *self.fault.lock().expect("fault mutex poisoned") = Some(fault);
    }

    pub(super) fn tables(&self) -> Tables {
        self.inner.tables().expect("tables readable")
    }

    fn armed(&self, fault: Fault) -> bool {
        *self.fault.lock().expect("fault mutex poisoned") == Some(fault)
    }
}

impl StandingsStore for FaultyStore {
    type Transaction<'a> = FaultyTransaction<'a>;

    fn begin(&self) -> Result<FaultyTransaction<'_>, StoreError> {
        if self.armed(Fault::Begin) {
            return Err(injected());
        }
        Ok(FaultyTransaction {
            inner: self.inner.begin()?,
            fault: *self.fault.lock().expect("fault mutex poisoned"),
        })
    }

    fn insert_group(&self, description: &str) -> Result<Group, StoreError> {
        self.inner.insert_group(description)
    }

    fn find_group(&self, id: GroupId) -> Result<Option<Group>, StoreError> {
        self.inner.find_group(id)
    }

    fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        self.inner.list_groups()
    }

    fn list_participations(&self) -> Result<Vec<Participation>, StoreError> {
        self.inner.list_participations()
    }

    fn find_participation(
        &self,
        event_id: EventId,
        group_id: GroupId,
    ) -> Result<Option<Participation>, StoreError> {
        self.inner.find_participation(event_id, group_id)
    }

    fn insert_participation(&self, participation: Participation) -> Result<(), StoreError> {
        if self.armed(Fault::Upsert) {
            return Err(injected());
        }
        if self.armed(Fault::GroupVanishes) {
            return Err(StoreError::NotFound(format!("group {}", participation.group_id)));
        }
        self.inner.insert_participation(participation)
    }

    fn update_score(
        &self,
        event_id: EventId,
        group_id: GroupId,
        score: Score,
    ) -> Result<(), StoreError> {
        if self.armed(Fault::Upsert) {
            return Err(injected());
        }
        self.inner.update_score(event_id, group_id, score)
    }

    fn delete_participation(
        &self,
        event_id: EventId,
        group_id: GroupId,
    ) -> Result<(), StoreError> {
        self.inner.delete_participation(event_id, group_id)
    }
}

pub(super) struct FaultyTransaction<'a> {
    inner: TableTransaction<'a>,
    fault: Option<Fault>,
}

impl StoreTransaction for FaultyTransaction<'_> {
    fn find_group(&self, id: GroupId) -> Result<Option<Group>, StoreError> {
        self.inner.find_group(id)
    }

    fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        self.inner.list_groups()
    }

    fn list_participations(&self) -> Result<Vec<Participation>, StoreError> {
        self.inner.list_participations()
    }

    fn set_best_rank(&mut self, id: GroupId, rank: Option<Rank>) -> Result<(), StoreError> {
        if self.fault == Some(Fault::ClearRank) && rank.is_none() {
            return Err(injected());
        }
        self.inner.set_best_rank(id, rank)
    }

    fn delete_participations_for_group(
        &mut self,
        id: GroupId,
    ) -> Result<Vec<Participation>, StoreError> {
        let removed = self.inner.delete_participations_for_group(id)?;
        if self.fault == Some(Fault::DeleteParticipations) {
            // rows are already gone from the working copy; only rollback restores them
            return Err(injected());
        }
        Ok(removed)
    }

    fn delete_group(&mut self, id: GroupId) -> Result<Group, StoreError> {
        if self.fault == Some(Fault::DeleteGroup) {
            return Err(injected());
        }
        self.inner.delete_group(id)
    }

    fn commit(self) -> Result<(), StoreError> {
        if self.fault == Some(Fault::Commit) {
            self.inner.rollback();
            return Err(injected());
        }
        self.inner.commit()
    }

    fn rollback(self) {
        self.inner.rollback();
    }
}
