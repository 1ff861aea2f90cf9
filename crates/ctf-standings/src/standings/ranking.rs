//! Rank computation over the participation table.
//!
//! Everything here is pure and recomputed from scratch on each call; the best-rank
//! column stored on groups is only a cache of [`best_rank_per_group`].
//!
//! Ties are not shared: participations with equal scores receive consecutive ranks
//! in the order they were handed in, which is the store's iteration order. This
//! mirrors how the standings have always been published and is kept as-is even
//! though a shared-rank policy would arguably be fairer.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use super::domain::{EventId, EventPlacement, GroupId, Participation, Rank};

/// Rank the participations of a single event, best score first.
///
/// The sort is stable, so equal scores keep their input order and still get
/// distinct sequential ranks.
pub fn rank_event(participations: &[Participation]) -> Vec<EventPlacement> {
    let mut ordered: Vec<&Participation> = participations.iter().collect();
    ordered.sort_by(|left, right| right.score.cmp(&left.score));

    ordered
        .into_iter()
        .zip(1..)
        .map(|(participation, rank)| EventPlacement {
            event_id: participation.event_id,
            group_id: participation.group_id,
            score: participation.score,
            rank,
        })
        .collect()
}

/// Partition by event (keeping input order inside each event) and rank each one.
pub fn rank_all_events(participations: &[Participation]) -> BTreeMap<EventId, Vec<EventPlacement>> {
    let mut by_event: BTreeMap<EventId, Vec<Participation>> = BTreeMap::new();
    for participation in participations {
        by_event
            .entry(participation.event_id)
            .or_default()
            .push(participation.clone());
    }

    by_event
        .into_iter()
        .map(|(event_id, rows)| (event_id, rank_event(&rows)))
        .collect()
}

/// Best (numerically smallest) rank each group reached in any event.
///
/// Groups without participations are absent; callers treat that as "no rank".
pub fn best_rank_per_group(participations: &[Participation]) -> BTreeMap<GroupId, Rank> {
    best_placement_per_group(participations)
        .into_iter()
        .map(|(group_id, placement)| (group_id, placement.rank))
        .collect()
}

/// The placement behind each group's best rank.
///
/// When a group reaches the same rank in several events the lowest event id wins.
pub fn best_placement_per_group(
    participations: &[Participation],
) -> BTreeMap<GroupId, EventPlacement> {
    let mut best: BTreeMap<GroupId, EventPlacement> = BTreeMap::new();

    for placements in rank_all_events(participations).into_values() {
        for placement in placements {
            match best.entry(placement.group_id) {
                Entry::Vacant(slot) => {
                    slot.insert(placement);
                }
                Entry::Occupied(mut slot) => {
                    if placement.rank < slot.get().rank {
                        slot.insert(placement);
                    }
                }
            }
        }
    }

    best
}
