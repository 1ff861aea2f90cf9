use std::fmt;

use serde::{Deserialize, Serialize};

/// Points a group scored in one event. Values are taken as reported.
pub type Score = i32;

/// 1-based position inside an event, ordered by descending score.
pub type Rank = u32;

/// Store-assigned identifier of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a CTF event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u32);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A team that takes part in events.
///
/// `best_rank` is a cache derived from the participation table. It is `None` when
/// the group has no participations or while the group is being removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub description: String,
    pub best_rank: Option<Rank>,
}

/// One group's recorded score in one event. `(event_id, group_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    pub event_id: EventId,
    pub group_id: GroupId,
    pub score: Score,
}

impl Participation {
    pub fn new(event_id: EventId, group_id: GroupId, score: Score) -> Self {
        Self {
            event_id,
            group_id,
            score,
        }
    }

    pub fn key(&self) -> (EventId, GroupId) {
        (self.event_id, self.group_id)
    }
}

/// A participation together with the rank it earned inside its event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventPlacement {
    pub event_id: EventId,
    pub group_id: GroupId,
    pub score: Score,
    pub rank: Rank,
}
