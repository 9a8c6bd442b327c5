//! Itinerary schedule services: entry creation, order-list mutation, day
//! resolution.
//!
//! An itinerary is a per-day ordered list of heterogeneous entries. Entry
//! payloads live in per-kind tables; ordering lives apart from them as a
//! plan-level JSONB index of `{type, id}` references. Creation writes the
//! payload row and then appends a reference; resolution walks one day's
//! references and hydrates them back into full records.

pub mod compose;
pub mod create;
pub mod order;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use voya_db::error::StoreError;
use voya_db::models::{Area, EntryKind, Memo, MoveSchedule, Schedule};

pub use compose::resolve_day;
pub use create::{NewEntry, create_entry};
pub use order::append_entry;

/// Errors from the schedule request paths.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The referenced plan does not exist. Nothing here creates plans.
    #[error("plan {0} not found")]
    PlanNotFound(Uuid),

    /// Days are 1-based.
    #[error("invalid day {0}: days start at 1")]
    InvalidDay(i32),

    /// The store rejected or failed a statement.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for ScheduleError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(StoreError::from(err))
    }
}

/// A hydrated entry payload, serialized as the bare record (no enum tag on
/// the wire).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EntryData {
    /// A place or custom-place row; `area` is populated only for rows typed
    /// exactly `place` that link a curated area.
    Schedule {
        #[serde(flatten)]
        schedule: Schedule,
        #[serde(skip_serializing_if = "Option::is_none")]
        area: Option<Area>,
    },
    Move(MoveSchedule),
    Memo(Memo),
}

impl EntryData {
    /// ID of the underlying row.
    pub fn id(&self) -> Uuid {
        match self {
            Self::Schedule { schedule, .. } => schedule.id,
            Self::Move(row) => row.id,
            Self::Memo(row) => row.id,
        }
    }
}

/// One resolved position of a day: the stored reference echoed back, plus
/// the hydrated record when its row still exists.
#[derive(Debug, Clone, Serialize)]
pub struct HydratedEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<EntryData>,
}
