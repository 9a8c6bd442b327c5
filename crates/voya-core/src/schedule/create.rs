//! Entry creation: per-kind dispatch into the entry tables, then the
//! order-list append.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use voya_db::models::{EntryKind, OrderRef};
use voya_db::queries::memos::{self, NewMemo};
use voya_db::queries::move_schedules::{self, NewMoveSchedule};
use voya_db::queries::schedules::{self, NewSchedule};

use super::order::append_entry;
use super::{EntryData, ScheduleError};

/// A create request for one itinerary entry.
///
/// `kind` decides the storage branch. Only the fields that branch consumes
/// are read; the rest are ignored rather than rejected, and an unknown tag
/// is stored like a place entry with the tag kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub plan_id: Uuid,
    pub day: i32,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub place: Option<serde_json::Value>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub spend: Option<String>,
    #[serde(default)]
    pub check_list: Option<serde_json::Value>,
}

/// Create one entry: insert its payload row, then append the `{type, id}`
/// reference to the plan's order list at `day`.
///
/// The two writes are deliberately not atomic. If the append fails the
/// inserted row stays behind unreferenced; the order list is the source of
/// truth for what a day shows, so such a row is invisible.
pub async fn create_entry(pool: &PgPool, entry: &NewEntry) -> Result<EntryData, ScheduleError> {
    // Validate before writing anything so a bad day cannot orphan a row.
    if entry.day < 1 {
        return Err(ScheduleError::InvalidDay(entry.day));
    }

    let inserted = match &entry.kind {
        EntryKind::Move => {
            // Transit segments arrive with the mode in `title`; it is stored
            // as the row's type.
            let row = move_schedules::insert_move_schedule(
                pool,
                &NewMoveSchedule {
                    plan_id: entry.plan_id,
                    memo: entry.memo.clone(),
                    move_type: entry.title.clone(),
                    start_time: entry.start_time.clone(),
                    end_time: entry.end_time.clone(),
                    images_url: entry.images.clone(),
                },
            )
            .await?;
            EntryData::Move(row)
        }
        EntryKind::Memo => {
            let row = memos::insert_memo(
                pool,
                &NewMemo {
                    plan_id: entry.plan_id,
                    title: entry.title.clone(),
                    content: entry.memo.clone(),
                    check_list: entry.check_list.clone(),
                },
            )
            .await?;
            EntryData::Memo(row)
        }
        EntryKind::Place | EntryKind::CustomPlace | EntryKind::Other(_) => {
            let row = schedules::insert_schedule(
                pool,
                &NewSchedule {
                    plan_id: entry.plan_id,
                    title: entry.title.clone(),
                    place: entry.place.clone(),
                    memo: entry.memo.clone(),
                    entry_type: entry.kind.as_str().to_owned(),
                    start_time: entry.start_time.clone(),
                    end_time: entry.end_time.clone(),
                    images_url: entry.images.clone(),
                    spend: entry.spend.clone(),
                },
            )
            .await?;
            EntryData::Schedule {
                schedule: row,
                area: None,
            }
        }
    };

    let reference = OrderRef {
        kind: entry.kind.clone(),
        id: inserted.id(),
    };
    append_entry(pool, entry.plan_id, entry.day, reference).await?;

    Ok(inserted)
}
