//! Day resolution: hydrating one day of order-list references back into
//! full records.

use sqlx::PgPool;
use uuid::Uuid;

use voya_db::models::EntryKind;
use voya_db::queries::{areas, memos, move_schedules, plans, schedules};

use super::{EntryData, HydratedEntry, ScheduleError};

/// Resolve one day of a plan's order list into hydrated entries, in stored
/// order.
///
/// References are partitioned by kind and each table is fetched in a single
/// round trip, concurrently. A reference whose target row has vanished
/// keeps its position with no payload, as does any unknown kind. Only rows
/// typed exactly `place` get their linked area embedded; `customPlace` rows
/// never do, even if an `area_id` is somehow present.
///
/// A day that is absent from the list (including anything below 1) resolves
/// to the empty list; only an unknown plan is an error.
pub async fn resolve_day(
    pool: &PgPool,
    plan_id: Uuid,
    day: i32,
) -> Result<Vec<HydratedEntry>, ScheduleError> {
    let list = plans::get_order_list(pool, plan_id)
        .await?
        .ok_or(ScheduleError::PlanNotFound(plan_id))?;

    let refs = list.day_slot(day);
    if refs.is_empty() {
        return Ok(Vec::new());
    }

    let mut schedule_ids = Vec::new();
    let mut move_ids = Vec::new();
    let mut memo_ids = Vec::new();
    for r in refs {
        match &r.kind {
            EntryKind::Place | EntryKind::CustomPlace => schedule_ids.push(r.id),
            EntryKind::Move => move_ids.push(r.id),
            EntryKind::Memo => memo_ids.push(r.id),
            EntryKind::Other(_) => {}
        }
    }

    let (schedule_rows, move_rows, memo_rows) = tokio::try_join!(
        schedules::fetch_schedules_by_ids(pool, &schedule_ids),
        move_schedules::fetch_move_schedules_by_ids(pool, &move_ids),
        memos::fetch_memos_by_ids(pool, &memo_ids),
    )?;

    // Second pass for the area join: only fetched rows typed `place` with a
    // linked area participate.
    let area_ids: Vec<i32> = schedule_rows
        .values()
        .filter(|row| row.entry_type == "place")
        .filter_map(|row| row.area_id)
        .collect();
    let areas_by_id = areas::fetch_areas_by_ids(pool, &area_ids).await?;

    let mut entries = Vec::with_capacity(refs.len());
    for r in refs {
        let data = match &r.kind {
            EntryKind::Place | EntryKind::CustomPlace => {
                schedule_rows.get(&r.id).map(|row| {
                    let area = if row.entry_type == "place" {
                        row.area_id.and_then(|id| areas_by_id.get(&id).cloned())
                    } else {
                        None
                    };
                    EntryData::Schedule {
                        schedule: row.clone(),
                        area,
                    }
                })
            }
            EntryKind::Move => move_rows.get(&r.id).cloned().map(EntryData::Move),
            EntryKind::Memo => memo_rows.get(&r.id).cloned().map(EntryData::Memo),
            EntryKind::Other(_) => None,
        };
        entries.push(HydratedEntry {
            kind: r.kind.clone(),
            id: r.id,
            data,
        });
    }

    Ok(entries)
}
