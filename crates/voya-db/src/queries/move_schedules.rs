//! Database query functions for the `move_schedules` table (transit
//! segments).

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::MoveSchedule;

/// Parameters for inserting a new move-schedule row.
///
/// `move_type` is the transit mode label shown between stops.
#[derive(Debug, Clone)]
pub struct NewMoveSchedule {
    pub plan_id: Uuid,
    pub memo: Option<String>,
    pub move_type: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub images_url: Option<Vec<String>>,
}

/// Insert a new move-schedule row. Returns the inserted row with
/// server-generated defaults (id, created_at).
pub async fn insert_move_schedule(
    pool: &PgPool,
    new: &NewMoveSchedule,
) -> Result<MoveSchedule, StoreError> {
    let row = sqlx::query_as::<_, MoveSchedule>(
        "INSERT INTO move_schedules (plan_id, memo, \"type\", start_time, end_time, images_url) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(new.plan_id)
    .bind(&new.memo)
    .bind(&new.move_type)
    .bind(&new.start_time)
    .bind(&new.end_time)
    .bind(&new.images_url)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Batch-fetch move-schedule rows in a single round trip.
///
/// Ids with no matching row are simply absent from the map, never an error.
pub async fn fetch_move_schedules_by_ids(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, MoveSchedule>, StoreError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, MoveSchedule>("SELECT * FROM move_schedules WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|row| (row.id, row)).collect())
}
