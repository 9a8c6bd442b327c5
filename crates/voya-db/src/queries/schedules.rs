//! Database query functions for the `schedules` table (place and
//! custom-place entries).

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::Schedule;

/// Parameters for inserting a new schedule row.
///
/// `entry_type` is the caller's discriminator, stored verbatim. There is no
/// `area_id` here on purpose: entry creation never links a row to the
/// curated areas table.
#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub plan_id: Uuid,
    pub title: Option<String>,
    pub place: Option<serde_json::Value>,
    pub memo: Option<String>,
    pub entry_type: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub images_url: Option<Vec<String>>,
    pub spend: Option<String>,
}

/// Insert a new schedule row. Returns the inserted row with
/// server-generated defaults (id, created_at).
pub async fn insert_schedule(pool: &PgPool, new: &NewSchedule) -> Result<Schedule, StoreError> {
    let schedule = sqlx::query_as::<_, Schedule>(
        "INSERT INTO schedules \
             (plan_id, title, place, memo, \"type\", start_time, end_time, images_url, spend) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING *",
    )
    .bind(new.plan_id)
    .bind(&new.title)
    .bind(&new.place)
    .bind(&new.memo)
    .bind(&new.entry_type)
    .bind(&new.start_time)
    .bind(&new.end_time)
    .bind(&new.images_url)
    .bind(&new.spend)
    .fetch_one(pool)
    .await?;

    Ok(schedule)
}

/// Fetch a schedule row by its ID.
pub async fn get_schedule(pool: &PgPool, id: Uuid) -> Result<Option<Schedule>, StoreError> {
    let schedule = sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(schedule)
}

/// Batch-fetch schedule rows in a single round trip.
///
/// Ids with no matching row are simply absent from the map, never an error.
pub async fn fetch_schedules_by_ids(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Schedule>, StoreError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|row| (row.id, row)).collect())
}
