//! Database query functions for the `memos` table (free-form note entries).

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::Memo;

/// Parameters for inserting a new memo row.
#[derive(Debug, Clone)]
pub struct NewMemo {
    pub plan_id: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
    pub check_list: Option<serde_json::Value>,
}

/// Insert a new memo row. Returns the inserted row with server-generated
/// defaults (id, created_at).
pub async fn insert_memo(pool: &PgPool, new: &NewMemo) -> Result<Memo, StoreError> {
    let memo = sqlx::query_as::<_, Memo>(
        "INSERT INTO memos (plan_id, title, content, check_list) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(new.plan_id)
    .bind(&new.title)
    .bind(&new.content)
    .bind(&new.check_list)
    .fetch_one(pool)
    .await?;

    Ok(memo)
}

/// Batch-fetch memo rows in a single round trip.
///
/// Ids with no matching row are simply absent from the map, never an error.
pub async fn fetch_memos_by_ids(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Memo>, StoreError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, Memo>("SELECT * FROM memos WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|row| (row.id, row)).collect())
}
