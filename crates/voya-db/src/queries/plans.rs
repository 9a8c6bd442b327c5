//! Database query functions for the `plans` table.

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{OrderList, Plan};

/// Insert a new plan row. Returns the inserted plan with server-generated
/// defaults (id, created_at) and an unset order list.
pub async fn insert_plan(pool: &PgPool, title: &str) -> Result<Plan, StoreError> {
    let plan = sqlx::query_as::<_, Plan>(
        "INSERT INTO plans (title) \
         VALUES ($1) \
         RETURNING *",
    )
    .bind(title)
    .fetch_one(pool)
    .await?;

    Ok(plan)
}

/// Fetch a plan by its ID.
pub async fn get_plan(pool: &PgPool, id: Uuid) -> Result<Option<Plan>, StoreError> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(plan)
}

/// List all plans, ordered by creation time (newest first).
pub async fn list_plans(pool: &PgPool) -> Result<Vec<Plan>, StoreError> {
    let plans = sqlx::query_as::<_, Plan>("SELECT * FROM plans ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;

    Ok(plans)
}

/// Fetch a plan's order list without locking.
///
/// `None` means the plan does not exist; a plan whose `order_list` column is
/// still NULL reads as the empty list.
pub async fn get_order_list(pool: &PgPool, plan_id: Uuid) -> Result<Option<OrderList>, StoreError> {
    let row: Option<(Option<Json<OrderList>>,)> =
        sqlx::query_as("SELECT order_list FROM plans WHERE id = $1")
            .bind(plan_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(list,)| list.map(|Json(l)| l).unwrap_or_default()))
}
