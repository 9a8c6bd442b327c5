//! Order-list mutation: the append path.
//!
//! All mutation goes through [`append_entry`], which serializes concurrent
//! appends per plan with a row lock so that read-modify-write cycles cannot
//! overwrite each other's entries.

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use voya_db::models::{OrderList, OrderRef};

use super::ScheduleError;

/// Append `entry` to day `day` of the plan's order list.
///
/// Runs as one transaction: the list is read under `FOR UPDATE`, grown with
/// empty slots until it covers `day`, appended, and written back whole.
/// Existing slots are never reordered or truncated. A missing plan is an
/// error, never an implicit create.
pub async fn append_entry(
    pool: &PgPool,
    plan_id: Uuid,
    day: i32,
    entry: OrderRef,
) -> Result<(), ScheduleError> {
    if day < 1 {
        return Err(ScheduleError::InvalidDay(day));
    }

    let mut tx = pool.begin().await?;

    let row: Option<(Option<Json<OrderList>>,)> =
        sqlx::query_as("SELECT order_list FROM plans WHERE id = $1 FOR UPDATE")
            .bind(plan_id)
            .fetch_optional(&mut *tx)
            .await?;

    let mut list = match row {
        Some((stored,)) => stored.map(|Json(list)| list).unwrap_or_default(),
        None => return Err(ScheduleError::PlanNotFound(plan_id)),
    };

    list.append(day, entry);

    sqlx::query("UPDATE plans SET order_list = $1 WHERE id = $2")
        .bind(Json(&list))
        .bind(plan_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::debug!(plan = %plan_id, day, "appended order-list reference");
    Ok(())
}
