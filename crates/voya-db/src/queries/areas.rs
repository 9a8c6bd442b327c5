//! Database query functions for the `areas` table (curated city reference
//! data).
//!
//! Areas are read-only from the itinerary's point of view: resolution joins
//! them into hydrated place entries, and the city lookup lists them. The
//! insert exists for seeding and tests.

use std::collections::HashMap;

use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::Area;

/// Parameters for inserting a new area row.
#[derive(Debug, Clone)]
pub struct NewArea {
    pub city_id: i32,
    pub area_type: String,
    pub name: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub info: Option<serde_json::Value>,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
}

/// Insert a new area row. Returns the inserted row with its generated ID.
pub async fn insert_area(pool: &PgPool, new: &NewArea) -> Result<Area, StoreError> {
    let area = sqlx::query_as::<_, Area>(
        "INSERT INTO areas (city_id, \"type\", name, lat, lng, info, image_url, rating) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(new.city_id)
    .bind(&new.area_type)
    .bind(&new.name)
    .bind(new.lat)
    .bind(new.lng)
    .bind(&new.info)
    .bind(&new.image_url)
    .bind(new.rating)
    .fetch_one(pool)
    .await?;

    Ok(area)
}

/// Batch-fetch area rows in a single round trip.
///
/// Ids with no matching row are simply absent from the map, never an error.
pub async fn fetch_areas_by_ids(
    pool: &PgPool,
    ids: &[i32],
) -> Result<HashMap<i32, Area>, StoreError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, Area>("SELECT * FROM areas WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|row| (row.id, row)).collect())
}

/// List every area belonging to a city, grouped-friendly: ordered by type
/// first, then by ID so insertion order is stable within a type.
pub async fn list_areas_for_city(pool: &PgPool, city_id: i32) -> Result<Vec<Area>, StoreError> {
    let areas =
        sqlx::query_as::<_, Area>("SELECT * FROM areas WHERE city_id = $1 ORDER BY \"type\", id")
            .bind(city_id)
            .fetch_all(pool)
            .await?;

    Ok(areas)
}
