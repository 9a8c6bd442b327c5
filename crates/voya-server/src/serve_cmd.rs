use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use voya_core::schedule::{NewEntry, ScheduleError, create_entry, resolve_day};
use voya_db::models::Area;
use voya_db::queries::{areas as area_db, plans as plan_db};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        tracing::error!(error = %err, "schedule request failed");
        let status = match &err {
            ScheduleError::PlanNotFound(_) => StatusCode::NOT_FOUND,
            ScheduleError::InvalidDay(_) | ScheduleError::Store(_) => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(pool: PgPool) -> Router {
    Router::new()
        .route("/", get(index))
        .route(
            "/api/plans/{plan_id}/schedule",
            get(get_day_schedule).post(create_schedule_entry),
        )
        .route("/api/area/city", get(get_city_areas))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .with_state(pool)
}

/// Anything that panics mid-handler becomes an opaque 500; no internal
/// detail leaks to the client.
fn handle_panic(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let body = serde_json::json!({ "error": "An unexpected error occurred." });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(pool: PgPool, bind: &str, port: u16) -> Result<()> {
    let app = build_router(pool);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("voya serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("voya serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Schedule handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DayParams {
    /// Kept as a raw string so an unparseable value falls back to day 1
    /// instead of failing extraction.
    day: Option<String>,
}

/// `GET /api/plans/{plan_id}/schedule?day=N`
///
/// Resolves one day of the plan into hydrated entries, in stored order.
/// `day` defaults to 1 when absent or unparseable.
async fn get_day_schedule(
    State(pool): State<PgPool>,
    Path(plan_id): Path<String>,
    Query(params): Query<DayParams>,
) -> Result<Response, AppError> {
    let plan_id: Uuid = plan_id
        .parse()
        .map_err(|_| AppError::bad_request("Missing planId"))?;

    let day = params
        .day
        .as_deref()
        .and_then(|d| d.parse::<i32>().ok())
        .unwrap_or(1);

    let entries = resolve_day(&pool, plan_id, day).await?;
    Ok(Json(serde_json::json!({ "data": entries })).into_response())
}

/// `POST /api/plans/{plan_id}/schedule`
///
/// Creates one itinerary entry and appends its reference to the plan's
/// order list. The body's `planId` is authoritative; the path segment only
/// mirrors the resource shape.
async fn create_schedule_entry(
    State(pool): State<PgPool>,
    Path(_plan_id): Path<String>,
    Json(body): Json<NewEntry>,
) -> Result<Response, AppError> {
    let inserted = create_entry(&pool, &body).await?;
    Ok(Json(serde_json::json!({ "data": [inserted] })).into_response())
}

// ---------------------------------------------------------------------------
// Area handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CityParams {
    id: Option<String>,
    limit: Option<String>,
}

/// Areas bucketed by their `type`, keeping the buckets in first-seen order.
///
/// Serialized as a JSON object (one key per type) rather than the pair list
/// the tuple representation would give, so the bucket order on the wire is
/// exactly the arrival order and not a map's key order.
#[derive(Debug)]
struct GroupedAreas(Vec<(String, Vec<Area>)>);

impl GroupedAreas {
    /// Bucket rows that already arrive clustered by type. Each bucket stops
    /// accepting rows once it reaches `limit`, when one is given.
    fn from_sorted(rows: Vec<Area>, limit: Option<usize>) -> Self {
        let mut buckets: Vec<(String, Vec<Area>)> = Vec::new();
        for area in rows {
            if buckets.last().is_none_or(|(ty, _)| *ty != area.area_type) {
                buckets.push((area.area_type.clone(), Vec::new()));
            }
            if let Some((_, bucket)) = buckets.last_mut() {
                if limit.is_none_or(|cap| bucket.len() < cap) {
                    bucket.push(area);
                }
            }
        }
        Self(buckets)
    }
}

impl Serialize for GroupedAreas {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (area_type, areas) in &self.0 {
            map.serialize_entry(area_type, areas)?;
        }
        map.end()
    }
}

/// Envelope shape used by the area lookup; the HTTP status always mirrors
/// the `status` field.
#[derive(Debug, Serialize)]
struct AreaEnvelope {
    status: u16,
    message: String,
    data: Option<GroupedAreas>,
    error: Option<serde_json::Value>,
}

impl AreaEnvelope {
    fn failure(status: StatusCode, message: &str) -> Response {
        let body = Self {
            status: status.as_u16(),
            message: message.to_string(),
            data: None,
            error: Some(serde_json::json!({
                "status": status.as_u16(),
                "message": message,
            })),
        };
        (status, Json(body)).into_response()
    }

    fn success(data: GroupedAreas) -> Response {
        let body = Self {
            status: 200,
            message: "Success".to_string(),
            data: Some(data),
            error: None,
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

/// `GET /api/area/city?id=<city_id>&limit=<n>`
///
/// Lists a city's curated areas grouped by their `type`, each group
/// truncated to `limit` entries when the parameter is given.
async fn get_city_areas(State(pool): State<PgPool>, Query(params): Query<CityParams>) -> Response {
    let Some(city_id) = params.id.as_deref().and_then(|id| id.parse::<i32>().ok()) else {
        return AreaEnvelope::failure(StatusCode::BAD_REQUEST, "Bad Request");
    };
    let limit = params.limit.as_deref().and_then(|l| l.parse::<usize>().ok());

    let rows = match area_db::list_areas_for_city(&pool, city_id).await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::error!(error = %err, city_id, "area lookup failed");
            return AreaEnvelope::failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };

    if rows.is_empty() {
        return AreaEnvelope::failure(StatusCode::NOT_FOUND, "No Data");
    }

    AreaEnvelope::success(GroupedAreas::from_sorted(rows, limit))
}

// ---------------------------------------------------------------------------
// Index page
// ---------------------------------------------------------------------------

async fn index(State(pool): State<PgPool>) -> Result<Response, AppError> {
    let plans = plan_db::list_plans(&pool).await.map_err(|err| {
        tracing::error!(error = %err, "plan listing failed");
        AppError::bad_request(err.to_string())
    })?;

    let rows = if plans.is_empty() {
        "<tr><td colspan=\"3\">No plans found.</td></tr>".to_string()
    } else {
        plans
            .iter()
            .map(|p| {
                format!(
                    "<tr><td><a href=\"/api/plans/{id}/schedule\">{title}</a></td><td>{days}</td><td>{id}</td></tr>",
                    id = p.id,
                    title = p.title,
                    days = p.order_list.as_ref().map(|l| l.days()).unwrap_or(0),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let html = format!(
        "<!DOCTYPE html>\
<html><head><title>voya</title></head><body>\
<h1>voya</h1>\
<p><a href=\"/api/area/city?id=1\">/api/area/city</a></p>\
<table><tr><th>Plan</th><th>Days</th><th>ID</th></tr>{rows}</table>\
</body></html>"
    );

    Ok(Html(html).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::PgPool;
    use tower::ServiceExt;

    use voya_db::queries::areas::{NewArea, insert_area};
    use voya_db::queries::plans::insert_plan;
    use voya_test_utils::{create_test_db, drop_test_db};

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn send_get(pool: PgPool, uri: &str) -> axum::response::Response {
        let app = super::build_router(pool);
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn send_post(pool: PgPool, uri: &str, body: serde_json::Value) -> axum::response::Response {
        let app = super::build_router(pool);
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn area_input(city_id: i32, area_type: &str, name: &str) -> NewArea {
        NewArea {
            city_id,
            area_type: area_type.to_owned(),
            name: name.to_owned(),
            lat: None,
            lng: None,
            info: None,
            image_url: None,
            rating: None,
        }
    }

    // -----------------------------------------------------------------------
    // Area grouping
    // -----------------------------------------------------------------------

    fn area_row(id: i32, area_type: &str, name: &str) -> voya_db::models::Area {
        voya_db::models::Area {
            id,
            city_id: 1,
            area_type: area_type.to_owned(),
            name: name.to_owned(),
            lat: None,
            lng: None,
            info: None,
            image_url: None,
            rating: None,
        }
    }

    #[test]
    fn grouped_areas_serialize_in_arrival_order() {
        // "Hotel" sorts before "place" bytewise but after it under the
        // database collation this endpoint relies on; the buckets must come
        // out in the order the rows arrived either way.
        let grouped = super::GroupedAreas::from_sorted(
            vec![
                area_row(1, "place", "Asakusa"),
                area_row(2, "Hotel", "Andaz"),
            ],
            None,
        );

        let json = serde_json::to_string(&grouped).expect("serialize");
        let place_at = json.find("\"place\"").expect("place bucket present");
        let hotel_at = json.find("\"Hotel\"").expect("Hotel bucket present");
        assert!(
            place_at < hotel_at,
            "buckets must keep arrival order, got: {json}"
        );
    }

    #[test]
    fn grouped_areas_truncate_each_bucket_at_the_limit() {
        let grouped = super::GroupedAreas::from_sorted(
            vec![
                area_row(1, "place", "a"),
                area_row(2, "place", "b"),
                area_row(3, "place", "c"),
                area_row(4, "restaurant", "r"),
            ],
            Some(2),
        );

        assert_eq!(grouped.0.len(), 2);
        assert_eq!(grouped.0[0].0, "place");
        assert_eq!(grouped.0[0].1.len(), 2, "limit caps the bucket");
        assert_eq!(grouped.0[1].1.len(), 1);
    }

    #[test]
    fn grouped_areas_without_limit_keep_everything() {
        let grouped = super::GroupedAreas::from_sorted(
            vec![
                area_row(1, "place", "a"),
                area_row(2, "place", "b"),
            ],
            None,
        );

        assert_eq!(grouped.0.len(), 1);
        assert_eq!(grouped.0[0].1.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Index
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_index_returns_html() {
        let (pool, db_name) = create_test_db().await;

        let resp = send_get(pool.clone(), "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp
            .headers()
            .get("content-type")
            .expect("should have content-type header")
            .to_str()
            .unwrap();
        assert!(
            content_type.contains("text/html"),
            "content-type should contain text/html, got: {content_type}"
        );

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    // -----------------------------------------------------------------------
    // Create entry
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_entry_returns_inserted_row() {
        let (pool, db_name) = create_test_db().await;
        let plan = insert_plan(&pool, "tokyo").await.expect("insert plan");

        let resp = send_post(
            pool.clone(),
            &format!("/api/plans/{}/schedule", plan.id),
            serde_json::json!({
                "planId": plan.id,
                "day": 1,
                "type": "place",
                "title": "Senso-ji",
                "startTime": "09:00"
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let data = json["data"].as_array().expect("data should be an array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["title"], "Senso-ji");
        assert_eq!(data[0]["type"], "place");
        assert!(data[0].get("id").is_some(), "row should carry its id");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_create_entry_unknown_plan_is_error() {
        let (pool, db_name) = create_test_db().await;

        let random_id = uuid::Uuid::new_v4();
        let resp = send_post(
            pool.clone(),
            &format!("/api/plans/{random_id}/schedule"),
            serde_json::json!({
                "planId": random_id,
                "day": 1,
                "type": "memo",
                "title": "packing"
            }),
        )
        .await;
        // The payload insert hits the plan FK before the append does, so
        // this surfaces as the store's rejection rather than a 404.
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        let message = json["error"].as_str().expect("error should be a string");
        assert!(
            message.starts_with("[23503]"),
            "expected a foreign-key rejection, got: {message}"
        );

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_create_entry_invalid_day_is_bad_request() {
        let (pool, db_name) = create_test_db().await;
        let plan = insert_plan(&pool, "tokyo").await.expect("insert plan");

        let resp = send_post(
            pool.clone(),
            &format!("/api/plans/{}/schedule", plan.id),
            serde_json::json!({
                "planId": plan.id,
                "day": 0,
                "type": "memo"
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    // -----------------------------------------------------------------------
    // Resolve day
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_round_trip_day_three_backfills() {
        let (pool, db_name) = create_test_db().await;
        let plan = insert_plan(&pool, "tokyo").await.expect("insert plan");

        let resp = send_post(
            pool.clone(),
            &format!("/api/plans/{}/schedule", plan.id),
            serde_json::json!({
                "planId": plan.id,
                "day": 3,
                "type": "place",
                "title": "Meiji Jingu"
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        // Days 1 and 2 exist but are empty.
        for day in [1, 2] {
            let resp = send_get(
                pool.clone(),
                &format!("/api/plans/{}/schedule?day={day}", plan.id),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::OK);
            let json = body_json(resp).await;
            assert_eq!(json["data"], serde_json::json!([]));
        }

        let resp = send_get(pool.clone(), &format!("/api/plans/{}/schedule?day=3", plan.id)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let data = json["data"].as_array().expect("data should be an array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["type"], "place");
        assert_eq!(data[0]["data"]["title"], "Meiji Jingu");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_resolve_day_defaults_to_one() {
        let (pool, db_name) = create_test_db().await;
        let plan = insert_plan(&pool, "tokyo").await.expect("insert plan");

        let resp = send_post(
            pool.clone(),
            &format!("/api/plans/{}/schedule", plan.id),
            serde_json::json!({
                "planId": plan.id,
                "day": 1,
                "type": "memo",
                "title": "day one note"
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        // No day parameter and an unparseable one both behave as day=1.
        for uri in [
            format!("/api/plans/{}/schedule", plan.id),
            format!("/api/plans/{}/schedule?day=first", plan.id),
        ] {
            let resp = send_get(pool.clone(), &uri).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let json = body_json(resp).await;
            let data = json["data"].as_array().expect("data should be an array");
            assert_eq!(data.len(), 1, "uri {uri} should resolve day 1");
            assert_eq!(data[0]["data"]["title"], "day one note");
        }

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_resolve_day_unknown_plan_is_not_found() {
        let (pool, db_name) = create_test_db().await;

        let random_id = uuid::Uuid::new_v4();
        let resp = send_get(pool.clone(), &format!("/api/plans/{random_id}/schedule")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_resolve_day_bad_plan_id_is_missing_plan_id() {
        let (pool, db_name) = create_test_db().await;

        let resp = send_get(pool.clone(), "/api/plans/not-a-uuid/schedule").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "Missing planId");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    // -----------------------------------------------------------------------
    // Area lookup
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_city_areas_missing_id_is_bad_request() {
        let (pool, db_name) = create_test_db().await;

        let resp = send_get(pool.clone(), "/api/area/city").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["status"], 400);
        assert_eq!(json["message"], "Bad Request");
        assert_eq!(json["data"], serde_json::Value::Null);
        assert_eq!(json["error"]["status"], 400);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_city_areas_empty_city_is_no_data() {
        let (pool, db_name) = create_test_db().await;

        let resp = send_get(pool.clone(), "/api/area/city?id=42").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["status"], 404);
        assert_eq!(json["message"], "No Data");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_city_areas_groups_by_type_with_limit() {
        let (pool, db_name) = create_test_db().await;

        for (area_type, name) in [
            ("place", "Asakusa"),
            ("place", "Shibuya Crossing"),
            ("place", "Meiji Jingu"),
            ("restaurant", "Ichiran"),
        ] {
            insert_area(&pool, &area_input(7, area_type, name))
                .await
                .expect("insert area");
        }
        // Another city's areas must not leak in.
        insert_area(&pool, &area_input(8, "place", "Dotonbori"))
            .await
            .expect("insert area");

        let resp = send_get(pool.clone(), "/api/area/city?id=7&limit=2").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "Success");
        assert_eq!(json["error"], serde_json::Value::Null);

        let places = json["data"]["place"].as_array().expect("place group");
        assert_eq!(places.len(), 2, "limit should truncate the group");
        assert_eq!(places[0]["name"], "Asakusa");
        let restaurants = json["data"]["restaurant"].as_array().expect("restaurant group");
        assert_eq!(restaurants.len(), 1);
        assert_eq!(restaurants[0]["name"], "Ichiran");

        pool.close().await;
        drop_test_db(&db_name).await;
    }
}
