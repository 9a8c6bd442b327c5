use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Entry kinds
// ---------------------------------------------------------------------------

/// Discriminator carried on an order-list reference and on the stored row's
/// `type` column.
///
/// The four known kinds map to the entry tables: `place` and `customPlace`
/// share `schedules`, while `move` and `memo` each have their own table. Any
/// other tag is kept verbatim as [`EntryKind::Other`], so an unrecognized
/// value survives storage and resolution without being normalized away.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Place,
    CustomPlace,
    Move,
    Memo,
    /// Caller-supplied tag outside the known set, preserved as-is.
    Other(String),
}

impl EntryKind {
    /// The wire representation of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Place => "place",
            Self::CustomPlace => "customPlace",
            Self::Move => "move",
            Self::Memo => "memo",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for EntryKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "place" => Self::Place,
            "customPlace" => Self::CustomPlace,
            "move" => Self::Move,
            "memo" => Self::Memo,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for EntryKind {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EntryKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntryKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

// ---------------------------------------------------------------------------
// Order list
// ---------------------------------------------------------------------------

/// A single reference inside the order list: which table to look in and
/// which row. Carries no payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRef {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub id: Uuid,
}

/// The per-plan position index: one slot per day (1-based), each slot an
/// ordered list of references. Stored whole in the `plans.order_list` JSONB
/// column; a NULL column reads as the empty list.
///
/// The list only ever grows. Appending to a day beyond the current length
/// backfills the gap with empty slots, and nothing here truncates or
/// reorders existing slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderList(Vec<Vec<OrderRef>>);

impl OrderList {
    /// Number of day slots currently present.
    pub fn days(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append `entry` to the end of the given day's slot, growing the day
    /// dimension as needed. Days are 1-based; values below 1 are treated as
    /// day 1.
    pub fn append(&mut self, day: i32, entry: OrderRef) {
        let day = day.max(1) as usize;
        while self.0.len() < day {
            self.0.push(Vec::new());
        }
        self.0[day - 1].push(entry);
    }

    /// The ordered references for a day, or an empty slice when the day is
    /// absent or out of range (including anything below 1).
    pub fn day_slot(&self, day: i32) -> &[OrderRef] {
        day.checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| self.0.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl From<Vec<Vec<OrderRef>>> for OrderList {
    fn from(slots: Vec<Vec<OrderRef>>) -> Self {
        Self(slots)
    }
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A plan row. Only the title and the position index matter to this service;
/// everything else about a plan (members, date range, cover image) is
/// managed elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: Uuid,
    pub title: String,
    pub order_list: Option<Json<OrderList>>,
    pub created_at: DateTime<Utc>,
}

/// A place or custom-place entry. `entry_type` holds the caller's
/// discriminator verbatim; `area_id` is only meaningful on rows typed
/// exactly `place`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub title: Option<String>,
    pub place: Option<serde_json::Value>,
    pub memo: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub entry_type: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub images_url: Option<Vec<String>>,
    pub spend: Option<String>,
    pub area_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// A transit segment between itinerary stops. `move_type` is the transit
/// mode (walk, bus, train, ...).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MoveSchedule {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub memo: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub move_type: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub images_url: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

/// A free-form note entry with an optional checklist.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
    pub check_list: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Read-only reference data: a recommended spot within a city, grouped by
/// `area_type` (place, restaurant, hotel, ...). Joined into hydrated place
/// entries at resolution time; never written by this service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: i32,
    pub city_id: i32,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub area_type: String,
    pub name: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub info: Option<serde_json::Value>,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
