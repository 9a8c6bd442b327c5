//! Per-table query modules.

pub mod areas;
pub mod memos;
pub mod move_schedules;
pub mod plans;
pub mod schedules;
