//! Pure scoreboard logic: ranking and per-minute timelines.

pub mod errors;
pub mod standings;
pub mod timeline;
