//! # Scoreboard (rs-03)
//!
//! Read-side views: overall standings, per-image boards and the per-minute
//! team timeline that backs the charts.
//!
//! | View | Source | Ordering |
//! |------|--------|----------|
//! | Standings | latest-per-(team, image) projection | score desc, play time asc |
//! | Image board | projection filtered to one image | same |
//! | Team timeline | team history | one boundary per UTC minute |
//!
//! Nothing here writes to the store.

#![warn(clippy::all)]

pub mod domain;
pub mod service;

pub use domain::errors::ScoreboardError;
pub use domain::standings::{rank, TeamStanding};
pub use domain::timeline::{build_timeline, consolidate, select_records, ImageSeries, Timeline};
pub use service::{ScoreboardService, TeamDetail};
