//! # Score Store (rs-01)
//!
//! Persistence contract for score history and its derived projections.
//!
//! ## Collections
//!
//! | Collection | Semantics | Writers |
//! |------------|-----------|---------|
//! | history | append-only, one entry per accepted telegram | ingestion |
//! | latest | upsert per (team, image), last writer wins | ingestion |
//! | completions | insert-if-absent per image key | completion trigger |
//! | announcements | append-only | completion trigger |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Store errors and the history aggregation fold
//! - `ports/` - Outbound traits the persistence backend implements
//! - `adapters/` - In-memory backend (default backend and test double)

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::memory::InMemoryScoreStore;
pub use domain::errors::StoreError;
pub use domain::projection::fold_history;
pub use ports::outbound::{AnnouncementStore, CompletionStore, ScoreStore, Stores};
