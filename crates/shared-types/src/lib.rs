//! # Shared Types Crate
//!
//! Domain entities shared by every range-scoreboard subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: team/image identity and the score record
//!   shape are defined once, here.
//! - **Immutable Roster**: teams and images are loaded at startup and never
//!   change during a competition.
//! - **Append-only History**: a `ScoreEntry` is never mutated after it is
//!   accepted.

pub mod entities;
pub mod errors;
pub mod roster;
pub mod validation;

pub use entities::*;
pub use errors::*;
pub use roster::Roster;
pub use validation::is_valid_token;
