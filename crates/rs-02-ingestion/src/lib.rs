//! # Score Ingestion (rs-02)
//!
//! Turns encrypted agent telegrams into accepted `ScoreEntry` records.
//!
//! ## Pipeline
//!
//! | Stage | Module | Failure |
//! |-------|--------|---------|
//! | Character class | `domain::decoder` | `MalformedInput` |
//! | Hex + AES-GCM open | `domain::decoder` | `EncodingError` / `DecryptionError` |
//! | Grammar (v1 field order) | `domain::telegram` | `MalformedUpdate` |
//! | Roster resolution | `domain::decoder` | `UnknownTeam` / `UnknownImage` |
//! | Vuln ledger + sum check | `domain::ledger` | `MalformedVulns*` / `TamperDetected` |
//! | Play/elapsed time | `domain::accounting` | - |
//! | Completion race | `service` + `CompletionStore` | `Persistence` |
//!
//! ## Domain Invariants
//!
//! | ID | Invariant |
//! |----|-----------|
//! | 1 | An accepted ledger's items sum to the claimed score |
//! | 2 | Nothing is persisted for a rejected telegram |
//! | 3 | Play time grows only across gaps shorter than the idle threshold |
//! | 4 | Each completion key is announced at most once |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Pure parsing, accounting and policy logic
//! - `ports/` - Clock and notifier traits
//! - `service.rs` - Pipeline orchestration against the store ports

#![warn(clippy::all)]

pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use domain::accounting::{account, TimeAccount, DEFAULT_IDLE_THRESHOLD};
pub use domain::completion::{CompletionPolicy, DEFAULT_ALTERNATE_SUFFIX, DEFAULT_SENTINEL_TEAM};
pub use domain::decoder::{DecodedUpdate, UpdateDecoder};
pub use domain::errors::IngestError;
pub use domain::ledger::{parse_item, parse_ledger};
pub use domain::status::{AgentStatus, PlayTimeCutoff, StatusBoard};
pub use domain::telegram::{Telegram, DELIMITER, FIELD_ORDER};
pub use ports::outbound::{Clock, LogNotifier, Notifier, NotifyError, SystemClock};
pub use service::{IngestionConfig, IngestionService, PurgeReport};
