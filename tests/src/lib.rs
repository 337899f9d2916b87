//! # Range Scoreboard Test Suite
//!
//! Cross-crate flows that no single crate can exercise on its own.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── scoring_flows.rs   # ingestion → store → scoreboard
//!     ├── shell_flows.rs     # registry + relay tasks
//!     └── gateway_flows.rs   # TOML config → HTTP surface
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p rs-tests
//! cargo test -p rs-tests integration::shell_flows
//! ```

pub mod integration;
