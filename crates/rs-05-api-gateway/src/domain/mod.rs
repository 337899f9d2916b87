//! Gateway configuration and HTTP error mapping.

pub mod config;
pub mod error;
