//! Cross-crate integration flows.

pub mod gateway_flows;
pub mod scoring_flows;
pub mod shell_flows;
