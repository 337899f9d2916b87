//! Ports for the shell relay.

pub mod outbound;
