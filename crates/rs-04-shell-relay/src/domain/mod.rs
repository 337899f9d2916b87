//! Session state machine and relay errors.

pub mod errors;
pub mod session;
