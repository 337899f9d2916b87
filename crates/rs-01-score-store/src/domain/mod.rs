pub mod errors;
pub mod projection;
