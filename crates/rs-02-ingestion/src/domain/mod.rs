pub mod accounting;
pub mod completion;
pub mod decoder;
pub mod errors;
pub mod ledger;
pub mod status;
pub mod telegram;
