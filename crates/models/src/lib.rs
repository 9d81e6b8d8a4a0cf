//! Record and UI model types for the gifting tables.
//!
//! Each entity module lists its table's fields, maps a remote [`record::Record`]
//! into the UI model and builds the insert/update payloads for it.

pub mod errors;
pub mod record;
pub mod refs;
pub mod group_gift;
pub mod price_alert;
pub mod reminder;
pub mod saved_gift;
pub mod social;

pub use record::{Record, RecordId};

#[cfg(test)]
mod tests;
