//! Service layer exposing typed gift operations on top of the hosted record backend.
//! - Every service receives its [`client::RecordClient`] explicitly, so tests and
//!   the binary pick the backend.
//! - Records are mapped into the UI models defined in the `models` crate.
//! - Reads documented as falling back return empty values after logging; all other
//!   failures surface as [`errors::ServiceError`].
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use service::client::mock::InMemoryRecordClient;
//! use service::reminder_service::ReminderService;
//! use models::reminder::NewReminder;
//!
//! let client = Arc::new(InMemoryRecordClient::new());
//! let reminders = ReminderService::new(client);
//! let created = tokio_test::block_on(reminders.create(NewReminder { recipient_id: Some(3), ..Default::default() })).unwrap();
//! assert_eq!(created.status, "active");
//! ```

pub mod client;
pub mod errors;
pub mod table;
pub mod group_gift_service;
pub mod price_alert_service;
pub mod reminder_service;
pub mod saved_gift_service;
pub mod social_gift_service;
