use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::record::{text_or, Record, RecordId};
use crate::refs::RecipientRef;

pub const TABLE: &str = "reminder_c";

pub const FIELDS: &[&str] = &["Name", "alert_date_c", "status_c", "recipient_c", "occasion_c"];

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_SNOOZED: &str = "snoozed";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OccasionRef {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub alert_date: Option<String>,
    pub status: String,
    pub recipient_id: Option<RecordId>,
    pub occasion_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<RecipientRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occasion: Option<OccasionRef>,
}

impl Reminder {
    /// Drop the resolved recipient/occasion, keeping only the foreign keys.
    pub fn without_details(self) -> Self {
        Self { recipient: None, occasion: None, ..self }
    }
}

impl TryFrom<&Record> for Reminder {
    type Error = ModelError;

    fn try_from(r: &Record) -> Result<Self, Self::Error> {
        let alert_date = r.stamp_or_created("alert_date_c");
        let occasion = r.lookup("occasion_c").map(|l| OccasionRef {
            id: l.id,
            kind: text_or(Some(&l.name), "General"),
            date: alert_date.clone(),
        });
        Ok(Self {
            id: r.require_id()?,
            status: r.str_or("status_c", STATUS_ACTIVE),
            recipient_id: r.lookup_id("recipient_c"),
            occasion_id: r.lookup_id("occasion_c"),
            recipient: r.lookup("recipient_c").map(RecipientRef::from),
            occasion,
            alert_date,
        })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewReminder {
    pub name: Option<String>,
    pub alert_date: Option<String>,
    pub status: Option<String>,
    pub recipient_id: Option<RecordId>,
    pub occasion_id: Option<RecordId>,
}

/// Insert payload for `reminder_c`.
#[derive(Clone, Debug, Serialize)]
pub struct ReminderCreate {
    #[serde(rename = "Name")]
    pub name: String,
    pub alert_date_c: String,
    pub status_c: String,
    pub recipient_c: Option<RecordId>,
    pub occasion_c: Option<RecordId>,
}

impl NewReminder {
    pub fn to_create(&self, now: &str) -> ReminderCreate {
        let default_name = format!(
            "Reminder for {}",
            self.recipient_id.map(|id| id.to_string()).unwrap_or_default()
        );
        ReminderCreate {
            name: text_or(self.name.as_deref(), &default_name),
            alert_date_c: text_or(self.alert_date.as_deref(), now),
            status_c: text_or(self.status.as_deref(), STATUS_ACTIVE),
            recipient_c: self.recipient_id,
            occasion_c: self.occasion_id,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReminderUpdate {
    pub alert_date: Option<String>,
    pub status: Option<String>,
}

/// Update payload for `reminder_c`.
#[derive(Clone, Debug, Serialize)]
pub struct ReminderPatch {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_date_c: Option<String>,
    pub status_c: String,
}

impl ReminderUpdate {
    pub fn to_patch(&self, id: RecordId) -> ReminderPatch {
        ReminderPatch {
            id,
            alert_date_c: self.alert_date.clone(),
            status_c: text_or(self.status.as_deref(), STATUS_ACTIVE),
        }
    }
}
