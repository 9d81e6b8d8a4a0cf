use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::record::{text_or, Record, RecordId};
use crate::refs::{GiftRef, RecipientRef};

pub const TABLE: &str = "saved_gift_c";

pub const FIELDS: &[&str] = &["Name", "saved_date_c", "notes_c", "price_alert_c", "gift_c", "recipient_c"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGift {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub saved_date: Option<String>,
    pub notes: String,
    pub price_alert: bool,
    pub gift_id: Option<RecordId>,
    pub recipient_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gift: Option<GiftRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<RecipientRef>,
}

impl SavedGift {
    /// Whether this entry already saves `gift_id` for `recipient_id`.
    pub fn same_pair(&self, gift_id: Option<RecordId>, recipient_id: Option<RecordId>) -> bool {
        self.gift_id == gift_id && self.recipient_id == recipient_id
    }
}

impl TryFrom<&Record> for SavedGift {
    type Error = ModelError;

    fn try_from(r: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.require_id()?,
            saved_date: r.stamp_or_created("saved_date_c"),
            notes: r.str_or("notes_c", ""),
            price_alert: r.truthy("price_alert_c"),
            gift_id: r.lookup_id("gift_c"),
            recipient_id: r.lookup_id("recipient_c"),
            gift: r.lookup("gift_c").map(GiftRef::from),
            recipient: r.lookup("recipient_c").map(RecipientRef::from),
        })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewSavedGift {
    pub name: Option<String>,
    pub gift_id: Option<RecordId>,
    pub recipient_id: Option<RecordId>,
    pub notes: String,
    pub price_alert: bool,
}

/// Insert payload for `saved_gift_c`.
#[derive(Clone, Debug, Serialize)]
pub struct SavedGiftCreate {
    #[serde(rename = "Name")]
    pub name: String,
    pub saved_date_c: String,
    pub notes_c: String,
    pub price_alert_c: bool,
    pub gift_c: Option<RecordId>,
    pub recipient_c: Option<RecordId>,
}

impl NewSavedGift {
    pub fn to_create(&self, now: &str) -> SavedGiftCreate {
        let default_name = format!(
            "Saved Gift {}",
            self.gift_id.map(|id| id.to_string()).unwrap_or_default()
        );
        SavedGiftCreate {
            name: text_or(self.name.as_deref(), &default_name),
            saved_date_c: now.to_string(),
            notes_c: self.notes.clone(),
            price_alert_c: self.price_alert,
            gift_c: self.gift_id,
            recipient_c: self.recipient_id,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedGiftUpdate {
    pub notes: String,
    pub price_alert: bool,
}

impl From<&SavedGift> for SavedGiftUpdate {
    fn from(s: &SavedGift) -> Self {
        Self { notes: s.notes.clone(), price_alert: s.price_alert }
    }
}

/// Update payload for `saved_gift_c`.
#[derive(Clone, Debug, Serialize)]
pub struct SavedGiftPatch {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub notes_c: String,
    pub price_alert_c: bool,
}

impl SavedGiftUpdate {
    pub fn to_patch(&self, id: RecordId) -> SavedGiftPatch {
        SavedGiftPatch { id, notes_c: self.notes.clone(), price_alert_c: self.price_alert }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn read_from_fetch_and_from_mutation_result() {
        let fetched = Record::from_value(json!({
            "Id": 1,
            "gift_c": { "Id": 4, "Name": "Scarf" },
            "recipient_c": { "Id": 2, "Name": "Lee" },
            "CreatedOn": "2024-03-03T00:00:00Z"
        })).unwrap();
        let s = SavedGift::try_from(&fetched).unwrap();
        assert_eq!(s.saved_date.as_deref(), Some("2024-03-03T00:00:00Z"));
        assert_eq!(s.gift.as_ref().map(|g| g.title.as_str()), Some("Scarf"));
        assert!(!s.price_alert);
        assert!(s.same_pair(Some(4), Some(2)));

        let created = Record::from_value(json!({ "Id": 2, "gift_c": 4, "recipient_c": 2, "price_alert_c": true })).unwrap();
        let s = SavedGift::try_from(&created).unwrap();
        assert_eq!(s.gift_id, Some(4));
        assert!(s.gift.is_none());
        assert!(s.price_alert);
    }

    #[test]
    fn default_name_uses_gift_id() {
        let p = NewSavedGift { gift_id: Some(12), ..Default::default() }.to_create("now");
        assert_eq!(p.name, "Saved Gift 12");
        assert_eq!(p.saved_date_c, "now");
    }
}
