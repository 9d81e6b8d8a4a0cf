//! Nested references embedded in UI models when a lookup was resolved.

use serde::{Deserialize, Serialize};

use crate::record::{LookupRef, RecordId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecipientRef {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub name: String,
}

impl From<LookupRef> for RecipientRef {
    fn from(l: LookupRef) -> Self {
        Self { id: l.id, name: l.name }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GiftRef {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub title: String,
    /// Only price alerts carry a price; it is filled in by the gift catalogue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl From<LookupRef> for GiftRef {
    fn from(l: LookupRef) -> Self {
        Self { id: l.id, title: l.name, price: None }
    }
}
