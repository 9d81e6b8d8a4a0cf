use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::record::{number_or, text_or, Record, RecordId};

pub const TABLE: &str = "group_gift_c";

pub const FIELDS: &[&str] = &[
    "Name",
    "title_c",
    "description_c",
    "target_amount_c",
    "current_amount_c",
    "deadline_c",
    "status_c",
    "occasion_type_c",
    "created_at_c",
    "created_by_c",
    "recipient_c",
    "gift_c",
];

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_COMPLETED: &str = "completed";
pub const DEFAULT_OCCASION: &str = "General";

/// A pooled gift several contributors pay into.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupGift {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub deadline: String,
    pub status: String,
    pub occasion_type: String,
    pub created_at: Option<String>,
    pub created_by: String,
    pub recipient_id: Option<RecordId>,
    pub gift_id: Option<RecordId>,
    pub contributors: Vec<Contribution>,
    pub invited_contributors: Vec<Invitation>,
}

impl TryFrom<&Record> for GroupGift {
    type Error = ModelError;

    fn try_from(r: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.require_id()?,
            title: r.first_str(&["title_c", "Name"], ""),
            description: r.str_or("description_c", ""),
            target_amount: r.float_or("target_amount_c", 0.0),
            current_amount: r.float_or("current_amount_c", 0.0),
            deadline: r.str_or("deadline_c", ""),
            status: r.str_or("status_c", STATUS_ACTIVE),
            occasion_type: r.str_or("occasion_type_c", DEFAULT_OCCASION),
            created_at: r.stamp_or_created("created_at_c"),
            created_by: r.str_or("created_by_c", ""),
            recipient_id: r.lookup_id("recipient_c"),
            gift_id: r.lookup_id("gift_c"),
            contributors: Vec::new(),
            invited_contributors: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    #[serde(rename = "Id")]
    pub id: i64,
    pub name: String,
    pub email: String,
    pub amount: f64,
    pub contributed_at: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub email: String,
    pub name: String,
    pub invited_at: String,
    pub status: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewContribution {
    pub name: String,
    pub email: String,
    pub amount: f64,
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvitationRequest {
    pub email: String,
    pub name: Option<String>,
}

impl InvitationRequest {
    pub fn into_pending(self, invited_at: &str) -> Invitation {
        let name = text_or(self.name.as_deref(), &self.email);
        Invitation { email: self.email, name, invited_at: invited_at.to_string(), status: "pending".into() }
    }
}

/// Aggregates over every group gift.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionStats {
    pub total_group_gifts: usize,
    pub active_group_gifts: usize,
    pub completed_group_gifts: usize,
    pub total_amount: f64,
    pub average_contribution: f64,
    pub total_contributors: usize,
}

impl ContributionStats {
    pub fn from_gifts(gifts: &[GroupGift]) -> Self {
        Self {
            total_group_gifts: gifts.len(),
            active_group_gifts: gifts.iter().filter(|g| g.status == STATUS_ACTIVE).count(),
            completed_group_gifts: gifts.iter().filter(|g| g.status == STATUS_COMPLETED).count(),
            total_amount: gifts.iter().map(|g| g.current_amount).sum(),
            average_contribution: 0.0,
            total_contributors: 0,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewGroupGift {
    pub title: String,
    pub description: String,
    pub target_amount: Option<f64>,
    pub deadline: String,
    pub occasion_type: Option<String>,
    pub created_by: String,
    pub recipient_id: Option<RecordId>,
    pub gift_id: Option<RecordId>,
    pub invited_contributors: Vec<Invitation>,
}

/// Insert payload for `group_gift_c`.
#[derive(Clone, Debug, Serialize)]
pub struct GroupGiftCreate {
    #[serde(rename = "Name")]
    pub name: String,
    pub title_c: String,
    pub description_c: String,
    pub target_amount_c: f64,
    pub current_amount_c: f64,
    pub deadline_c: String,
    pub status_c: String,
    pub occasion_type_c: String,
    pub created_at_c: String,
    pub created_by_c: String,
    pub recipient_c: Option<RecordId>,
    pub gift_c: Option<RecordId>,
}

impl NewGroupGift {
    pub fn to_create(&self, now: &str) -> GroupGiftCreate {
        GroupGiftCreate {
            name: self.title.clone(),
            title_c: self.title.clone(),
            description_c: self.description.clone(),
            target_amount_c: number_or(self.target_amount, 0.0),
            current_amount_c: 0.0,
            deadline_c: self.deadline.clone(),
            status_c: STATUS_ACTIVE.to_string(),
            occasion_type_c: text_or(self.occasion_type.as_deref(), DEFAULT_OCCASION),
            created_at_c: now.to_string(),
            created_by_c: self.created_by.clone(),
            recipient_c: self.recipient_id,
            gift_c: self.gift_id,
        }
    }
}

/// Whole-record replacement of the editable group gift fields.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupGiftUpdate {
    pub title: String,
    pub description: String,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub deadline: String,
    pub status: Option<String>,
    pub occasion_type: Option<String>,
    pub contributors: Vec<Contribution>,
    pub invited_contributors: Vec<Invitation>,
}

impl From<&GroupGift> for GroupGiftUpdate {
    fn from(g: &GroupGift) -> Self {
        Self {
            title: g.title.clone(),
            description: g.description.clone(),
            target_amount: Some(g.target_amount),
            current_amount: Some(g.current_amount),
            deadline: g.deadline.clone(),
            status: Some(g.status.clone()),
            occasion_type: Some(g.occasion_type.clone()),
            contributors: g.contributors.clone(),
            invited_contributors: g.invited_contributors.clone(),
        }
    }
}

/// Update payload for `group_gift_c`.
#[derive(Clone, Debug, Serialize)]
pub struct GroupGiftPatch {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub title_c: String,
    pub description_c: String,
    pub target_amount_c: f64,
    pub current_amount_c: f64,
    pub deadline_c: String,
    pub status_c: String,
    pub occasion_type_c: String,
}

impl GroupGiftUpdate {
    pub fn to_patch(&self, id: RecordId) -> GroupGiftPatch {
        GroupGiftPatch {
            id,
            title_c: self.title.clone(),
            description_c: self.description.clone(),
            target_amount_c: number_or(self.target_amount, 0.0),
            current_amount_c: number_or(self.current_amount, 0.0),
            deadline_c: self.deadline.clone(),
            status_c: text_or(self.status.as_deref(), STATUS_ACTIVE),
            occasion_type_c: text_or(self.occasion_type.as_deref(), DEFAULT_OCCASION),
        }
    }
}

/// Status after raising the collected amount to `current`.
pub fn status_for(current: f64, target: f64) -> &'static str {
    if current >= target { STATUS_COMPLETED } else { STATUS_ACTIVE }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_maps_with_defaults() {
        let r = Record::from_value(json!({
            "Id": 3,
            "Name": "Named",
            "target_amount_c": "abc",
            "recipient_c": { "Id": 8, "Name": "Dad" },
            "CreatedOn": "2024-02-01T00:00:00Z"
        })).unwrap();
        let g = GroupGift::try_from(&r).unwrap();
        assert_eq!(g.title, "Named");
        assert_eq!(g.target_amount, 0.0);
        assert_eq!(g.status, "active");
        assert_eq!(g.occasion_type, "General");
        assert_eq!(g.created_at.as_deref(), Some("2024-02-01T00:00:00Z"));
        assert_eq!(g.recipient_id, Some(8));
        assert_eq!(g.gift_id, None);
        assert!(g.contributors.is_empty());
    }

    #[test]
    fn create_payload_uses_remote_field_names() {
        let input = NewGroupGift { title: "Bike".into(), target_amount: Some(300.0), recipient_id: Some(2), ..Default::default() };
        let value = serde_json::to_value(input.to_create("2024-01-01T00:00:00.000Z")).unwrap();
        assert_eq!(value["Name"], "Bike");
        assert_eq!(value["title_c"], "Bike");
        assert_eq!(value["target_amount_c"], 300.0);
        assert_eq!(value["current_amount_c"], 0.0);
        assert_eq!(value["status_c"], "active");
        assert_eq!(value["occasion_type_c"], "General");
        assert_eq!(value["recipient_c"], 2);
        assert!(value["gift_c"].is_null());
    }

    #[test]
    fn status_flips_at_target() {
        assert_eq!(status_for(99.0, 100.0), STATUS_ACTIVE);
        assert_eq!(status_for(100.0, 100.0), STATUS_COMPLETED);
    }

    #[test]
    fn stats_sum_current_amounts() {
        let r = Record::from_value(json!({ "Id": 1, "current_amount_c": 40, "status_c": "completed" })).unwrap();
        let mut a = GroupGift::try_from(&r).unwrap();
        let b = GroupGift { id: 2, current_amount: 10.0, status: "active".into(), ..a.clone() };
        a.current_amount = 40.0;
        let stats = ContributionStats::from_gifts(&[a, b]);
        assert_eq!(stats.total_group_gifts, 2);
        assert_eq!(stats.active_group_gifts, 1);
        assert_eq!(stats.completed_group_gifts, 1);
        assert_eq!(stats.total_amount, 50.0);
    }

    #[test]
    fn invitation_name_defaults_to_email() {
        let inv = InvitationRequest { email: "a@b.c".into(), name: None }.into_pending("now");
        assert_eq!(inv.name, "a@b.c");
        assert_eq!(inv.status, "pending");
    }
}
