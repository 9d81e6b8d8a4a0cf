//! Social gifting: friends and shared wishlists (held in memory) plus the
//! `social_gift_c` activity feed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ModelError;
use crate::record::{text_or, Record, RecordId};

pub const TABLE: &str = "social_gift_c";

pub const FIELDS: &[&str] = &[
    "Name",
    "type_c",
    "friend_id_c",
    "friend_name_c",
    "friend_photo_url_c",
    "gift_id_c",
    "gift_title_c",
    "recipient_id_c",
    "recipient_name_c",
    "occasion_c",
    "price_c",
    "timestamp_c",
    "privacy_c",
    "notes_c",
    "can_view_c",
];

pub const CURRENT_USER_EMAIL: &str = "current-user@example.com";
pub const ACTIVITY_SHARED: &str = "shared";
pub const PRIVACY_PUBLIC: &str = "public";
pub const UNKNOWN_FRIEND: &str = "Unknown Friend";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub photo_url: String,
    pub status: String,
    pub mutual_friends: u32,
    pub joined_at: String,
    pub last_active: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewFriend {
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collaborator {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewWishlistItem {
    pub gift_id: Option<RecordId>,
    pub title: String,
    pub price: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub item: NewWishlistItem,
    pub added_at: String,
    pub added_by: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedWishlist {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    pub allow_contributions: bool,
    pub created_by: String,
    pub created_at: String,
    pub collaborators: Vec<Collaborator>,
    pub items: Vec<WishlistItem>,
}

impl SharedWishlist {
    pub fn next_item_id(&self) -> RecordId {
        next_id(self.items.iter().map(|i| i.id))
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewWishlist {
    pub title: String,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub allow_contributions: Option<bool>,
}

/// Rows the in-memory friends table starts with.
pub fn seed_friends() -> Vec<Friend> {
    vec![
        Friend {
            id: 1,
            name: "Sarah Johnson".into(),
            email: "sarah@example.com".into(),
            photo_url: "https://images.unsplash.com/photo-1494790108755-2616b612b672?w=150".into(),
            status: "connected".into(),
            mutual_friends: 5,
            joined_at: "2024-01-15T10:30:00Z".into(),
            last_active: "2024-01-25T14:20:00Z".into(),
        },
        Friend {
            id: 2,
            name: "Mike Chen".into(),
            email: "mike@example.com".into(),
            photo_url: "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=150".into(),
            status: "connected".into(),
            mutual_friends: 3,
            joined_at: "2024-01-20T09:15:00Z".into(),
            last_active: "2024-01-24T16:45:00Z".into(),
        },
    ]
}

/// Rows the in-memory shared wishlist table starts with.
pub fn seed_wishlists() -> Vec<SharedWishlist> {
    vec![SharedWishlist {
        id: 1,
        title: "Wedding Registry".into(),
        description: "Sarah & Tom's Wedding Wishlist".into(),
        is_public: true,
        allow_contributions: true,
        created_by: "sarah@example.com".into(),
        created_at: "2024-01-10T10:00:00Z".into(),
        collaborators: vec![Collaborator {
            id: 1,
            name: "Sarah".into(),
            email: "sarah@example.com".into(),
            role: "owner".into(),
        }],
        items: Vec::new(),
    }]
}

/// Next id for an in-memory table: one past the current maximum.
pub fn next_id<I: IntoIterator<Item = RecordId>>(ids: I) -> RecordId {
    ids.into_iter().max().unwrap_or(0).max(0) + 1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftActivity {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "type")]
    pub kind: String,
    pub friend_id: RecordId,
    pub friend_name: String,
    pub friend_photo_url: String,
    pub gift_id: RecordId,
    pub gift_title: String,
    pub recipient_id: Option<RecordId>,
    pub recipient_name: String,
    pub occasion: String,
    pub price: Option<f64>,
    pub timestamp: Option<String>,
    pub privacy: String,
    pub notes: String,
    pub can_view: bool,
    pub reactions: Vec<Value>,
}

impl TryFrom<&Record> for GiftActivity {
    type Error = ModelError;

    fn try_from(r: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.require_id()?,
            kind: r.str_or("type_c", ACTIVITY_SHARED),
            friend_id: r.int_or("friend_id_c", 0),
            friend_name: r.str_or("friend_name_c", ""),
            friend_photo_url: r.str_or("friend_photo_url_c", ""),
            gift_id: r.int_or("gift_id_c", 0),
            gift_title: r.str_or("gift_title_c", ""),
            recipient_id: r.lookup_id("recipient_id_c"),
            recipient_name: r.str_or("recipient_name_c", ""),
            occasion: r.str_or("occasion_c", ""),
            price: r.float_opt("price_c"),
            timestamp: r.stamp_or_created("timestamp_c"),
            privacy: r.str_or("privacy_c", PRIVACY_PUBLIC),
            notes: r.str_or("notes_c", ""),
            can_view: r.not_false("can_view_c"),
            reactions: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewActivity {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub friend_id: Option<RecordId>,
    pub friend_name: String,
    pub friend_photo_url: Option<String>,
    pub gift_id: Option<RecordId>,
    pub gift_title: String,
    pub recipient_id: Option<RecordId>,
    pub recipient_name: Option<String>,
    pub occasion: Option<String>,
    pub price: Option<f64>,
    pub privacy: Option<String>,
    pub notes: Option<String>,
    pub can_view: Option<bool>,
}

/// Insert payload for `social_gift_c`.
#[derive(Clone, Debug, Serialize)]
pub struct GiftActivityCreate {
    #[serde(rename = "Name")]
    pub name: String,
    pub type_c: String,
    pub friend_id_c: Option<RecordId>,
    pub friend_name_c: String,
    pub friend_photo_url_c: String,
    pub gift_id_c: Option<RecordId>,
    pub gift_title_c: String,
    pub recipient_id_c: Option<RecordId>,
    pub recipient_name_c: String,
    pub occasion_c: String,
    pub price_c: Option<f64>,
    pub timestamp_c: String,
    pub privacy_c: String,
    pub notes_c: String,
    pub can_view_c: bool,
}

impl NewActivity {
    pub fn to_create(&self, now: &str) -> GiftActivityCreate {
        let kind = text_or(self.kind.as_deref(), ACTIVITY_SHARED);
        GiftActivityCreate {
            name: format!("{kind} activity"),
            type_c: kind,
            friend_id_c: self.friend_id,
            friend_name_c: self.friend_name.clone(),
            friend_photo_url_c: self.friend_photo_url.clone().unwrap_or_default(),
            gift_id_c: self.gift_id,
            gift_title_c: self.gift_title.clone(),
            recipient_id_c: self.recipient_id,
            recipient_name_c: self.recipient_name.clone().unwrap_or_default(),
            occasion_c: self.occasion.clone().unwrap_or_default(),
            price_c: self.price.filter(|p| p.is_finite() && *p != 0.0),
            timestamp_c: now.to_string(),
            privacy_c: text_or(self.privacy.as_deref(), PRIVACY_PUBLIC),
            notes_c: self.notes.clone().unwrap_or_default(),
            can_view_c: self.can_view != Some(false),
        }
    }
}

impl GiftActivityCreate {
    /// Activity row announcing `gift_id` was shared with `friend`.
    pub fn shared(gift_id: RecordId, friend_id: RecordId, friend: Option<&Friend>, message: &str, now: &str) -> Self {
        Self {
            name: format!("Shared gift {gift_id}"),
            type_c: ACTIVITY_SHARED.to_string(),
            friend_id_c: Some(friend_id),
            friend_name_c: friend.map(|f| f.name.clone()).unwrap_or_else(|| UNKNOWN_FRIEND.to_string()),
            friend_photo_url_c: friend.map(|f| f.photo_url.clone()).unwrap_or_default(),
            gift_id_c: Some(gift_id),
            gift_title_c: format!("Gift #{gift_id}"),
            recipient_id_c: None,
            recipient_name_c: String::new(),
            occasion_c: String::new(),
            price_c: None,
            timestamp_c: now.to_string(),
            privacy_c: PRIVACY_PUBLIC.to_string(),
            notes_c: message.to_string(),
            can_view_c: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialStats {
    pub total_friends: usize,
    pub connected_friends: usize,
    pub total_wishlists: usize,
    pub public_wishlists: usize,
    pub recent_activities: usize,
}

impl SocialStats {
    pub fn from_tables(friends: &[Friend], wishlists: &[SharedWishlist]) -> Self {
        Self {
            total_friends: friends.len(),
            connected_friends: friends.iter().filter(|f| f.status == "connected").count(),
            total_wishlists: wishlists.len(),
            public_wishlists: wishlists.iter().filter(|w| w.is_public).count(),
            recent_activities: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn activity_defaults() {
        let r = Record::from_value(json!({ "Id": 9, "price_c": "abc", "friend_id_c": "4", "timestamp_c": "" , "CreatedOn": "c" })).unwrap();
        let a = GiftActivity::try_from(&r).unwrap();
        assert_eq!(a.kind, "shared");
        assert_eq!(a.friend_id, 4);
        assert_eq!(a.gift_id, 0);
        assert_eq!(a.price, None);
        assert_eq!(a.timestamp.as_deref(), Some("c"));
        assert_eq!(a.privacy, "public");
        assert!(a.can_view);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["type"], "shared");
        assert_eq!(json["Id"], 9);
    }

    #[test]
    fn shared_row_falls_back_to_unknown_friend() {
        let row = GiftActivityCreate::shared(5, 42, None, "hi", "now");
        assert_eq!(row.friend_name_c, UNKNOWN_FRIEND);
        assert_eq!(row.gift_title_c, "Gift #5");
        assert_eq!(row.name, "Shared gift 5");
        assert_eq!(row.notes_c, "hi");
    }

    #[test]
    fn next_id_is_max_plus_one() {
        assert_eq!(next_id(Vec::<RecordId>::new()), 1);
        assert_eq!(next_id([3, 1, 7]), 8);
    }

    #[test]
    fn wishlist_item_serializes_flat() {
        let item = WishlistItem {
            id: 1,
            item: NewWishlistItem { title: "Mug".into(), ..Default::default() },
            added_at: "now".into(),
            added_by: CURRENT_USER_EMAIL.into(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["title"], "Mug");
        assert_eq!(json["addedBy"], CURRENT_USER_EMAIL);
    }

    #[test]
    fn stats_count_seed_tables() {
        let stats = SocialStats::from_tables(&seed_friends(), &seed_wishlists());
        assert_eq!(stats, SocialStats { total_friends: 2, connected_friends: 2, total_wishlists: 1, public_wishlists: 1, recent_activities: 0 });
    }
}
