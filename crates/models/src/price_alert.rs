use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::record::{number_or, text_or, Record, RecordId};
use crate::refs::{GiftRef, RecipientRef};

pub const TABLE: &str = "price_alert_c";

pub const FIELDS: &[&str] = &[
    "Name",
    "enabled_c",
    "price_drop_threshold_c",
    "absolute_threshold_c",
    "stock_alerts_c",
    "email_enabled_c",
    "push_enabled_c",
    "frequency_c",
    "created_at_c",
    "last_triggered_c",
    "total_savings_c",
    "gift_c",
    "recipient_c",
];

pub const DEFAULT_DROP_THRESHOLD: i64 = 10;
pub const DEFAULT_FREQUENCY: &str = "immediate";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub enabled: bool,
    /// Percent drop that triggers the alert.
    pub price_drop_threshold: i64,
    pub absolute_threshold: f64,
    pub stock_alerts: bool,
    pub email_enabled: bool,
    pub push_enabled: bool,
    pub frequency: String,
    pub created_at: Option<String>,
    pub last_triggered: Option<String>,
    pub total_savings: f64,
    pub gift_id: Option<RecordId>,
    pub recipient_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gift: Option<GiftRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<RecipientRef>,
}

impl TryFrom<&Record> for PriceAlert {
    type Error = ModelError;

    fn try_from(r: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.require_id()?,
            enabled: r.truthy("enabled_c"),
            price_drop_threshold: r.int_or("price_drop_threshold_c", DEFAULT_DROP_THRESHOLD),
            absolute_threshold: r.float_or("absolute_threshold_c", 0.0),
            stock_alerts: r.not_false("stock_alerts_c"),
            email_enabled: r.not_false("email_enabled_c"),
            push_enabled: r.not_false("push_enabled_c"),
            frequency: r.str_or("frequency_c", DEFAULT_FREQUENCY),
            created_at: r.stamp_or_created("created_at_c"),
            last_triggered: r.opt_str("last_triggered_c"),
            total_savings: r.float_or("total_savings_c", 0.0),
            gift_id: r.lookup_id("gift_c"),
            recipient_id: r.lookup_id("recipient_c"),
            gift: r.lookup("gift_c").map(|l| GiftRef { price: Some(0.0), ..GiftRef::from(l) }),
            recipient: r.lookup("recipient_c").map(RecipientRef::from),
        })
    }
}

/// Tunable part of an alert, shared by create, update and toggle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertConfig {
    pub enabled: Option<bool>,
    pub price_drop_threshold: Option<i64>,
    pub absolute_threshold: Option<f64>,
    pub stock_alerts: Option<bool>,
    pub email_enabled: Option<bool>,
    pub push_enabled: Option<bool>,
    pub frequency: Option<String>,
}

impl From<&PriceAlert> for AlertConfig {
    fn from(a: &PriceAlert) -> Self {
        Self {
            enabled: Some(a.enabled),
            price_drop_threshold: Some(a.price_drop_threshold),
            absolute_threshold: Some(a.absolute_threshold),
            stock_alerts: Some(a.stock_alerts),
            email_enabled: Some(a.email_enabled),
            push_enabled: Some(a.push_enabled),
            frequency: Some(a.frequency.clone()),
        }
    }
}

fn drop_threshold_or_default(v: Option<i64>) -> i64 {
    v.filter(|n| *n != 0).unwrap_or(DEFAULT_DROP_THRESHOLD)
}

/// Update payload for `price_alert_c`. Unset flags are left out of the request.
#[derive(Clone, Debug, Serialize)]
pub struct PriceAlertPatch {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_c: Option<bool>,
    pub price_drop_threshold_c: i64,
    pub absolute_threshold_c: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_alerts_c: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_enabled_c: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_enabled_c: Option<bool>,
    pub frequency_c: String,
}

impl AlertConfig {
    pub fn to_patch(&self, id: RecordId) -> PriceAlertPatch {
        PriceAlertPatch {
            id,
            enabled_c: self.enabled,
            price_drop_threshold_c: drop_threshold_or_default(self.price_drop_threshold),
            absolute_threshold_c: number_or(self.absolute_threshold, 0.0),
            stock_alerts_c: self.stock_alerts,
            email_enabled_c: self.email_enabled,
            push_enabled_c: self.push_enabled,
            frequency_c: text_or(self.frequency.as_deref(), DEFAULT_FREQUENCY),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPriceAlert {
    pub name: Option<String>,
    pub gift_id: Option<RecordId>,
    pub recipient_id: Option<RecordId>,
    #[serde(flatten)]
    pub config: AlertConfig,
}

/// Insert payload for `price_alert_c`.
#[derive(Clone, Debug, Serialize)]
pub struct PriceAlertCreate {
    #[serde(rename = "Name")]
    pub name: String,
    pub enabled_c: bool,
    pub price_drop_threshold_c: i64,
    pub absolute_threshold_c: f64,
    pub stock_alerts_c: bool,
    pub email_enabled_c: bool,
    pub push_enabled_c: bool,
    pub frequency_c: String,
    pub created_at_c: String,
    pub last_triggered_c: Option<String>,
    pub total_savings_c: f64,
    pub gift_c: Option<RecordId>,
    pub recipient_c: Option<RecordId>,
}

impl NewPriceAlert {
    pub fn to_create(&self, now: &str) -> PriceAlertCreate {
        let default_name = format!(
            "Alert for {}",
            self.gift_id.map(|id| id.to_string()).unwrap_or_default()
        );
        let c = &self.config;
        PriceAlertCreate {
            name: text_or(self.name.as_deref(), &default_name),
            enabled_c: c.enabled != Some(false),
            price_drop_threshold_c: drop_threshold_or_default(c.price_drop_threshold),
            absolute_threshold_c: number_or(c.absolute_threshold, 0.0),
            stock_alerts_c: c.stock_alerts != Some(false),
            email_enabled_c: c.email_enabled != Some(false),
            push_enabled_c: c.push_enabled != Some(false),
            frequency_c: text_or(c.frequency.as_deref(), DEFAULT_FREQUENCY),
            created_at_c: now.to_string(),
            last_triggered_c: None,
            total_savings_c: 0.0,
            gift_c: self.gift_id,
            recipient_c: self.recipient_id,
        }
    }
}

/// Per-user notification preferences for price alerts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub email_enabled: bool,
    pub push_enabled: bool,
    pub frequency: String,
    pub price_drop_threshold: i64,
    pub absolute_threshold: f64,
    pub stock_alerts: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_enabled: true,
            push_enabled: true,
            frequency: DEFAULT_FREQUENCY.to_string(),
            price_drop_threshold: DEFAULT_DROP_THRESHOLD,
            absolute_threshold: 0.0,
            stock_alerts: true,
        }
    }
}
