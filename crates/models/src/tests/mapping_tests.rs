use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};

use crate::record::Record;
use crate::{group_gift, price_alert, reminder, saved_gift, social};

const NOW: &str = "2024-06-01T12:00:00.000Z";

/// Store a payload the way the backend would: add `Id`, keep every field.
fn stored<T: Serialize>(payload: &T, id: i64) -> Result<Record> {
    let mut record = Record::from_payload(payload)?;
    record.as_map_mut().insert("Id".into(), json!(id));
    Ok(record)
}

/// Test group gift written with defaults reads back with the same defaults
#[test]
fn group_gift_defaults_round_trip() -> Result<()> {
    let input = group_gift::NewGroupGift { title: "Camera".into(), recipient_id: Some(3), ..Default::default() };
    let record = stored(&input.to_create(NOW), 10)?;
    let gift = group_gift::GroupGift::try_from(&record)?;

    assert_eq!(gift.id, 10);
    assert_eq!(gift.title, "Camera");
    assert_eq!(gift.target_amount, 0.0);
    assert_eq!(gift.current_amount, 0.0);
    assert_eq!(gift.status, group_gift::STATUS_ACTIVE);
    assert_eq!(gift.occasion_type, group_gift::DEFAULT_OCCASION);
    assert_eq!(gift.created_at.as_deref(), Some(NOW));
    assert_eq!(gift.recipient_id, Some(3));
    assert_eq!(gift.gift_id, None);
    Ok(())
}

/// Test group gift update payload keeps the record id and replaces every editable field
#[test]
fn group_gift_update_from_model() -> Result<()> {
    let record = Record::from_value(json!({ "Id": 5, "title_c": "Trip", "target_amount_c": "500", "current_amount_c": 120 }))?;
    let gift = group_gift::GroupGift::try_from(&record)?;
    let mut update = group_gift::GroupGiftUpdate::from(&gift);
    update.current_amount = Some(gift.current_amount + 30.0);

    let patch = serde_json::to_value(update.to_patch(gift.id))?;
    assert_eq!(patch["Id"], 5);
    assert_eq!(patch["title_c"], "Trip");
    assert_eq!(patch["target_amount_c"], 500.0);
    assert_eq!(patch["current_amount_c"], 150.0);
    assert_eq!(patch["status_c"], "active");
    Ok(())
}

/// Test price alert defaults survive the create → read cycle
#[test]
fn price_alert_defaults_round_trip() -> Result<()> {
    let input = price_alert::NewPriceAlert { gift_id: Some(4), recipient_id: Some(2), ..Default::default() };
    let record = stored(&input.to_create(NOW), 1)?;
    let alert = price_alert::PriceAlert::try_from(&record)?;

    assert!(alert.enabled);
    assert_eq!(alert.price_drop_threshold, 10);
    assert_eq!(alert.absolute_threshold, 0.0);
    assert!(alert.stock_alerts && alert.email_enabled && alert.push_enabled);
    assert_eq!(alert.frequency, "immediate");
    assert_eq!(alert.last_triggered, None);
    assert_eq!(alert.total_savings, 0.0);
    assert_eq!(alert.gift_id, Some(4));
    assert_eq!(alert.recipient_id, Some(2));
    Ok(())
}

/// Test toggling through the config preserves every other setting
#[test]
fn price_alert_config_from_model() -> Result<()> {
    let record = Record::from_value(json!({
        "Id": 8, "enabled_c": true, "price_drop_threshold_c": 25, "push_enabled_c": false, "frequency_c": "daily"
    }))?;
    let alert = price_alert::PriceAlert::try_from(&record)?;
    let mut cfg = price_alert::AlertConfig::from(&alert);
    cfg.enabled = Some(!alert.enabled);

    let patch = serde_json::to_value(cfg.to_patch(alert.id))?;
    assert_eq!(patch["enabled_c"], false);
    assert_eq!(patch["price_drop_threshold_c"], 25);
    assert_eq!(patch["push_enabled_c"], false);
    assert_eq!(patch["stock_alerts_c"], true);
    assert_eq!(patch["frequency_c"], "daily");
    Ok(())
}

/// Test reminder defaults survive the create → read cycle
#[test]
fn reminder_defaults_round_trip() -> Result<()> {
    let input = reminder::NewReminder { recipient_id: Some(9), ..Default::default() };
    let record = stored(&input.to_create(NOW), 2)?;
    let rem = reminder::Reminder::try_from(&record)?;

    assert_eq!(rem.alert_date.as_deref(), Some(NOW));
    assert_eq!(rem.status, "active");
    assert_eq!(rem.recipient_id, Some(9));
    assert_eq!(rem.occasion_id, None);
    assert!(rem.recipient.is_none());
    Ok(())
}

/// Test saved gift defaults survive the create → read cycle
#[test]
fn saved_gift_defaults_round_trip() -> Result<()> {
    let input = saved_gift::NewSavedGift { gift_id: Some(6), recipient_id: Some(1), ..Default::default() };
    let record = stored(&input.to_create(NOW), 3)?;
    let saved = saved_gift::SavedGift::try_from(&record)?;

    assert_eq!(saved.saved_date.as_deref(), Some(NOW));
    assert_eq!(saved.notes, "");
    assert!(!saved.price_alert);
    assert!(saved.same_pair(Some(6), Some(1)));
    Ok(())
}

/// Test recorded activity defaults survive the create → read cycle
#[test]
fn activity_defaults_round_trip() -> Result<()> {
    let input = social::NewActivity { friend_id: Some(2), gift_id: Some(7), gift_title: "Book".into(), ..Default::default() };
    let payload = input.to_create(NOW);
    assert_eq!(payload.name, "shared activity");
    let record = stored(&payload, 4)?;
    let activity = social::GiftActivity::try_from(&record)?;

    assert_eq!(activity.kind, "shared");
    assert_eq!(activity.friend_id, 2);
    assert_eq!(activity.gift_id, 7);
    assert_eq!(activity.price, None);
    assert_eq!(activity.timestamp.as_deref(), Some(NOW));
    assert_eq!(activity.privacy, "public");
    assert!(activity.can_view);
    Ok(())
}

/// Test UI models serialize with the presentation field names
#[test]
fn ui_models_use_camel_case_and_capital_id() -> Result<()> {
    let record = Record::from_value(json!({ "Id": 1, "target_amount_c": 50 }))?;
    let value: Value = serde_json::to_value(group_gift::GroupGift::try_from(&record)?)?;
    assert_eq!(value["Id"], 1);
    assert_eq!(value["targetAmount"], 50.0);
    assert!(value.get("invitedContributors").is_some());
    Ok(())
}

/// Test records without an Id are rejected
#[test]
fn missing_id_is_an_error() {
    let record = Record::from_value(json!({ "title_c": "x" })).expect("object");
    assert!(group_gift::GroupGift::try_from(&record).is_err());
}
