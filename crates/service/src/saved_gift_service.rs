use std::sync::Arc;

use models::price_alert::{AlertConfig, NewPriceAlert, PriceAlert};
use models::record::now_iso;
use models::saved_gift::{self, NewSavedGift, SavedGift, SavedGiftUpdate};
use models::RecordId;
use tracing::{info, instrument, warn};

use crate::client::{RecordClient, SortType};
use crate::errors::ServiceError;
use crate::price_alert_service::PriceAlertService;
use crate::table::{logged, or_fallback, RecordTable};

const SAVED_DATE: &str = "saved_date_c";

/// Gifts bookmarked for a recipient. Price alerts on them go through
/// the shared [`PriceAlertService`].
pub struct SavedGiftService<C: RecordClient> {
    table: RecordTable<C>,
    price_alerts: Arc<PriceAlertService<C>>,
}

impl<C: RecordClient> SavedGiftService<C> {
    pub fn new(client: Arc<C>, price_alerts: Arc<PriceAlertService<C>>) -> Self {
        Self { table: RecordTable::new(client, saved_gift::TABLE, saved_gift::FIELDS), price_alerts }
    }

    #[instrument(skip(self), fields(table = saved_gift::TABLE))]
    pub async fn get_all(&self) -> Result<Vec<SavedGift>, ServiceError> {
        let params = self.table.params().order_by(SAVED_DATE, SortType::Desc);
        logged(self.table.fetch(&params).await, "fetching saved gifts")
    }

    #[instrument(skip(self), fields(table = saved_gift::TABLE))]
    pub async fn get_by_id(&self, id: RecordId) -> Option<SavedGift> {
        or_fallback(self.table.get(id).await, "fetching saved gift")
    }

    #[instrument(skip(self), fields(table = saved_gift::TABLE))]
    pub async fn get_by_recipient(&self, recipient_id: RecordId) -> Vec<SavedGift> {
        let params = self
            .table
            .params()
            .where_eq("recipient_c", recipient_id)
            .order_by(SAVED_DATE, SortType::Desc);
        or_fallback(self.table.fetch(&params).await, "fetching saved gifts by recipient")
    }

    /// Save a gift for a recipient; the same pair can only be saved once.
    #[instrument(skip(self, input), fields(table = saved_gift::TABLE, gift_id = ?input.gift_id, recipient_id = ?input.recipient_id))]
    pub async fn create(&self, input: NewSavedGift) -> Result<SavedGift, ServiceError> {
        if let Some(recipient_id) = input.recipient_id {
            let existing = self.get_by_recipient(recipient_id).await;
            if existing.iter().any(|s| s.same_pair(input.gift_id, input.recipient_id)) {
                warn!("gift_already_saved");
                return Err(ServiceError::AlreadySaved);
            }
        }
        let record = logged(self.table.create(&input.to_create(&now_iso())).await, "creating saved gift")?;
        let saved = SavedGift::try_from(&record)?;
        info!(id = saved.id, "saved_gift_created");
        Ok(saved)
    }

    #[instrument(skip(self, update), fields(table = saved_gift::TABLE))]
    pub async fn update(&self, id: RecordId, update: SavedGiftUpdate) -> Result<SavedGift, ServiceError> {
        let record = logged(self.table.update(&update.to_patch(id)).await, "updating saved gift")?;
        Ok(SavedGift::try_from(&record)?)
    }

    #[instrument(skip(self), fields(table = saved_gift::TABLE))]
    pub async fn delete(&self, id: RecordId) -> Result<bool, ServiceError> {
        logged(self.table.delete(id).await, "deleting saved gift")
    }

    #[instrument(skip(self), fields(table = saved_gift::TABLE))]
    pub async fn toggle_price_alert(&self, id: RecordId) -> Result<SavedGift, ServiceError> {
        let saved = self.require(id, "toggling price alert").await?;
        let update = SavedGiftUpdate { price_alert: !saved.price_alert, ..SavedGiftUpdate::from(&saved) };
        self.update(id, update).await
    }

    #[instrument(skip(self, note), fields(table = saved_gift::TABLE))]
    pub async fn add_note(&self, id: RecordId, note: &str) -> Result<SavedGift, ServiceError> {
        let saved = self.require(id, "adding note").await?;
        let update = SavedGiftUpdate { notes: note.to_string(), ..SavedGiftUpdate::from(&saved) };
        self.update(id, update).await
    }

    /// Saved gifts with their price alert flag set.
    #[instrument(skip(self), fields(table = saved_gift::TABLE))]
    pub async fn get_price_alerts(&self) -> Vec<SavedGift> {
        let params = self.table.params().order_by(SAVED_DATE, SortType::Desc);
        let saved: Vec<SavedGift> = or_fallback(self.table.fetch(&params).await, "fetching price alert gifts");
        saved.into_iter().filter(|s| s.price_alert).collect()
    }

    /// Create a price alert for the gift and recipient of a saved gift.
    #[instrument(skip(self, config), fields(table = saved_gift::TABLE))]
    pub async fn create_price_alert(&self, saved_gift_id: RecordId, config: AlertConfig) -> Result<PriceAlert, ServiceError> {
        let saved = self.require(saved_gift_id, "creating price alert").await?;
        let input = NewPriceAlert { name: None, gift_id: saved.gift_id, recipient_id: saved.recipient_id, config };
        self.price_alerts.create(input).await
    }

    async fn require(&self, id: RecordId, what: &str) -> Result<SavedGift, ServiceError> {
        logged(self.table.require(id, "saved gift").await, what)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{Failure, InMemoryRecordClient, Op};
    use serde_json::json;

    fn service() -> (Arc<InMemoryRecordClient>, SavedGiftService<InMemoryRecordClient>) {
        let client = Arc::new(InMemoryRecordClient::new());
        let alerts = Arc::new(PriceAlertService::new(client.clone()));
        (client.clone(), SavedGiftService::new(client, alerts))
    }

    fn pair(gift_id: RecordId, recipient_id: RecordId) -> NewSavedGift {
        NewSavedGift { gift_id: Some(gift_id), recipient_id: Some(recipient_id), ..Default::default() }
    }

    /// Test the same gift cannot be saved twice for one recipient
    #[tokio::test]
    async fn rejects_duplicate_pairs() -> Result<(), anyhow::Error> {
        let (_, svc) = service();
        svc.create(pair(4, 2)).await?;
        assert!(matches!(svc.create(pair(4, 2)).await, Err(ServiceError::AlreadySaved)));
        svc.create(pair(4, 3)).await?;
        svc.create(pair(5, 2)).await?;
        assert_eq!(svc.get_all().await?.len(), 3);
        Ok(())
    }

    /// Test toggling and noting keep the other field intact
    #[tokio::test]
    async fn toggle_and_note_preserve_each_other() -> Result<(), anyhow::Error> {
        let (_, svc) = service();
        let saved = svc.create(NewSavedGift { notes: "size M".into(), ..pair(1, 1) }).await?;

        let toggled = svc.toggle_price_alert(saved.id).await?;
        assert!(toggled.price_alert);
        assert_eq!(toggled.notes, "size M");

        let noted = svc.add_note(saved.id, "size L").await?;
        assert_eq!(noted.notes, "size L");
        assert!(noted.price_alert);

        let flagged = svc.get_price_alerts().await;
        assert_eq!(flagged.iter().map(|s| s.id).collect::<Vec<_>>(), vec![saved.id]);

        assert!(matches!(svc.add_note(404, "x").await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    /// Test the alert list uses the same truthiness as the mapped flag
    #[tokio::test]
    async fn price_alerts_follow_mapped_flag() -> Result<(), anyhow::Error> {
        let (client, svc) = service();
        client
            .seed(saved_gift::TABLE, [
                json!({ "price_alert_c": 1 }),
                json!({ "price_alert_c": "true" }),
                json!({ "price_alert_c": 0 }),
                json!({ "price_alert_c": "" }),
                json!({ "notes_c": "no flag" }),
            ])
            .await;
        let flags: Vec<bool> = svc.get_all().await?.iter().map(|s| s.price_alert).collect();
        assert_eq!(flags.iter().filter(|f| **f).count(), 2);

        let mut ids: Vec<RecordId> = svc.get_price_alerts().await.iter().map(|s| s.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
        Ok(())
    }

    /// Test reads fall back to empty results on a failed envelope
    #[tokio::test]
    async fn read_fallbacks() -> Result<(), anyhow::Error> {
        let (client, svc) = service();
        client
            .seed(saved_gift::TABLE, [json!({ "gift_c": { "Id": 1, "Name": "Mug" }, "recipient_c": { "Id": 9, "Name": "Jo" } })])
            .await;
        client.fail_always(Op::Fetch, saved_gift::TABLE, Failure::Envelope("db down".into())).await;
        assert!(svc.get_by_recipient(9).await.is_empty());
        assert!(svc.get_price_alerts().await.is_empty());
        assert!(svc.get_all().await.is_err());
        assert_eq!(svc.get_by_id(1).await.and_then(|s| s.recipient).map(|r| r.name), Some("Jo".to_string()));
        Ok(())
    }
}
