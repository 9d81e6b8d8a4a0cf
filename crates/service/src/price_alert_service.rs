use std::sync::Arc;

use models::price_alert::{self, AlertConfig, NewPriceAlert, NotificationSettings, PriceAlert};
use models::record::{now_iso, ID};
use models::RecordId;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::client::{RecordClient, SortType};
use crate::errors::ServiceError;
use crate::table::{logged, or_fallback, RecordTable};

/// Price drop alerts on saved gifts, plus the user's notification preferences.
pub struct PriceAlertService<C: RecordClient> {
    table: RecordTable<C>,
    settings: RwLock<NotificationSettings>,
}

impl<C: RecordClient> PriceAlertService<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            table: RecordTable::new(client, price_alert::TABLE, price_alert::FIELDS),
            settings: RwLock::new(NotificationSettings::default()),
        }
    }

    #[instrument(skip(self), fields(table = price_alert::TABLE))]
    pub async fn get_all(&self) -> Result<Vec<PriceAlert>, ServiceError> {
        let params = self.table.params().order_by(ID, SortType::Desc);
        logged(self.table.fetch(&params).await, "fetching price alerts")
    }

    #[instrument(skip(self), fields(table = price_alert::TABLE))]
    pub async fn get_by_id(&self, id: RecordId) -> Option<PriceAlert> {
        or_fallback(self.table.get(id).await, "fetching price alert")
    }

    #[instrument(skip(self), fields(table = price_alert::TABLE))]
    pub async fn get_by_recipient(&self, recipient_id: RecordId) -> Vec<PriceAlert> {
        let params = self.table.params().where_eq("recipient_c", recipient_id).order_by(ID, SortType::Desc);
        or_fallback(self.table.fetch(&params).await, "fetching price alerts by recipient")
    }

    #[instrument(skip(self, input), fields(table = price_alert::TABLE, gift_id = ?input.gift_id, recipient_id = ?input.recipient_id))]
    pub async fn create(&self, input: NewPriceAlert) -> Result<PriceAlert, ServiceError> {
        let record = logged(self.table.create(&input.to_create(&now_iso())).await, "creating price alert")?;
        let alert = PriceAlert::try_from(&record)?;
        info!(id = alert.id, "price_alert_created");
        Ok(alert)
    }

    /// Writes the tunable alert fields; unset flags stay as stored.
    #[instrument(skip(self, config), fields(table = price_alert::TABLE))]
    pub async fn update(&self, id: RecordId, config: AlertConfig) -> Result<PriceAlert, ServiceError> {
        let record = logged(self.table.update(&config.to_patch(id)).await, "updating price alert")?;
        Ok(PriceAlert::try_from(&record)?)
    }

    pub async fn update_config(&self, id: RecordId, config: AlertConfig) -> Result<PriceAlert, ServiceError> {
        self.update(id, config).await
    }

    #[instrument(skip(self), fields(table = price_alert::TABLE))]
    pub async fn toggle_alert(&self, id: RecordId) -> Result<PriceAlert, ServiceError> {
        let current = logged(self.table.require::<PriceAlert>(id, "price alert").await, "toggling price alert")?;
        let mut config = AlertConfig::from(&current);
        config.enabled = Some(!current.enabled);
        self.update(id, config).await
    }

    #[instrument(skip(self), fields(table = price_alert::TABLE))]
    pub async fn delete(&self, id: RecordId) -> Result<bool, ServiceError> {
        logged(self.table.delete(id).await, "deleting price alert")
    }

    pub async fn get_notification_settings(&self) -> NotificationSettings {
        self.settings.read().await.clone()
    }

    #[instrument(skip(self, settings), fields(frequency = %settings.frequency))]
    pub async fn update_notification_settings(&self, settings: NotificationSettings) -> NotificationSettings {
        *self.settings.write().await = settings.clone();
        info!("notification_settings_updated");
        settings
    }
}
