use std::sync::Arc;

use chrono::{Duration, Utc};
use models::record::{now_iso, to_iso};
use models::reminder::{self, NewReminder, Reminder, ReminderUpdate, STATUS_ACTIVE, STATUS_SNOOZED};
use models::RecordId;
use serde_json::json;
use tracing::{error, info, instrument};

use crate::client::{Operator, RecordClient, SortType};
use crate::errors::ServiceError;
use crate::table::{logged, or_fallback, RecordTable};

pub const DEFAULT_UPCOMING_DAYS: i64 = 30;
pub const DEFAULT_SNOOZE_HOURS: i64 = 24;

const ALERT_DATE: &str = "alert_date_c";

pub struct ReminderService<C: RecordClient> {
    table: RecordTable<C>,
}

impl<C: RecordClient> ReminderService<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { table: RecordTable::new(client, reminder::TABLE, reminder::FIELDS) }
    }

    #[instrument(skip(self), fields(table = reminder::TABLE))]
    pub async fn get_all(&self) -> Result<Vec<Reminder>, ServiceError> {
        let params = self.table.params().order_by(ALERT_DATE, SortType::Asc);
        logged(self.table.fetch(&params).await, "fetching reminders")
    }

    #[instrument(skip(self), fields(table = reminder::TABLE))]
    pub async fn get_by_id(&self, id: RecordId) -> Option<Reminder> {
        or_fallback(self.table.get(id).await, "fetching reminder")
    }

    /// Active reminders due between now and `days` from now, soonest first.
    #[instrument(skip(self), fields(table = reminder::TABLE))]
    pub async fn get_upcoming(&self, days: i64) -> Vec<Reminder> {
        let now = Utc::now();
        let Some(until) = Duration::try_days(days).and_then(|d| now.checked_add_signed(d)) else {
            error!(days, "Error fetching upcoming reminders: date window out of range");
            return Vec::new();
        };
        let params = self
            .table
            .params()
            .filter(ALERT_DATE, Operator::GreaterThanOrEqualTo, [json!(to_iso(now))])
            .filter(ALERT_DATE, Operator::LessThanOrEqualTo, [json!(to_iso(until))])
            .where_eq("status_c", STATUS_ACTIVE)
            .order_by(ALERT_DATE, SortType::Asc);
        or_fallback(self.table.fetch(&params).await, "fetching upcoming reminders")
    }

    #[instrument(skip(self), fields(table = reminder::TABLE))]
    pub async fn get_by_recipient(&self, recipient_id: RecordId) -> Vec<Reminder> {
        let params = self.table.params().where_eq("recipient_c", recipient_id);
        let reminders: Vec<Reminder> = or_fallback(self.table.fetch(&params).await, "fetching reminders by recipient");
        reminders.into_iter().map(Reminder::without_details).collect()
    }

    #[instrument(skip(self, input), fields(table = reminder::TABLE, recipient_id = ?input.recipient_id))]
    pub async fn create(&self, input: NewReminder) -> Result<Reminder, ServiceError> {
        let record = logged(self.table.create(&input.to_create(&now_iso())).await, "creating reminder")?;
        let created = Reminder::try_from(&record)?;
        info!(id = created.id, "reminder_created");
        Ok(created)
    }

    #[instrument(skip(self, update), fields(table = reminder::TABLE))]
    pub async fn update(&self, id: RecordId, update: ReminderUpdate) -> Result<Reminder, ServiceError> {
        let record = logged(self.table.update(&update.to_patch(id)).await, "updating reminder")?;
        Ok(Reminder::try_from(&record)?)
    }

    #[instrument(skip(self), fields(table = reminder::TABLE))]
    pub async fn delete(&self, id: RecordId) -> Result<bool, ServiceError> {
        logged(self.table.delete(id).await, "deleting reminder")
    }

    /// Push the alert `hours` into the future and mark the reminder snoozed.
    #[instrument(skip(self), fields(table = reminder::TABLE))]
    pub async fn snooze(&self, id: RecordId, hours: i64) -> Result<Reminder, ServiceError> {
        logged(self.table.require::<Reminder>(id, "reminder").await, "snoozing reminder")?;
        let until = Duration::try_hours(hours)
            .and_then(|d| Utc::now().checked_add_signed(d))
            .ok_or_else(|| ServiceError::Validation(format!("snooze of {hours} hours is out of range")));
        let until = logged(until, "snoozing reminder")?;
        let update = ReminderUpdate {
            alert_date: Some(to_iso(until)),
            status: Some(STATUS_SNOOZED.to_string()),
        };
        self.update(id, update).await
    }
}
