use std::sync::Arc;

use chrono::Utc;
use models::group_gift::{
    self, status_for, Contribution, ContributionStats, GroupGift, GroupGiftUpdate, Invitation, InvitationRequest,
    NewContribution, NewGroupGift,
};
use models::record::{now_iso, ID};
use models::RecordId;
use tracing::{info, instrument};

use crate::client::{RecordClient, SortType};
use crate::errors::ServiceError;
use crate::table::{logged, or_fallback, RecordTable};

/// Group gifts pooled from several contributors.
pub struct GroupGiftService<C: RecordClient> {
    table: RecordTable<C>,
}

impl<C: RecordClient> GroupGiftService<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { table: RecordTable::new(client, group_gift::TABLE, group_gift::FIELDS) }
    }

    #[instrument(skip(self), fields(table = group_gift::TABLE))]
    pub async fn get_all(&self) -> Result<Vec<GroupGift>, ServiceError> {
        let params = self.table.params().order_by(ID, SortType::Desc);
        logged(self.table.fetch(&params).await, "fetching group gifts")
    }

    #[instrument(skip(self), fields(table = group_gift::TABLE))]
    pub async fn get_by_id(&self, id: RecordId) -> Result<GroupGift, ServiceError> {
        logged(self.table.require(id, "group gift").await, "fetching group gift")
    }

    #[instrument(skip(self), fields(table = group_gift::TABLE))]
    pub async fn get_by_recipient(&self, recipient_id: RecordId) -> Vec<GroupGift> {
        let params = self.table.params().where_eq("recipient_c", recipient_id);
        or_fallback(self.table.fetch(&params).await, "fetching group gifts by recipient")
    }

    #[instrument(skip(self, input), fields(table = group_gift::TABLE, title = %input.title))]
    pub async fn create(&self, input: NewGroupGift) -> Result<GroupGift, ServiceError> {
        let payload = input.to_create(&now_iso());
        let record = logged(self.table.create(&payload).await, "creating group gift")?;
        let mut gift = GroupGift::try_from(&record)?;
        gift.invited_contributors = input.invited_contributors;
        info!(id = gift.id, "group_gift_created");
        Ok(gift)
    }

    #[instrument(skip(self, update), fields(table = group_gift::TABLE))]
    pub async fn update(&self, id: RecordId, update: GroupGiftUpdate) -> Result<GroupGift, ServiceError> {
        let record = logged(self.table.update(&update.to_patch(id)).await, "updating group gift")?;
        let mut gift = GroupGift::try_from(&record)?;
        gift.contributors = update.contributors;
        gift.invited_contributors = update.invited_contributors;
        Ok(gift)
    }

    #[instrument(skip(self), fields(table = group_gift::TABLE))]
    pub async fn delete(&self, id: RecordId) -> Result<bool, ServiceError> {
        logged(self.table.delete(id).await, "deleting group gift")
    }

    /// Raise the collected amount, completing the gift once it reaches its target.
    #[instrument(skip(self, contribution), fields(table = group_gift::TABLE, amount = contribution.amount))]
    pub async fn add_contribution(&self, id: RecordId, contribution: NewContribution) -> Result<Contribution, ServiceError> {
        let gift = logged(self.table.require::<GroupGift>(id, "group gift").await, "adding contribution")?;
        let current = gift.current_amount + contribution.amount;
        let mut update = GroupGiftUpdate::from(&gift);
        update.current_amount = Some(current);
        update.status = Some(status_for(current, gift.target_amount).to_string());
        logged(self.table.update(&update.to_patch(id)).await, "adding contribution")?;
        info!(id, current, target = gift.target_amount, "contribution_added");

        Ok(Contribution {
            id: Utc::now().timestamp_millis(),
            name: contribution.name,
            email: contribution.email,
            amount: contribution.amount,
            contributed_at: now_iso(),
            message: contribution.message.unwrap_or_default(),
        })
    }

    /// Invitations are not persisted; each request becomes a pending invitation.
    #[instrument(skip(self, invitations), fields(count = invitations.len()))]
    pub async fn invite_contributors(&self, id: RecordId, invitations: Vec<InvitationRequest>) -> Vec<Invitation> {
        let now = now_iso();
        invitations.into_iter().map(|i| i.into_pending(&now)).collect()
    }

    #[instrument(skip(self))]
    pub async fn remove_invitation(&self, id: RecordId, email: &str) -> bool {
        true
    }

    #[instrument(skip(self))]
    pub async fn get_contribution_stats(&self) -> ContributionStats {
        let stats = self.get_all().await.map(|gifts| ContributionStats::from_gifts(&gifts));
        or_fallback(stats, "fetching contribution stats")
    }
}
