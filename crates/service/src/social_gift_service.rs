//! Friends and shared wishlists live in per-instance tables until the backend
//! grows them; the activity feed is the `social_gift_c` table.

use std::sync::Arc;

use models::record::now_iso;
use models::social::{
    self, next_id, seed_friends, seed_wishlists, Collaborator, Friend, GiftActivity, GiftActivityCreate, NewActivity,
    NewFriend, NewWishlist, NewWishlistItem, SharedWishlist, SocialStats, WishlistItem, CURRENT_USER_EMAIL,
};
use models::RecordId;
use tokio::sync::RwLock;
use tracing::{error, info, instrument};

use crate::client::{RecordClient, SortType};
use crate::errors::ServiceError;
use crate::table::{logged, or_fallback, RecordTable};

pub struct SocialGiftService<C: RecordClient> {
    table: RecordTable<C>,
    friends: RwLock<Vec<Friend>>,
    wishlists: RwLock<Vec<SharedWishlist>>,
}

impl<C: RecordClient> SocialGiftService<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            table: RecordTable::new(client, social::TABLE, social::FIELDS),
            friends: RwLock::new(seed_friends()),
            wishlists: RwLock::new(seed_wishlists()),
        }
    }

    pub async fn get_friends(&self) -> Vec<Friend> {
        self.friends.read().await.clone()
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn add_friend(&self, input: NewFriend) -> Friend {
        let mut friends = self.friends.write().await;
        let now = now_iso();
        let friend = Friend {
            id: next_id(friends.iter().map(|f| f.id)),
            name: input.name,
            email: input.email,
            photo_url: input.photo_url.unwrap_or_default(),
            status: "pending".into(),
            mutual_friends: 0,
            joined_at: now.clone(),
            last_active: now,
        };
        friends.push(friend.clone());
        info!(id = friend.id, "friend_added");
        friend
    }

    #[instrument(skip(self))]
    pub async fn remove_friend(&self, id: RecordId) -> Result<Friend, ServiceError> {
        let mut friends = self.friends.write().await;
        let idx = friends.iter().position(|f| f.id == id).ok_or_else(|| ServiceError::not_found("friend"))?;
        Ok(friends.remove(idx))
    }

    pub async fn get_shared_wishlists(&self) -> Vec<SharedWishlist> {
        self.wishlists.read().await.clone()
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_shared_wishlist(&self, input: NewWishlist) -> SharedWishlist {
        let mut wishlists = self.wishlists.write().await;
        let wishlist = SharedWishlist {
            id: next_id(wishlists.iter().map(|w| w.id)),
            title: input.title,
            description: input.description.unwrap_or_default(),
            is_public: input.is_public.unwrap_or(false),
            allow_contributions: input.allow_contributions.unwrap_or(true),
            created_by: CURRENT_USER_EMAIL.into(),
            created_at: now_iso(),
            collaborators: vec![Collaborator {
                id: 1,
                name: "You".into(),
                email: CURRENT_USER_EMAIL.into(),
                role: "owner".into(),
            }],
            items: Vec::new(),
        };
        wishlists.push(wishlist.clone());
        info!(id = wishlist.id, "wishlist_created");
        wishlist
    }

    #[instrument(skip(self))]
    pub async fn update_wishlist_privacy(&self, id: RecordId, is_public: bool) -> Result<SharedWishlist, ServiceError> {
        let mut wishlists = self.wishlists.write().await;
        let wishlist = wishlists
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| ServiceError::not_found("wishlist"))?;
        wishlist.is_public = is_public;
        Ok(wishlist.clone())
    }

    #[instrument(skip(self, item), fields(title = %item.title))]
    pub async fn add_item_to_wishlist(&self, wishlist_id: RecordId, item: NewWishlistItem) -> Result<WishlistItem, ServiceError> {
        let mut wishlists = self.wishlists.write().await;
        let wishlist = wishlists
            .iter_mut()
            .find(|w| w.id == wishlist_id)
            .ok_or_else(|| ServiceError::not_found("wishlist"))?;
        let added = WishlistItem {
            id: wishlist.next_item_id(),
            item,
            added_at: now_iso(),
            added_by: CURRENT_USER_EMAIL.into(),
        };
        wishlist.items.push(added.clone());
        Ok(added)
    }

    #[instrument(skip(self), fields(table = social::TABLE))]
    pub async fn get_gift_activities(&self) -> Vec<GiftActivity> {
        let params = self.table.params().order_by("timestamp_c", SortType::Desc);
        or_fallback(self.table.fetch(&params).await, "fetching gift activities")
    }

    /// One `shared` activity per friend; friends whose write fails are skipped.
    #[instrument(skip(self, friend_ids, message), fields(table = social::TABLE, friends = friend_ids.len()))]
    pub async fn share_gift(&self, gift_id: RecordId, friend_ids: &[RecordId], message: &str) -> Vec<GiftActivity> {
        let friends = self.get_friends().await;
        let mut shared = Vec::with_capacity(friend_ids.len());
        for &friend_id in friend_ids {
            let friend = friends.iter().find(|f| f.id == friend_id);
            let payload = GiftActivityCreate::shared(gift_id, friend_id, friend, message, &now_iso());
            let activity = self
                .table
                .create(&payload)
                .await
                .and_then(|record| GiftActivity::try_from(&record).map_err(ServiceError::from));
            match activity {
                Ok(activity) => shared.push(activity),
                Err(e) => error!(error = %e, friend_id, "Error sharing gift"),
            }
        }
        shared
    }

    #[instrument(skip(self, input), fields(table = social::TABLE))]
    pub async fn record_gift_activity(&self, input: NewActivity) -> Result<GiftActivity, ServiceError> {
        let record = logged(self.table.create(&input.to_create(&now_iso())).await, "recording gift activity")?;
        Ok(GiftActivity::try_from(&record)?)
    }

    pub async fn get_social_stats(&self) -> SocialStats {
        let friends = self.friends.read().await;
        let wishlists = self.wishlists.read().await;
        SocialStats::from_tables(&friends, &wishlists)
    }
}
