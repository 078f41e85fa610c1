//! Driving port for citizen profile reads.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Badge, Error, Notification, ProfileView, Reward, UserId};

/// Notification feed, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    pub unread: usize,
    pub items: Vec<Notification>,
}

/// Catalogue reward annotated for one citizen.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RewardView {
    #[serde(flatten)]
    pub reward: Reward,
    pub redeemed: bool,
    pub affordable: bool,
}

/// Catalogue badge annotated for one citizen.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BadgeView {
    #[serde(flatten)]
    pub badge: Badge,
    pub earned: bool,
}

/// Read-only citizen views exposed to inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CitizenQuery: Send + Sync {
    /// Profile with a freshly computed city rank.
    async fn profile(&self, user_id: &UserId) -> Result<ProfileView, Error>;

    async fn notifications(&self, user_id: &UserId) -> Result<NotificationFeed, Error>;

    async fn rewards(&self, user_id: &UserId) -> Result<Vec<RewardView>, Error>;

    async fn badges(&self, user_id: &UserId) -> Result<Vec<BadgeView>, Error>;
}
