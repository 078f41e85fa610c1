//! Driving port for citizen session and reward mutations.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, ProfileView, UserId};

/// Mutating citizen operations exposed to inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CitizenCommand: Send + Sync {
    /// Resume the profile for the credentials' email, creating it on first
    /// login.
    async fn login(&self, credentials: &LoginCredentials) -> Result<ProfileView, Error>;

    /// End the session. The profile is kept; notifications are discarded.
    async fn logout(&self, user_id: &UserId) -> Result<(), Error>;

    async fn mark_notifications_read(&self, user_id: &UserId) -> Result<(), Error>;

    /// Spend points on a catalogue reward.
    async fn redeem_reward(&self, user_id: &UserId, reward_id: &str)
    -> Result<ProfileView, Error>;
}
