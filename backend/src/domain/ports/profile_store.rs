//! Port for the local key-value store holding citizen session state.

use async_trait::async_trait;

use crate::domain::{CitizenState, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile store adapters.
    pub enum ProfileStoreError {
        /// Reading or writing the backing storage failed.
        Io { message: String } =>
            "profile store i/o failed: {message}",
        /// A stored profile could not be decoded or broke an invariant.
        Corrupt { key: String, message: String } =>
            "stored profile {key} is unreadable: {message}",
    }
}

/// Keyed by [`UserId`]; one entry per user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load(&self, user_id: &UserId) -> Result<Option<CitizenState>, ProfileStoreError>;

    /// Insert or replace the entry for `state.user`.
    async fn save(&self, state: &CitizenState) -> Result<(), ProfileStoreError>;

    /// Every stored entry, in no particular order.
    async fn load_all(&self) -> Result<Vec<CitizenState>, ProfileStoreError>;
}
