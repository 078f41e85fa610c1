//! Profile store kept in process memory.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::ports::{ProfileStore, ProfileStoreError};
use crate::domain::{CitizenState, UserId};

#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    entries: RwLock<HashMap<UserId, CitizenState>>,
}

fn poisoned() -> ProfileStoreError {
    ProfileStoreError::io("profile map lock poisoned")
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn load(&self, user_id: &UserId) -> Result<Option<CitizenState>, ProfileStoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(user_id).cloned())
    }

    async fn save(&self, state: &CitizenState) -> Result<(), ProfileStoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(state.user.id().clone(), state.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<CitizenState>, ProfileStoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.values().cloned().collect())
    }
}
