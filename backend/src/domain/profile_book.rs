//! Serialised access to stored citizen state.
//!
//! Every read-modify-write of a profile goes through [`ProfileBook::modify`]
//! or [`ProfileBook::upsert`], which hold one async lock across the load,
//! the change and the save. Two requests touching profiles never interleave.

use std::sync::Arc;

use mockable::Clock;
use tokio::sync::Mutex;
use tracing::warn;

use super::ports::{IdGenerator, ProfileStore, ProfileStoreError};
use super::{CitizenState, Error, NotificationEvent, UserId};

fn map_store_error(error: ProfileStoreError) -> Error {
    warn!(%error, "profile store failed");
    match error {
        ProfileStoreError::Io { message } => {
            Error::service_unavailable(format!("profile store unavailable: {message}"))
        }
        ProfileStoreError::Corrupt { key, message } => {
            Error::internal(format!("stored profile {key} is unreadable: {message}"))
        }
    }
}

fn unknown_session(user_id: &UserId) -> Error {
    Error::unauthorized(format!("no profile for session user {user_id}; sign in again"))
}

/// Per-citizen state loaded from the profile store and cached in memory.
pub struct ProfileBook<S: ?Sized> {
    store: Arc<S>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl<S> ProfileBook<S>
where
    S: ProfileStore + ?Sized,
{
    pub fn new(store: Arc<S>, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            ids,
            clock,
            lock: Mutex::new(()),
        }
    }

    /// Current state for `user_id`; `Unauthorized` when none is stored.
    pub async fn read(&self, user_id: &UserId) -> Result<CitizenState, Error> {
        self.store
            .load(user_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| unknown_session(user_id))
    }

    /// Every stored profile.
    pub async fn all(&self) -> Result<Vec<CitizenState>, Error> {
        self.store.load_all().await.map_err(map_store_error)
    }

    /// Apply `change` to the stored state and save it. Nothing is saved when
    /// `change` fails.
    pub async fn modify<T, F>(&self, user_id: &UserId, change: F) -> Result<T, Error>
    where
        F: FnOnce(&mut CitizenState, &Notifier<'_>) -> Result<T, Error> + Send,
        T: Send,
    {
        let _guard = self.lock.lock().await;
        let mut state = self.read(user_id).await?;
        let outcome = change(&mut state, &self.notifier())?;
        self.store.save(&state).await.map_err(map_store_error)?;
        Ok(outcome)
    }

    /// Like [`Self::modify`], starting from `create()` when nothing is
    /// stored yet.
    pub async fn upsert<T, C, F>(&self, user_id: &UserId, create: C, change: F) -> Result<T, Error>
    where
        C: FnOnce() -> CitizenState + Send,
        F: FnOnce(&mut CitizenState, &Notifier<'_>) -> Result<T, Error> + Send,
        T: Send,
    {
        let _guard = self.lock.lock().await;
        let mut state = self
            .store
            .load(user_id)
            .await
            .map_err(map_store_error)?
            .unwrap_or_else(create);
        let outcome = change(&mut state, &self.notifier())?;
        self.store.save(&state).await.map_err(map_store_error)?;
        Ok(outcome)
    }

    fn notifier(&self) -> Notifier<'_> {
        Notifier {
            ids: self.ids.as_ref(),
            clock: self.clock.as_ref(),
        }
    }
}

/// Stamps notification ids and times while a profile is being changed.
pub struct Notifier<'a> {
    ids: &'a dyn IdGenerator,
    clock: &'a dyn Clock,
}

impl Notifier<'_> {
    /// Append a notification for `event` to the citizen's inbox.
    pub fn notify(&self, state: &mut CitizenState, event: NotificationEvent) {
        let id = format!("ntf-{}", self.ids.next_uuid().simple());
        state.notifications.emit(event, id, self.clock.utc());
    }
}
