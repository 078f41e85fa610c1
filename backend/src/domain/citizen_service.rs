//! Citizen session, profile and reward service.
//!
//! Implements [`CitizenCommand`] and [`CitizenQuery`]. Login is an identity
//! switch: the email picks the stored profile and nothing is checked
//! against a credential store.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::catalog::{BADGES, REWARDS, reward};
use super::ports::{
    BadgeView, CitizenCommand, CitizenQuery, IdGenerator, NotificationFeed, ProfileStore,
    RewardView,
};
use super::profile_book::ProfileBook;
use super::service_errors::gamification_rejected;
use super::{
    CitizenState, Error, ErrorCode, GamificationEngine, GamificationError, LoginCredentials,
    NotificationEvent, ProfileView, ReportCache, Role, User, UserId, city_rank,
};

/// Ledger reason for the opening balance of a new citizen.
pub const WELCOME_REASON: &str = "Welcome bonus";

/// Gamification and inbox operations for signed-in citizens.
pub struct CitizenService<S: ?Sized> {
    profiles: Arc<ProfileBook<S>>,
    cache: Arc<ReportCache>,
    gamification: GamificationEngine,
    welcome_points: i64,
}

impl<S> CitizenService<S>
where
    S: ProfileStore + ?Sized,
{
    pub fn new(
        profiles: Arc<ProfileBook<S>>,
        cache: Arc<ReportCache>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            cache,
            gamification: GamificationEngine::new(ids, clock),
            welcome_points: 0,
        }
    }

    /// Opening balance granted to citizens on their first login.
    pub fn with_welcome_points(mut self, points: i64) -> Self {
        self.welcome_points = points.max(0);
        self
    }

    fn starter_profile(&self, credentials: &LoginCredentials) -> CitizenState {
        let opening = (credentials.role() == Role::Citizen && self.welcome_points > 0)
            .then(|| {
                self.gamification
                    .ledger_entry(self.welcome_points, WELCOME_REASON)
            });
        CitizenState::new(User::new(
            credentials.user_id(),
            credentials.name(),
            credentials.email(),
            credentials.role(),
            opening,
        ))
    }
}

#[async_trait]
impl<S> CitizenCommand for CitizenService<S>
where
    S: ProfileStore + ?Sized,
{
    async fn login(&self, credentials: &LoginCredentials) -> Result<ProfileView, Error> {
        let user_id = credentials.user_id();
        let view = self
            .profiles
            .upsert(
                &user_id,
                || self.starter_profile(credentials),
                |state, notifier| {
                    let event = NotificationEvent::session_established(&state.user);
                    notifier.notify(state, event);
                    Ok(ProfileView::from(&*state))
                },
            )
            .await?;
        info!(user_id = %user_id, role = ?view.user.role, "session established");
        Ok(view)
    }

    async fn logout(&self, user_id: &UserId) -> Result<(), Error> {
        let outcome = self
            .profiles
            .modify(user_id, |state, _| {
                state.notifications.clear();
                Ok(())
            })
            .await;
        match outcome {
            Err(err) if err.code() == ErrorCode::Unauthorized => Ok(()),
            Err(err) => Err(err),
            Ok(()) => {
                info!(user_id = %user_id, "session ended");
                Ok(())
            }
        }
    }

    async fn mark_notifications_read(&self, user_id: &UserId) -> Result<(), Error> {
        self.profiles
            .modify(user_id, |state, _| {
                state.notifications.mark_all_read();
                Ok(())
            })
            .await
    }

    async fn redeem_reward(&self, user_id: &UserId, reward_id: &str) -> Result<ProfileView, Error> {
        let reward = reward(reward_id).ok_or_else(|| {
            gamification_rejected(GamificationError::UnknownReward {
                reward_id: reward_id.to_owned(),
            })
        })?;
        let gamification = &self.gamification;
        let view = self
            .profiles
            .modify(user_id, |state, notifier| {
                state.user = gamification
                    .redeem_reward(state.user.clone(), reward)
                    .map_err(gamification_rejected)?;
                notifier.notify(state, NotificationEvent::reward_redeemed(reward));
                Ok(ProfileView::from(&*state))
            })
            .await?;
        info!(user_id = %user_id, reward_id = reward.id, cost = reward.cost, "reward redeemed");
        Ok(view)
    }
}

#[async_trait]
impl<S> CitizenQuery for CitizenService<S>
where
    S: ProfileStore + ?Sized,
{
    async fn profile(&self, user_id: &UserId) -> Result<ProfileView, Error> {
        let others: Vec<i64> = self
            .profiles
            .all()
            .await?
            .into_iter()
            .filter(|state| state.user.role() == Role::Citizen && state.user.id() != user_id)
            .map(|state| state.user.points())
            .collect();
        let filed = self.cache.filed_by(user_id);
        let gamification = &self.gamification;
        self.profiles
            .modify(user_id, |state, notifier| {
                let evaluation = gamification.evaluate_badges(state.user.clone(), &filed);
                state.user = evaluation.user;
                for badge in evaluation.unlocked {
                    notifier.notify(state, NotificationEvent::badge_unlocked(badge));
                }
                let rank = city_rank(state.user.points(), others.iter().copied());
                state.user.set_city_rank(rank);
                Ok(ProfileView::from(&*state))
            })
            .await
    }

    async fn notifications(&self, user_id: &UserId) -> Result<NotificationFeed, Error> {
        let state = self.profiles.read(user_id).await?;
        Ok(NotificationFeed {
            unread: state.notifications.unread_count(),
            items: state.notifications.iter().cloned().collect(),
        })
    }

    async fn rewards(&self, user_id: &UserId) -> Result<Vec<RewardView>, Error> {
        let user = self.profiles.read(user_id).await?.user;
        Ok(REWARDS
            .iter()
            .map(|reward| RewardView {
                reward: *reward,
                redeemed: user.has_redeemed(reward.id),
                affordable: user.points() >= reward.cost,
            })
            .collect())
    }

    async fn badges(&self, user_id: &UserId) -> Result<Vec<BadgeView>, Error> {
        let user = self.profiles.read(user_id).await?.user;
        Ok(BADGES
            .iter()
            .map(|badge| BadgeView {
                badge: *badge,
                earned: user.has_badge(badge.id),
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "citizen_service_tests.rs"]
mod tests;
