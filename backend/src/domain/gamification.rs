//! Gamification engine: point ledger, badges and reward redemption.
//!
//! Operations take a [`User`] by value and hand back the updated profile;
//! persisting it is the caller's job.

use std::fmt;
use std::sync::Arc;

use mockable::Clock;

use super::catalog::{BADGES, Badge, BadgeRule, Reward};
use super::ports::IdGenerator;
use super::{LedgerEntry, Report, ReportStatus, User};

/// Points granted for filing a report.
pub const DISPATCH_REWARD: i64 = 50;
/// Points granted to the reporter when a report is verified.
pub const VERIFICATION_REWARD: i64 = 100;

/// Rejections raised by the gamification engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GamificationError {
    InsufficientPoints { balance: i64, required: i64 },
    AlreadyRedeemed { reward_id: String },
    UnknownReward { reward_id: String },
}

impl fmt::Display for GamificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientPoints { balance, required } => write!(
                f,
                "insufficient points: balance {balance}, required {required}"
            ),
            Self::AlreadyRedeemed { reward_id } => {
                write!(f, "reward {reward_id} has already been redeemed")
            }
            Self::UnknownReward { reward_id } => write!(f, "unknown reward {reward_id}"),
        }
    }
}

impl std::error::Error for GamificationError {}

/// Result of [`GamificationEngine::evaluate_badges`].
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeEvaluation {
    pub user: User,
    pub unlocked: Vec<&'static Badge>,
}

/// Stateless rules over user profiles.
#[derive(Clone)]
pub struct GamificationEngine {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl GamificationEngine {
    /// Engine stamping ledger entries with ids from `ids` and times from `clock`.
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { ids, clock }
    }

    /// Build a ledger entry stamped with the current time.
    pub fn ledger_entry(&self, amount: i64, reason: impl Into<String>) -> LedgerEntry {
        LedgerEntry {
            id: format!("tx-{}", self.ids.next_uuid().simple()),
            amount,
            reason: reason.into(),
            timestamp: self.clock.utc(),
        }
    }

    /// Post a signed amount to the ledger.
    ///
    /// Debits that would leave a negative balance are rejected and leave the
    /// ledger untouched.
    pub fn credit_points(
        &self,
        mut user: User,
        amount: i64,
        reason: impl Into<String>,
    ) -> Result<User, GamificationError> {
        if amount < 0 && user.points() + amount < 0 {
            return Err(GamificationError::InsufficientPoints {
                balance: user.points(),
                required: -amount,
            });
        }
        user.post(self.ledger_entry(amount, reason));
        Ok(user)
    }

    /// Unlock every badge whose rule now holds.
    ///
    /// Only reports filed by `user` count. Badges already earned are never
    /// reported again, so repeated evaluation with the same inputs unlocks
    /// nothing.
    pub fn evaluate_badges(&self, mut user: User, reports: &[Report]) -> BadgeEvaluation {
        let own: Vec<&Report> = reports
            .iter()
            .filter(|report| report.reporter_id() == user.id())
            .collect();
        let filed = own.len();
        let verified = own
            .iter()
            .filter(|report| report.status() == ReportStatus::Verified)
            .count();

        let mut unlocked = Vec::new();
        for badge in &BADGES {
            let satisfied = match badge.rule {
                BadgeRule::ReportsFiled(threshold) => filed >= threshold,
                BadgeRule::ReportsVerified(threshold) => verified >= threshold,
                BadgeRule::PointsReached(threshold) => user.points() >= threshold,
            };
            if satisfied && user.earn_badge(badge.id) {
                unlocked.push(badge);
            }
        }
        BadgeEvaluation { user, unlocked }
    }

    /// Spend points on a catalog reward.
    pub fn redeem_reward(&self, user: User, reward: &Reward) -> Result<User, GamificationError> {
        if user.has_redeemed(reward.id) {
            return Err(GamificationError::AlreadyRedeemed {
                reward_id: reward.id.to_owned(),
            });
        }
        if user.points() < reward.cost {
            return Err(GamificationError::InsufficientPoints {
                balance: user.points(),
                required: reward.cost,
            });
        }
        let mut user =
            self.credit_points(user, -reward.cost, format!("Reward redemption: {}", reward.title))?;
        user.record_redemption(reward.id);
        Ok(user)
    }
}

/// Rank among citizens: one plus the number with strictly more points.
///
/// # Examples
/// ```
/// use backend::domain::city_rank;
///
/// assert_eq!(city_rank(500, [900, 500, 100]), 2);
/// assert_eq!(city_rank(0, []), 1);
/// ```
pub fn city_rank(points: i64, others: impl IntoIterator<Item = i64>) -> u32 {
    let ahead = others.into_iter().filter(|other| *other > points).count();
    u32::try_from(ahead).map_or(u32::MAX, |ahead| ahead.saturating_add(1))
}

#[cfg(test)]
#[path = "gamification_tests.rs"]
mod tests;
