//! Citizen profiles and the point ledger.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Points needed per level.
pub const POINTS_PER_LEVEL: i64 = 250;

/// Namespace for identifiers derived from login emails.
const USER_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_0e6a_3c1d_4f5e_9a2b_7c8d_9e0f_1a2b);

/// Validation errors returned when building users and user ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    LedgerMismatch { points: i64, ledger_total: i64 },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::LedgerMismatch {
                points,
                ledger_total,
            } => write!(
                f,
                "point balance {points} does not match ledger total {ledger_total}"
            ),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    /// Derive the identifier for a login email.
    ///
    /// The same address always yields the same id, so a returning citizen
    /// resumes their stored profile.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::UserId;
    ///
    /// let a = UserId::for_email("Ada@Example.org");
    /// let b = UserId::for_email(" ada@example.org ");
    /// assert_eq!(a, b);
    /// ```
    pub fn for_email(email: &str) -> Self {
        let normalised = email.trim().to_lowercase();
        Self::from_uuid(Uuid::new_v5(&USER_NAMESPACE, normalised.as_bytes()))
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Role of a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Citizen,
    Admin,
    Worker,
}

/// One signed point adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    pub amount: i64,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Level reached at a point balance.
///
/// # Examples
/// ```
/// use backend::domain::level_for_points;
///
/// assert_eq!(level_for_points(249), 1);
/// assert_eq!(level_for_points(250), 2);
/// assert_eq!(level_for_points(1_000), 5);
/// ```
pub fn level_for_points(points: i64) -> i64 {
    points.div_euclid(POINTS_PER_LEVEL) + 1
}

/// Points still needed to reach the next level.
pub fn points_to_next_level(points: i64) -> i64 {
    POINTS_PER_LEVEL - points.rem_euclid(POINTS_PER_LEVEL)
}

/// A signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UserRecord", into = "UserRecord")]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    role: Role,
    points: i64,
    city_rank: u32,
    earned_badge_ids: Vec<String>,
    redeemed_reward_ids: Vec<String>,
    point_history: Vec<LedgerEntry>,
}

impl User {
    /// Create a profile, recording a non-zero starting balance in the ledger
    /// so the balance always equals the ledger total.
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        opening: Option<LedgerEntry>,
    ) -> Self {
        let point_history: Vec<LedgerEntry> = opening.into_iter().collect();
        Self {
            id,
            name: name.into(),
            email: email.into(),
            role,
            points: point_history.iter().map(|entry| entry.amount).sum(),
            city_rank: 0,
            earned_badge_ids: Vec::new(),
            redeemed_reward_ids: Vec::new(),
            point_history,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// First word of the display name, used in greetings.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(self.name.as_str())
    }

    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn points(&self) -> i64 {
        self.points
    }

    /// Derived from the balance; never stored.
    pub fn level(&self) -> i64 {
        level_for_points(self.points)
    }

    /// Position among citizens by points; zero until ranked.
    pub fn city_rank(&self) -> u32 {
        self.city_rank
    }

    /// Badge ids in unlock order.
    pub fn earned_badge_ids(&self) -> &[String] {
        &self.earned_badge_ids
    }

    pub fn has_badge(&self, id: &str) -> bool {
        self.earned_badge_ids.iter().any(|earned| earned == id)
    }

    pub fn redeemed_reward_ids(&self) -> &[String] {
        &self.redeemed_reward_ids
    }

    pub fn has_redeemed(&self, id: &str) -> bool {
        self.redeemed_reward_ids.iter().any(|redeemed| redeemed == id)
    }

    pub fn point_history(&self) -> &[LedgerEntry] {
        &self.point_history
    }

    pub(crate) fn post(&mut self, entry: LedgerEntry) {
        self.points += entry.amount;
        self.point_history.push(entry);
    }

    /// Returns `false` when the badge was already earned.
    pub(crate) fn earn_badge(&mut self, id: &str) -> bool {
        if self.has_badge(id) {
            return false;
        }
        self.earned_badge_ids.push(id.to_owned());
        true
    }

    pub(crate) fn record_redemption(&mut self, id: &str) {
        if !self.has_redeemed(id) {
            self.redeemed_reward_ids.push(id.to_owned());
        }
    }

    pub(crate) fn set_city_rank(&mut self, rank: u32) {
        self.city_rank = rank;
    }
}

/// Serialised profile, including the derived level for clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = User)]
pub struct UserRecord {
    #[schema(value_type = String, format = Uuid)]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub points: i64,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub city_rank: u32,
    #[serde(default)]
    pub earned_badge_ids: Vec<String>,
    #[serde(default)]
    pub redeemed_reward_ids: Vec<String>,
    #[serde(default)]
    pub point_history: Vec<LedgerEntry>,
}

impl From<User> for UserRecord {
    fn from(value: User) -> Self {
        let level = value.level();
        Self {
            id: value.id.into(),
            name: value.name,
            email: value.email,
            role: value.role,
            points: value.points,
            level,
            city_rank: value.city_rank,
            earned_badge_ids: value.earned_badge_ids,
            redeemed_reward_ids: value.redeemed_reward_ids,
            point_history: value.point_history,
        }
    }
}

impl TryFrom<UserRecord> for User {
    type Error = UserValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let ledger_total: i64 = value.point_history.iter().map(|entry| entry.amount).sum();
        if ledger_total != value.points {
            return Err(UserValidationError::LedgerMismatch {
                points: value.points,
                ledger_total,
            });
        }
        let mut earned_badge_ids = value.earned_badge_ids;
        dedup_in_order(&mut earned_badge_ids);
        let mut redeemed_reward_ids = value.redeemed_reward_ids;
        dedup_in_order(&mut redeemed_reward_ids);

        Ok(Self {
            id: UserId::try_from(value.id)?,
            name: value.name,
            email: value.email,
            role: value.role,
            points: value.points,
            city_rank: value.city_rank,
            earned_badge_ids,
            redeemed_reward_ids,
            point_history: value.point_history,
        })
    }
}

fn dedup_in_order(ids: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
}
