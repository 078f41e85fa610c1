//! Per-user session state and login input.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{NotificationCenter, Role, User, UserId, UserRecord, points_to_next_level};

/// Everything kept for one user between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitizenState {
    pub user: User,
    #[serde(default)]
    pub notifications: NotificationCenter,
}

impl CitizenState {
    pub fn new(user: User) -> Self {
        Self {
            user,
            notifications: NotificationCenter::default(),
        }
    }
}

/// Profile as shown to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: UserRecord,
    pub points_to_next_level: i64,
    pub unread_notifications: usize,
}

impl From<&CitizenState> for ProfileView {
    fn from(state: &CitizenState) -> Self {
        Self {
            points_to_next_level: points_to_next_level(state.user.points()),
            unread_notifications: state.notifications.unread_count(),
            user: UserRecord::from(state.user.clone()),
        }
    }
}

/// Maximum display name length in characters.
pub const NAME_MAX: usize = 64;

/// Reasons login input is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    EmptyName,
    NameTooLong { max: usize },
    InvalidEmail,
    EmptyPassword,
}

impl LoginValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyName | Self::NameTooLong { .. } => "name",
            Self::InvalidEmail => "email",
            Self::EmptyPassword => "password",
        }
    }
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email address is not valid"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Validated login input.
///
/// There is no credential store: the password only has to be present, and
/// the email determines which stored profile is resumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    name: String,
    email: String,
    role: Role,
}

impl LoginCredentials {
    /// # Examples
    /// ```
    /// use backend::domain::{LoginCredentials, Role};
    ///
    /// let creds = LoginCredentials::new(" Ada ", "ada@example.org", "secret", Role::Citizen)
    ///     .expect("valid login");
    /// assert_eq!(creds.name(), "Ada");
    /// assert!(LoginCredentials::new("Ada", "nope", "secret", Role::Citizen).is_err());
    /// ```
    pub fn new(
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Self, LoginValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LoginValidationError::EmptyName);
        }
        if name.chars().count() > NAME_MAX {
            return Err(LoginValidationError::NameTooLong { max: NAME_MAX });
        }
        let email = email.trim().to_lowercase();
        if !email_regex().is_match(&email) {
            return Err(LoginValidationError::InvalidEmail);
        }
        if password.trim().is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            name: name.to_owned(),
            email,
            role,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn user_id(&self) -> UserId {
        UserId::for_email(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "a@b.co", "pw", LoginValidationError::EmptyName)]
    #[case("Ada", "a@b", "pw", LoginValidationError::InvalidEmail)]
    #[case("Ada", "a b@c.de", "pw", LoginValidationError::InvalidEmail)]
    #[case("Ada", "a@b.co", "  ", LoginValidationError::EmptyPassword)]
    fn rejects_bad_input(
        #[case] name: &str,
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::new(name, email, password, Role::Citizen)
            .expect_err("invalid input");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn email_is_normalised_before_deriving_id() {
        let a = LoginCredentials::new("Ada", "ADA@Example.org", "pw", Role::Citizen)
            .expect("valid");
        let b = LoginCredentials::new("Ada", "ada@example.org", "pw", Role::Admin)
            .expect("valid");
        assert_eq!(a.user_id(), b.user_id());
        assert_eq!(a.email(), "ada@example.org");
    }
}
