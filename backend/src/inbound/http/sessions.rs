//! Citizen session handlers.
//!
//! ```text
//! POST /api/v1/login {"name":"Asha","email":"asha@example.org","password":"pw"}
//! POST /api/v1/logout
//! GET /api/v1/me
//! GET /api/v1/me/notifications
//! POST /api/v1/me/notifications/read
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::ports::NotificationFeed;
use crate::domain::service_errors::login_invalid;
use crate::domain::{Error, LoginCredentials, ProfileView, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/v1/login`.
///
/// There is no credential store: any non-blank password is accepted and the
/// email selects the profile.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = Error;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::new(
            &value.name,
            &value.email,
            &value.password,
            value.role.unwrap_or(Role::Citizen),
        )
        .map_err(login_invalid)
    }
}

/// Resume or create a profile and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = ProfileView,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Profile store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<ProfileView>> {
    let credentials = LoginCredentials::try_from(payload.into_inner())?;
    let view = state.citizens.login(&credentials).await?;
    let user_id = credentials.user_id();
    session.persist_user(&user_id, view.user.role)?;
    info!(user_id = %user_id, role = ?view.user.role, "session established");
    Ok(web::Json(view))
}

/// End the session. Succeeds without a session too.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses(
        (status = 204, description = "Signed out"),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    if let Some(user_id) = session.user_id()? {
        state.citizens.logout(&user_id).await?;
    }
    session.purge();
    Ok(HttpResponse::NoContent().finish())
}

/// Signed-in citizen's profile with level progress and city rank.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Profile", body = ProfileView),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "currentProfile"
)]
#[get("/me")]
pub async fn current_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ProfileView>> {
    let user_id = session.require_user_id()?;
    let view = state.citizens_query.profile(&user_id).await?;
    Ok(web::Json(view))
}

/// Notification feed, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/me/notifications",
    responses(
        (status = 200, description = "Notifications", body = NotificationFeed),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "listNotifications"
)]
#[get("/me/notifications")]
pub async fn notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<NotificationFeed>> {
    let user_id = session.require_user_id()?;
    let feed = state.citizens_query.notifications(&user_id).await?;
    Ok(web::Json(feed))
}

/// Mark every notification read.
#[utoipa::path(
    post,
    path = "/api/v1/me/notifications/read",
    responses(
        (status = 204, description = "Marked read"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "markNotificationsRead"
)]
#[post("/me/notifications/read")]
pub async fn mark_notifications_read(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    state.citizens.mark_notifications_read(&user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
