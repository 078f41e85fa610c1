//! Reward and badge catalogue handlers.
//!
//! ```text
//! GET /api/v1/rewards
//! POST /api/v1/rewards/r2/redemptions
//! GET /api/v1/badges
//! ```

use actix_web::{get, post, web};

use crate::domain::ports::{BadgeView, RewardView};
use crate::domain::{Error, ProfileView};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Reward catalogue annotated for the caller.
#[utoipa::path(
    get,
    path = "/api/v1/rewards",
    responses(
        (status = 200, description = "Rewards", body = [RewardView]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["rewards"],
    operation_id = "listRewards"
)]
#[get("/rewards")]
pub async fn list_rewards(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<RewardView>>> {
    let user_id = session.require_user_id()?;
    let rewards = state.citizens_query.rewards(&user_id).await?;
    Ok(web::Json(rewards))
}

/// Spend points on a reward. Each reward can be redeemed once.
#[utoipa::path(
    post,
    path = "/api/v1/rewards/{id}/redemptions",
    params(("id" = String, Path, description = "Reward identifier")),
    responses(
        (status = 200, description = "Redeemed", body = ProfileView),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown reward", body = Error),
        (status = 409, description = "Insufficient points or already redeemed", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["rewards"],
    operation_id = "redeemReward"
)]
#[post("/rewards/{id}/redemptions")]
pub async fn redeem_reward(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ProfileView>> {
    let user_id = session.require_user_id()?;
    let reward_id = path.into_inner();
    let view = state
        .citizens
        .redeem_reward(&user_id, reward_id.trim())
        .await?;
    Ok(web::Json(view))
}

/// Badge catalogue with the caller's earned flags.
#[utoipa::path(
    get,
    path = "/api/v1/badges",
    responses(
        (status = 200, description = "Badges", body = [BadgeView]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["rewards"],
    operation_id = "listBadges"
)]
#[get("/badges")]
pub async fn list_badges(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<BadgeView>>> {
    let user_id = session.require_user_id()?;
    let badges = state.citizens_query.badges(&user_id).await?;
    Ok(web::Json(badges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockCitizenCommand, MockCitizenQuery};
    use crate::domain::{CitizenState, ErrorCode, Role, User, UserId};
    use crate::inbound::http::test_utils::{api_app, json_body, login_cookie};
    use crate::test_support::CivicHarness;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use mockall::predicate::eq;
    use rstest::rstest;
    use std::sync::Arc;

    fn profile(email: &str) -> ProfileView {
        let user = User::new(UserId::for_email(email), "Asha", email, Role::Citizen, None);
        ProfileView::from(&CitizenState::new(user))
    }

    #[rstest]
    #[actix_web::test]
    async fn redemption_conflict_maps_to_409() {
        let harness = CivicHarness::new();
        let email = "mock@example.org";
        let mut commands = MockCitizenCommand::new();
        commands
            .expect_login()
            .times(1)
            .returning(move |_| Ok(profile(email)));
        commands
            .expect_redeem_reward()
            .withf(|_, reward| reward.to_string() == "r3")
            .times(1)
            .returning(|_, _| Err(Error::conflict("not enough points")));
        let mut state = harness.http_state();
        state.citizens = Arc::new(commands);
        let app = actix_test::init_service(api_app(state)).await;
        let cookie = login_cookie(&app, email, "CITIZEN").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/rewards/r3/redemptions")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert_eq!(body["code"], "conflict");
    }

    #[rstest]
    #[actix_web::test]
    async fn catalogue_reads_use_the_session_user() {
        let harness = CivicHarness::new();
        let email = "catalogue@example.org";
        let mut queries = MockCitizenQuery::new();
        queries
            .expect_badges()
            .with(eq(UserId::for_email(email)))
            .times(1)
            .returning(|_| Err(Error::unauthorized("profile not found")));
        let mut state = harness.http_state();
        state.citizens_query = Arc::new(queries);
        let app = actix_test::init_service(api_app(state)).await;
        let cookie = login_cookie(&app, email, "CITIZEN").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/badges")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await["code"],
            serde_json::to_value(ErrorCode::Unauthorized).expect("code")
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn rewards_list_flags_affordability() {
        let harness = CivicHarness::new();
        let app = actix_test::init_service(api_app(harness.http_state())).await;
        let cookie = login_cookie(&app, "poor@example.org", "CITIZEN").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/rewards")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let rewards = body.as_array().expect("reward list");
        assert!(!rewards.is_empty());
        assert!(rewards.iter().all(|reward| reward["affordable"] == false));
        assert!(rewards.iter().all(|reward| reward["redeemed"] == false));
    }
}
