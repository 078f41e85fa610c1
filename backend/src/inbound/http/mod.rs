//! HTTP inbound adapter exposing REST endpoints.

pub mod admin;
pub mod assistant;
pub mod error;
pub mod health;
pub mod reports;
pub mod reports_dto;
pub mod rewards;
pub mod session;
pub mod sessions;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api/v1` handler on `cfg`.
///
/// The caller supplies the scope, the session middleware and
/// [`state::HttpState`]. `/reports/mine` is registered ahead of
/// `/reports/{id}` so the literal segment wins.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(sessions::login)
        .service(sessions::logout)
        .service(sessions::current_profile)
        .service(sessions::notifications)
        .service(sessions::mark_notifications_read)
        .service(rewards::list_rewards)
        .service(rewards::redeem_reward)
        .service(rewards::list_badges)
        .service(reports::submit_report)
        .service(reports::list_reports)
        .service(reports::my_reports)
        .service(reports::get_report)
        .service(reports::update_status)
        .service(reports::assign_worker)
        .service(reports::clusters)
        .service(admin::list_workers)
        .service(admin::board)
        .service(admin::analytics)
        .service(assistant::classify_image)
        .service(assistant::transcribe)
        .service(assistant::chat)
        .service(assistant::reverse_geocode);
}
