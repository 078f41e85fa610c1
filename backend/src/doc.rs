//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST path, the report and profile schemas and
//! the session cookie security scheme. It backs Swagger UI in debug builds
//! and `cargo run --bin openapi-dump`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{AnalyticsOverview, BadgeView, NotificationFeed, RewardView};
use crate::domain::{
    ChatReply, Department, Error, ErrorCode, ImageClassification, Notification, ProfileView,
    ReportRecord, ReportStatus, Role, StatusHistoryEntry, Worker,
};
use crate::inbound::http::assistant::{
    ChatRequest, ClassificationResponse, GeocodeResponse, MediaRequest, TranscriptionResponse,
};
use crate::inbound::http::reports_dto::{
    BoardColumnDto, ClusterDto, NewReportRequest, StatusUpdateRequest, SubmittedReportResponse,
    WorkerAssignmentRequest,
};
use crate::inbound::http::sessions::LoginRequest;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Civic Pulse backend API",
        description = "Citizen issue reporting, dispatch and rewards.",
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::sessions::login,
        crate::inbound::http::sessions::logout,
        crate::inbound::http::sessions::current_profile,
        crate::inbound::http::sessions::notifications,
        crate::inbound::http::sessions::mark_notifications_read,
        crate::inbound::http::rewards::list_rewards,
        crate::inbound::http::rewards::redeem_reward,
        crate::inbound::http::rewards::list_badges,
        crate::inbound::http::reports::submit_report,
        crate::inbound::http::reports::list_reports,
        crate::inbound::http::reports::my_reports,
        crate::inbound::http::reports::get_report,
        crate::inbound::http::reports::update_status,
        crate::inbound::http::reports::assign_worker,
        crate::inbound::http::reports::clusters,
        crate::inbound::http::admin::list_workers,
        crate::inbound::http::admin::board,
        crate::inbound::http::admin::analytics,
        crate::inbound::http::assistant::classify_image,
        crate::inbound::http::assistant::transcribe,
        crate::inbound::http::assistant::chat,
        crate::inbound::http::assistant::reverse_geocode,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        ReportRecord,
        StatusHistoryEntry,
        ReportStatus,
        Department,
        Role,
        ProfileView,
        Notification,
        NotificationFeed,
        RewardView,
        BadgeView,
        Worker,
        AnalyticsOverview,
        ImageClassification,
        ChatReply,
        LoginRequest,
        NewReportRequest,
        SubmittedReportResponse,
        StatusUpdateRequest,
        WorkerAssignmentRequest,
        ClusterDto,
        BoardColumnDto,
        MediaRequest,
        ClassificationResponse,
        TranscriptionResponse,
        ChatRequest,
        GeocodeResponse,
    )),
    tags(
        (name = "sessions", description = "Sign-in, profile and notifications"),
        (name = "rewards", description = "Reward catalog, redemption and badges"),
        (name = "reports", description = "Filing, tracking and moving reports"),
        (name = "admin", description = "Command-centre views for administrators"),
        (name = "assistant", description = "AI help for filing reports"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn schema_fields(name: &str) -> Vec<String> {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        match components.schemas.get(name) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
            Some(_) => panic!("{name} is not an inline object schema"),
            None => panic!("no schema registered for {name}"),
        }
    }

    #[rstest]
    #[case("Error", &["code", "message"])]
    #[case("Report", &["id", "status", "statusHistory", "location", "category"])]
    #[case("StatusHistoryEntry", &["status", "timestamp", "note"])]
    #[case("Worker", &["id", "department", "status"])]
    fn schemas_expose_wire_fields(#[case] name: &str, #[case] fields: &[&str]) {
        let available = schema_fields(name);
        for field in fields {
            assert!(
                available.iter().any(|candidate| candidate == field),
                "{name} should expose {field}, has {available:?}"
            );
        }
    }

    #[rstest]
    #[case("/api/v1/login")]
    #[case("/api/v1/reports/{id}/status")]
    #[case("/api/v1/admin/analytics")]
    #[case("/api/v1/assistant/geocode")]
    #[case("/health/ready")]
    fn paths_are_registered(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }
}
