//! Server construction and middleware wiring.

mod config;
mod session_key;
mod state_builders;

pub use config::{CivicSettings, ReportStoreKind, SettingsError};
pub use session_key::{BuildMode, SessionKeyError, SessionSettings, key_fingerprint, session_settings};
pub use state_builders::{AppServices, StartupError, build_services};

use std::net::SocketAddr;
use std::time::Duration;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;
use tracing::{info, warn};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::{ReportCache, ReportSync};
use crate::domain::ports::ReportGateway;
use crate::inbound::http::configure_api;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::HttpState;
use crate::inbound::ws;
use crate::inbound::ws::state::WsState;

/// Resolved inputs for [`create_server`].
pub struct ServerConfig {
    pub session: SessionSettings,
    pub bind_addr: SocketAddr,
    /// Request metrics middleware serving `/metrics`.
    #[cfg(feature = "metrics")]
    pub prometheus: PrometheusMetrics,
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
    session: SessionSettings,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
        session,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), session.key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(session.cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(session.same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(12)),
        )
        .build();

    let api = web::scope("/api/v1").wrap(session).configure(configure_api);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .wrap(Trace)
        .service(api)
        .service(ws::ws_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct the HTTP server and mark it started.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
    ws_state: WsState,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        session,
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;
    let server_health_state = health_state.clone();
    let http_state = web::Data::new(http_state);
    let ws_state = web::Data::new(ws_state);

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
            session: session.clone(),
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(prometheus.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    info!(%bind_addr, "http server listening");
    health_state.mark_ready();
    Ok(server)
}

/// Keep the report cache fed for the life of the process, resubscribing
/// `delay` after each time the feed stops.
pub async fn supervise_sync(sync: ReportSync<dyn ReportGateway>, delay: Duration) {
    loop {
        let end = sync.run().await;
        warn!(?end, delay_secs = delay.as_secs(), "report feed stopped; resubscribing");
        tokio::time::sleep(delay).await;
    }
}

/// Mark the service synced once the cache receives its next snapshot.
///
/// Subscribes before returning, so a snapshot applied after this call is
/// never missed.
pub fn await_first_snapshot(
    cache: &ReportCache,
    health_state: web::Data<HealthState>,
) -> impl Future<Output = ()> + use<> {
    let mut updates = cache.subscribe();
    async move {
        if updates.changed().await.is_ok() {
            info!("first report snapshot applied");
            health_state.mark_synced();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::domain::TRACE_ID_HEADER;
    use crate::inbound::ws::state::OriginPolicy;
    use crate::test_support::{CivicHarness, persisted_report};
    use crate::domain::{ReportStatus, UserId};
    use actix_web::cookie::{Key, SameSite};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::json;

    fn deps(harness: &CivicHarness, health: web::Data<HealthState>) -> AppDependencies {
        AppDependencies {
            health_state: health,
            http_state: web::Data::new(harness.http_state()),
            ws_state: web::Data::new(WsState::new(
                Arc::clone(&harness.cache),
                OriginPolicy::new(Vec::<String>::new()).expect("empty policy"),
            )),
            session: SessionSettings {
                key: Key::generate(),
                cookie_secure: false,
                same_site: SameSite::Lax,
            },
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn api_routes_are_mounted_behind_trace_and_session() {
        let harness = CivicHarness::new();
        let app = actix_test::init_service(build_app(deps(
            &harness,
            web::Data::new(HealthState::new()),
        )))
        .await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(json!({"name": "Asha", "email": "asha@example.org", "password": "pw"}))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(TRACE_ID_HEADER));
        let cookie = response
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie");
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[rstest]
    #[actix_web::test]
    async fn readiness_waits_for_the_first_snapshot() {
        let harness = CivicHarness::new();
        let health = web::Data::new(HealthState::new());
        health.mark_ready();
        let synced = await_first_snapshot(&harness.cache, health.clone());
        let app =
            actix_test::init_service(build_app(deps(&harness, health.clone()))).await;

        let before = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/health/ready").to_request(),
        )
        .await;
        assert_eq!(before.status(), StatusCode::SERVICE_UNAVAILABLE);

        harness.cache.apply(vec![persisted_report(
            &UserId::for_email("feed@example.org"),
            1,
            ReportStatus::New,
        )]);
        synced.await;

        let after = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/health/ready").to_request(),
        )
        .await;
        assert_eq!(after.status(), StatusCode::OK);
    }
}
