//! Backend entry-point: loads settings, starts the report feed and serves
//! the REST API, WebSocket feed and OpenAPI docs.

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
use actix_web::web;
use color_eyre::eyre::Context as _;
#[cfg(feature = "metrics")]
use color_eyre::eyre::eyre;
use ortho_config::OrthoConfig as _;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::server::{
    AppServices, BuildMode, CivicSettings, ServerConfig, await_first_snapshot, build_services,
    create_server, key_fingerprint, session_settings, supervise_sync,
};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = fmt().with_env_filter(filter).json().try_init() {
        warn!(error = %e, "tracing init failed");
    }

    let settings = CivicSettings::load_from_iter(std::env::args_os())
        .wrap_err("failed to load configuration")?;
    let session = session_settings(&settings, BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        "session signing key loaded"
    );
    let bind_addr = settings.bind_addr()?;
    let AppServices { http, ws, sync } =
        build_services(&settings).wrap_err("failed to assemble services")?;

    let health_state = web::Data::new(HealthState::new());
    actix_web::rt::spawn(await_first_snapshot(&ws.cache, health_state.clone()));
    actix_web::rt::spawn(supervise_sync(sync, settings.resubscribe_delay()));

    let config = ServerConfig {
        session,
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus: PrometheusMetricsBuilder::new("civic")
            .endpoint("/metrics")
            .build()
            .map_err(|err| eyre!("failed to configure Prometheus metrics: {err}"))?,
    };
    let server = create_server(health_state.clone(), http, ws, config)?;
    let outcome = server.await;
    health_state.mark_unhealthy();
    outcome.wrap_err("http server stopped with an error")
}
