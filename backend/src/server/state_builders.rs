//! Wiring of adapters and services from [`CivicSettings`].

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::info;

use crate::domain::ports::{
    AiGateway, DisabledAiGateway, IdGenerator, ProfileStore, RandomIdGenerator, ReportGateway,
};
use crate::domain::{
    AssistantService, CitizenService, ProfileBook, ReportCache, ReportService, ReportSync,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::ws::state::{OriginPolicy, WsState};
use crate::outbound::file_profile_store::FileProfileStore;
use crate::outbound::firestore::FirestoreReportGateway;
use crate::outbound::gemini::GeminiAiGateway;
use crate::outbound::memory::{InMemoryProfileStore, InMemoryReportGateway};

use super::config::{CivicSettings, ReportStoreKind, SettingsError};

/// Failures while assembling the application.
#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("report store could not be initialised: {0}")]
    ReportStore(String),
    #[error("profile store could not be opened: {0}")]
    ProfileStore(String),
    #[error("ai client could not be built: {0}")]
    AiGateway(String),
    #[error("invalid websocket origin: {0}")]
    Origin(#[from] url::ParseError),
}

/// Everything the server needs once configuration is resolved.
pub struct AppServices {
    pub http: HttpState,
    pub ws: WsState,
    /// Feeds store snapshots into the shared cache.
    pub sync: ReportSync<dyn ReportGateway>,
}

fn report_gateway(
    settings: &CivicSettings,
    ids: Arc<dyn IdGenerator>,
) -> Result<Arc<dyn ReportGateway>, StartupError> {
    match settings.report_store()? {
        ReportStoreKind::Memory => {
            info!("using in-memory report store");
            Ok(Arc::new(InMemoryReportGateway::new(ids)))
        }
        ReportStoreKind::Firestore => {
            let config = settings.firestore_config()?;
            info!(project = %config.project_id, "using firestore report store");
            let gateway = FirestoreReportGateway::new(config)
                .map_err(|err| StartupError::ReportStore(err.to_string()))?;
            Ok(Arc::new(gateway))
        }
    }
}

fn profile_store(settings: &CivicSettings) -> Result<Arc<dyn ProfileStore>, StartupError> {
    match settings.profile_dir() {
        Some(dir) => {
            let store = FileProfileStore::open(&dir)
                .map_err(|err| StartupError::ProfileStore(err.to_string()))?;
            info!(path = %dir, "using file profile store");
            Ok(Arc::new(store))
        }
        None => {
            info!("using in-memory profile store");
            Ok(Arc::new(InMemoryProfileStore::default()))
        }
    }
}

fn ai_gateway(settings: &CivicSettings) -> Result<Arc<dyn AiGateway>, StartupError> {
    match settings.gemini_config()? {
        Some(config) => {
            info!(model = %config.chat_model, "gemini assistant enabled");
            let gateway =
                GeminiAiGateway::new(config).map_err(|err| StartupError::AiGateway(err.to_string()))?;
            Ok(Arc::new(gateway))
        }
        None => {
            info!("no gemini api key configured; assistant disabled");
            Ok(Arc::new(DisabledAiGateway))
        }
    }
}

/// Build the services, sharing one cache and one profile book.
///
/// # Errors
///
/// Returns [`StartupError`] when a setting is invalid or an adapter cannot
/// be constructed.
pub fn build_services(settings: &CivicSettings) -> Result<AppServices, StartupError> {
    let ids: Arc<dyn IdGenerator> = Arc::new(RandomIdGenerator);
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let cache = Arc::new(ReportCache::new());
    let gateway = report_gateway(settings, Arc::clone(&ids))?;
    let profiles = Arc::new(ProfileBook::new(
        profile_store(settings)?,
        Arc::clone(&ids),
        Arc::clone(&clock),
    ));

    let reports = Arc::new(
        ReportService::new(
            Arc::clone(&gateway),
            Arc::clone(&cache),
            Arc::clone(&profiles),
            Arc::clone(&ids),
            Arc::clone(&clock),
        )
        .with_cluster_threshold(settings.cluster_threshold()?),
    );
    let citizens = Arc::new(
        CitizenService::new(Arc::clone(&profiles), Arc::clone(&cache), ids, clock)
            .with_welcome_points(settings.welcome_points()?),
    );
    let assistant = Arc::new(AssistantService::new(
        ai_gateway(settings)?,
        profiles,
        Arc::clone(&cache),
    ));

    let http = HttpState::new(
        reports.clone(),
        reports,
        citizens.clone(),
        citizens,
        assistant,
    );
    let ws = WsState::new(
        Arc::clone(&cache),
        OriginPolicy::new(settings.ws_origins())?,
    );
    let sync = ReportSync::new(gateway, cache);
    Ok(AppServices { http, ws, sync })
}
