//! Test utilities for the backend crate.
//!
//! Shared by unit tests in `src/` and integration tests in `tests/`. Only
//! compiled for tests or with the `test-support` feature.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::{
    AiGateway, DisabledAiGateway, IdGenerator, ReportAssistant, SequentialIdGenerator,
};
use crate::domain::{
    AssistantService, CitizenService, Department, GeoPoint, NewReport, ProfileBook, Report,
    ReportCache, ReportId, ReportService, ReportStatus, StoreId, UserId,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::{InMemoryProfileStore, InMemoryReportGateway};

/// Timestamp every deterministic test starts from.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).single() {
        Some(now) => now,
        None => panic!("fixture timestamp must be valid"),
    }
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_days(&self, days: i64) {
        *self.lock_clock() += TimeDelta::days(days);
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Valid citizen input for a report at the given coordinates.
pub fn report_input(title: &str, lat: f64, lng: f64) -> NewReport {
    let location = match GeoPoint::new(lat, lng) {
        Ok(point) => point,
        Err(err) => panic!("fixture coordinates must be valid: {err}"),
    };
    NewReport {
        title: title.to_owned(),
        description: format!("{title} reported by a resident"),
        category: Some(Department::Roads),
        issue_type: Some("Pothole".to_owned()),
        location: Some(location),
        address: Some("Market Road".to_owned()),
        image: None,
    }
}

/// Report as the store would deliver it: store id `doc-{n}`, id derived from
/// `n`, and a history walking straight from `NEW` to `status`.
pub fn persisted_report(reporter: &UserId, n: u128, status: ReportStatus) -> Report {
    let fields = match report_input(&format!("Issue {n}"), 12.97, 77.59).validate() {
        Ok(fields) => fields,
        Err(err) => panic!("fixture input must validate: {err}"),
    };
    let store_id = match StoreId::new(format!("doc-{n}")) {
        Ok(id) => id,
        Err(err) => panic!("fixture store id must be valid: {err}"),
    };
    let mut report = Report::open(
        ReportId::from_uuid(&Uuid::from_u128(n)),
        fields,
        reporter.clone(),
        fixed_now(),
        "opened",
    )
    .with_store_id(store_id);
    if status != ReportStatus::New {
        report.record_status(status, format!("moved to {status}"), fixed_now());
    }
    report
}

/// Every service wired over the in-memory adapters, sharing one cache and
/// one profile book the way the server does.
pub struct CivicHarness {
    pub reports: Arc<ReportService<InMemoryReportGateway, InMemoryProfileStore>>,
    pub citizens: Arc<CitizenService<InMemoryProfileStore>>,
    pub profiles: Arc<ProfileBook<InMemoryProfileStore>>,
    pub gateway: Arc<InMemoryReportGateway>,
    pub store: Arc<InMemoryProfileStore>,
    pub cache: Arc<ReportCache>,
    pub clock: Arc<MutableClock>,
}

impl Default for CivicHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl CivicHarness {
    pub fn new() -> Self {
        let ids: Arc<dyn IdGenerator> = Arc::new(SequentialIdGenerator::default());
        let clock = Arc::new(MutableClock::new(fixed_now()));
        let gateway = Arc::new(InMemoryReportGateway::new(Arc::clone(&ids)));
        let store = Arc::new(InMemoryProfileStore::default());
        let cache = Arc::new(ReportCache::new());
        let profiles = Arc::new(ProfileBook::new(
            Arc::clone(&store),
            Arc::clone(&ids),
            clock.clone(),
        ));
        let reports = Arc::new(ReportService::new(
            Arc::clone(&gateway),
            Arc::clone(&cache),
            Arc::clone(&profiles),
            Arc::clone(&ids),
            clock.clone(),
        ));
        let citizens = Arc::new(CitizenService::new(
            Arc::clone(&profiles),
            Arc::clone(&cache),
            ids,
            clock.clone(),
        ));
        Self {
            reports,
            citizens,
            profiles,
            gateway,
            store,
            cache,
            clock,
        }
    }

    /// Deliver the store's current contents to the cache, as the sync task
    /// would.
    pub fn sync(&self) {
        self.cache.apply(self.gateway.reports());
    }

    /// Assistant over `gateway`, sharing this harness's profiles and cache.
    pub fn assistant<A>(&self, gateway: Arc<A>) -> Arc<AssistantService<A, InMemoryProfileStore>>
    where
        A: AiGateway + ?Sized,
    {
        Arc::new(AssistantService::new(
            gateway,
            Arc::clone(&self.profiles),
            Arc::clone(&self.cache),
        ))
    }

    /// HTTP state with the AI service switched off.
    pub fn http_state(&self) -> HttpState {
        self.http_state_with_assistant(self.assistant(Arc::new(DisabledAiGateway)))
    }

    pub fn http_state_with_assistant(&self, assistant: Arc<dyn ReportAssistant>) -> HttpState {
        HttpState::new(
            self.reports.clone(),
            self.reports.clone(),
            self.citizens.clone(),
            self.citizens.clone(),
            assistant,
        )
    }
}
