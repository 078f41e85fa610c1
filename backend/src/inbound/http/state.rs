//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    CitizenCommand, CitizenQuery, ReportAssistant, ReportCommand, ReportQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub reports: Arc<dyn ReportCommand>,
    pub reports_query: Arc<dyn ReportQuery>,
    pub citizens: Arc<dyn CitizenCommand>,
    pub citizens_query: Arc<dyn CitizenQuery>,
    pub assistant: Arc<dyn ReportAssistant>,
}

impl HttpState {
    /// Construct state from explicit port implementations.
    ///
    /// A single service usually backs both halves of a command/query pair:
    ///
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use backend::domain::ports::{
    ///     CitizenCommand, CitizenQuery, ReportAssistant, ReportCommand, ReportQuery,
    /// };
    /// use backend::inbound::http::state::HttpState;
    ///
    /// fn wire<R, C, A>(reports: Arc<R>, citizens: Arc<C>, assistant: Arc<A>) -> HttpState
    /// where
    ///     R: ReportCommand + ReportQuery + 'static,
    ///     C: CitizenCommand + CitizenQuery + 'static,
    ///     A: ReportAssistant + 'static,
    /// {
    ///     HttpState::new(reports.clone(), reports, citizens.clone(), citizens, assistant)
    /// }
    /// ```
    pub fn new(
        reports: Arc<dyn ReportCommand>,
        reports_query: Arc<dyn ReportQuery>,
        citizens: Arc<dyn CitizenCommand>,
        citizens_query: Arc<dyn CitizenQuery>,
        assistant: Arc<dyn ReportAssistant>,
    ) -> Self {
        Self {
            reports,
            reports_query,
            citizens,
            citizens_query,
            assistant,
        }
    }
}
