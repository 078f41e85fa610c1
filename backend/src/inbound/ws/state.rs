//! Shared WebSocket adapter state.
//!
//! The feed reads from the report cache only; it never touches the store.

use std::sync::Arc;

use url::Url;

use crate::domain::ReportCache;

const LOCALHOST: &str = "localhost";

/// Origins allowed to open the report feed.
///
/// Configured origins match on scheme, host and port. Plain HTTP from
/// `localhost` with a non-zero explicit port is accepted unless switched off.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: Arc<[url::Origin]>,
    allow_localhost: bool,
}

impl OriginPolicy {
    pub fn new<I, S>(origins: I) -> Result<Self, url::ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = origins
            .into_iter()
            .map(|raw| Url::parse(raw.as_ref()).map(|url| url.origin()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            allowed: allowed.into(),
            allow_localhost: true,
        })
    }

    #[must_use]
    pub fn without_localhost(mut self) -> Self {
        self.allow_localhost = false;
        self
    }

    pub fn allows(&self, origin: &Url) -> bool {
        if self.allow_localhost
            && origin.scheme() == "http"
            && origin.host_str() == Some(LOCALHOST)
        {
            return matches!(origin.port(), Some(port) if port != 0);
        }
        let candidate = origin.origin();
        candidate.is_tuple() && self.allowed.contains(&candidate)
    }
}

/// Dependency bundle for the report feed.
#[derive(Clone)]
pub struct WsState {
    pub cache: Arc<ReportCache>,
    pub origins: OriginPolicy,
}

impl WsState {
    pub fn new(cache: Arc<ReportCache>, origins: OriginPolicy) -> Self {
        Self { cache, origins }
    }
}
