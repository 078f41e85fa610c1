//! Correlation id carried through one request.
//!
//! The [`crate::middleware::Trace`] middleware opens a task-local scope for
//! every request; anything running inside it, including domain error
//! constructors, can read the id back with [`TraceId::current`]. Task locals
//! do not follow `tokio::spawn`, so spawned work must re-enter the scope.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use uuid::Uuid;

tokio::task_local! {
    static CURRENT: TraceId;
}

/// Request and response header holding the trace id.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// UUID naming a single request in logs and error bodies.
///
/// ```
/// use backend::TraceId;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let id: TraceId = "7d1c2a4e-4d8e-4f5e-9a51-2b1f8e0c9d11".parse().unwrap();
/// let seen = TraceId::scope(id, async { TraceId::current() }).await;
/// assert_eq!(seen, Some(id));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Fresh random id for requests that arrive without one.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Id of the enclosing request, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Runs `fut` with `id` as the current trace id.
    pub async fn scope<F: Future>(id: Self, fut: F) -> F::Output {
        CURRENT.scope(id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn spawned_tasks_only_see_the_id_when_rescoped() {
        let id = TraceId::generate();
        let (lost, kept) = TraceId::scope(id, async move {
            let lost = tokio::spawn(async { TraceId::current() }).await.expect("join");
            let kept = tokio::spawn(TraceId::scope(id, async { TraceId::current() }))
                .await
                .expect("join");
            (lost, kept)
        })
        .await;
        assert_eq!(lost, None);
        assert_eq!(kept, Some(id));
    }

    #[rstest]
    fn no_id_outside_a_request() {
        assert!(TraceId::current().is_none());
    }

    #[rstest]
    #[case("not-a-uuid")]
    #[case("")]
    fn rejects_malformed_header_values(#[case] raw: &str) {
        assert!(raw.parse::<TraceId>().is_err());
    }
}
