//! Civic Pulse backend: citizen issue reporting, dispatch and rewards.
//!
//! Layout follows ports and adapters: [`domain`] holds entities, engines,
//! services and port traits; [`inbound`] exposes them over HTTP and
//! WebSocket; [`outbound`] implements the ports against Firestore, Gemini,
//! local disk and process memory; [`server`] wires it together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
