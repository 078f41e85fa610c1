//! In-process adapters used by tests and the `memory` store backend.

mod profile_store;
mod report_store;

pub use profile_store::InMemoryProfileStore;
pub use report_store::InMemoryReportGateway;
