//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`ReportGateway`], [`ProfileStore`], [`AiGateway`],
//! [`IdGenerator`]) are implemented by outbound adapters. Driving ports
//! ([`ReportCommand`], [`ReportQuery`], [`CitizenCommand`],
//! [`CitizenQuery`], [`ReportAssistant`]) are implemented by domain services
//! and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod ai_gateway;
mod citizen_command;
mod citizen_query;
mod id_generator;
mod profile_store;
mod report_assistant;
mod report_command;
mod report_gateway;
mod report_query;

#[cfg(test)]
pub use ai_gateway::MockAiGateway;
pub use ai_gateway::{AiGateway, AiGatewayError, DisabledAiGateway};
#[cfg(test)]
pub use citizen_command::MockCitizenCommand;
pub use citizen_command::CitizenCommand;
#[cfg(test)]
pub use citizen_query::MockCitizenQuery;
pub use citizen_query::{BadgeView, CitizenQuery, NotificationFeed, RewardView};
#[cfg(test)]
pub use id_generator::MockIdGenerator;
pub use id_generator::{IdGenerator, RandomIdGenerator, SequentialIdGenerator};
#[cfg(test)]
pub use profile_store::MockProfileStore;
pub use profile_store::{ProfileStore, ProfileStoreError};
#[cfg(test)]
pub use report_assistant::MockReportAssistant;
pub use report_assistant::ReportAssistant;
#[cfg(test)]
pub use report_command::MockReportCommand;
pub use report_command::{ReportCommand, SubmittedReport};
#[cfg(test)]
pub use report_gateway::MockReportGateway;
pub use report_gateway::{
    FixtureReportGateway, ReportGateway, ReportGatewayError, ReportSnapshot, SnapshotStream,
};
#[cfg(test)]
pub use report_query::MockReportQuery;
pub use report_query::{AnalyticsOverview, ReportQuery, WorkerFilter};
