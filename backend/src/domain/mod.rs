//! Domain primitives, engines and services.
//!
//! Purpose: hold every civic-reporting rule in plain Rust values. Engines
//! ([`LifecycleEngine`], [`GamificationEngine`]) are pure: they take state
//! and return new state. Services sequence those engines with the driven
//! ports in [`ports`] and expose driving ports to inbound adapters.
//!
//! Public surface:
//! - Error, ErrorCode: transport-agnostic error payload.
//! - Report, ReportStatus, Department: the report aggregate and its labels.
//! - User, CitizenState: citizen profile and its stored envelope.
//! - ReportService, CitizenService, AssistantService: application services.

pub mod analytics;
pub mod assistant;
mod assistant_service;
pub mod catalog;
mod citizen;
mod citizen_service;
pub mod clustering;
pub mod error;
mod gamification;
mod lifecycle;
mod notifications;
pub mod ports;
mod profile_book;
pub mod report;
mod report_cache;
mod report_service;
pub(crate) mod service_errors;
mod trace_id;
pub mod user;
mod worker;

pub use self::analytics::{BoardColumn, DailyVolume, DepartmentPerformance, ReportSummary};
pub use self::assistant::{
    ChatContext, ChatReply, ImageClassification, LocationLink, MEDIA_MAX_BYTES, MediaKind,
    MediaPayload, MediaValidationError,
};
pub use self::assistant_service::{AssistantService, CHAT_MESSAGE_MAX};
pub use self::catalog::{BADGES, Badge, BadgeRule, REWARDS, Reward, RewardKind};
pub use self::citizen::{
    CitizenState, LoginCredentials, LoginValidationError, NAME_MAX, ProfileView,
};
pub use self::citizen_service::{CitizenService, WELCOME_REASON};
pub use self::clustering::{Cluster, DEFAULT_CLUSTER_THRESHOLD};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::gamification::{
    BadgeEvaluation, DISPATCH_REWARD, GamificationEngine, GamificationError,
    VERIFICATION_REWARD, city_rank,
};
pub use self::lifecycle::{Dispatch, GENESIS_NOTE, LifecycleEngine, LifecycleError, Transition};
pub use self::notifications::{
    NOTIFICATION_CAPACITY, Notification, NotificationCenter, NotificationEvent,
    NotificationKind,
};
pub use self::profile_book::{Notifier, ProfileBook};
pub use self::report::{
    DESCRIPTION_MAX, Department, GeoPoint, IMAGE_MAX, INITIAL_IMPACT_SCORE, Location, NewReport,
    Priority, Report, ReportId, ReportPatch, ReportRecord, ReportStatus, ReportValidationError,
    StatusHistoryEntry, StoreId, TITLE_MAX, UNCLASSIFIED_ISSUE, UnknownLabel, ValidatedReport,
};
pub use self::report_cache::{ReportCache, ReportSync, Snapshot, SyncEnd};
pub use self::report_service::{ReportService, TREND_DAYS};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    LedgerEntry, POINTS_PER_LEVEL, Role, User, UserId, UserRecord, UserValidationError,
    level_for_points, points_to_next_level,
};
pub use self::worker::{EmptyWorkerId, Roster, Worker, WorkerId, WorkerStatus};

