//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **memory**: in-process report store and profile store for development
//!   and tests
//! - **file_profile_store**: one JSON document per citizen on local disk
//! - **firestore**: Firestore REST report gateway
//! - **gemini**: Gemini REST AI gateway
//!
//! Adapters translate between domain types and wire representations. They
//! contain no business logic.

pub mod file_profile_store;
pub mod firestore;
pub mod gemini;
pub mod memory;
