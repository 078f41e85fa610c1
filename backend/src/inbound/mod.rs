//! Adapters that turn outside traffic into service calls.
//!
//! [`http`] serves the JSON API under `/api/v1` plus the health probes;
//! [`ws`] pushes report snapshots to dashboards.

pub mod http;
pub mod ws;
