//! Port for identifier generation.
//!
//! Engines never reach for an ambient random source; they ask an injected
//! generator so tests can pin every identifier.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of fresh identifiers for notifications and ledger entries.
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator: Send + Sync {
    /// Produce the next identifier.
    fn next_uuid(&self) -> Uuid;
}

/// Random UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Counts upwards from one: `00000000-0000-0000-0000-000000000001`, ...
///
/// # Examples
/// ```
/// use backend::domain::ports::{IdGenerator, SequentialIdGenerator};
/// use uuid::Uuid;
///
/// let ids = SequentialIdGenerator::default();
/// assert_eq!(ids.next_uuid(), Uuid::from_u128(1));
/// assert_eq!(ids.next_uuid(), Uuid::from_u128(2));
/// ```
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    issued: AtomicU64,
}

impl IdGenerator for SequentialIdGenerator {
    fn next_uuid(&self) -> Uuid {
        let next = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(u128::from(next))
    }
}
