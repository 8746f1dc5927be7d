use chrono::{DateTime, Utc};

/// A port that provides the **current instant** for the application.
///
/// # Purpose
/// This trait abstracts access to "now" so that:
///
/// - Expiry logic (e.g. cached descriptor TTLs) does **not** depend on system time
/// - Implementations can be swapped (system clock, fixed clock, mock, etc.)
/// - Tests can be deterministic and time-independent
pub trait Clock: Send + Sync {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}
