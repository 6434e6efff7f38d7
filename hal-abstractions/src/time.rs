//! Monotonic time
//!
//! Millisecond-resolution instants and durations, the same `fugit` types
//! the RTIC monotonics hand out.

/// Milliseconds since boot
pub type Instant = fugit::TimerInstantU64<1_000>;

/// Millisecond duration
pub type Duration = fugit::MillisDurationU64;

/// Source of monotonic time
///
/// Must never go backwards. Takes `&self` so a single clock can be shared
/// by every component that needs to read it.
pub trait Clock {
    /// Current instant
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
