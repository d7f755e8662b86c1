//! Monotonic time source
//!
//! Timestamps are `u32` milliseconds that wrap after ~49 days. Callers
//! compare them with [`elapsed_ms`] so the wrap is harmless.

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed epoch
    fn now_ms(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Milliseconds from `since` to `now`, tolerant of counter wrap
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Check whether `deadline` has been reached at `now`
///
/// Deadlines further than half the counter range in the past are treated
/// as in the future, which is what keeps the wrap harmless.
pub fn deadline_reached(now: u32, deadline: u32) -> bool {
    now.wrapping_sub(deadline) < u32::MAX / 2
}
