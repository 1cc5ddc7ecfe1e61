//! # System Time
//!
//! The free-running tick counter that drives all due-time decisions.
//!
//! The counter is advanced exactly once per tick period by [`tick`],
//! which the port layer calls from its timer interrupt (SysTick on
//! Cortex-M). It wraps at the full `u32` range; all consumers compare
//! times with [`elapsed`], whose wraparound-safe unsigned subtraction
//! is correct as long as the real elapsed time never exceeds one full
//! counter period.
//!
//! The counter is the only state shared between interrupt context and
//! the scheduler's thread of control. There is a single writer (the
//! tick interrupt), so a plain atomic load/store pair is sufficient —
//! no read-modify-write cycle and no critical section.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::MICROS_PER_TICK;

/// Elapsed time unit. One tick per timer interrupt (~1 ms at the
/// default [`TICK_HZ`](crate::config::TICK_HZ)).
pub type Tick = u32;

/// The system tick counter. Written only by [`tick`].
static SYSTEM_TICKS: AtomicU32 = AtomicU32::new(0);

/// Advance the system time by one tick.
///
/// Call this from the timer interrupt handler, and from nowhere else.
#[inline]
pub fn tick() {
    let t = SYSTEM_TICKS.load(Ordering::Relaxed);
    SYSTEM_TICKS.store(t.wrapping_add(1), Ordering::Relaxed);
}

/// Current system time in ticks.
#[inline]
pub fn now() -> Tick {
    SYSTEM_TICKS.load(Ordering::Relaxed)
}

/// Ticks elapsed between `since` and `now`.
///
/// Wraparound-safe: the difference is correct as long as the real
/// elapsed time is shorter than one full counter period.
#[inline]
pub fn elapsed(now: Tick, since: Tick) -> Tick {
    now.wrapping_sub(since)
}

/// Convert a duration in milliseconds to ticks, rounding up.
/// Returns at least 1 tick so a nonzero request never becomes a no-op.
pub fn ticks_from_millis(millis: u32) -> Tick {
    let micros = millis as u64 * 1000;
    let ticks = micros.div_ceil(MICROS_PER_TICK as u64) as Tick;
    ticks.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_conversion_rounds_up_with_minimum() {
        assert_eq!(ticks_from_millis(0), 1);
        assert_eq!(ticks_from_millis(1), 1);
        assert_eq!(ticks_from_millis(2), 2);
        assert_eq!(ticks_from_millis(100), 100);
    }

    #[test]
    fn test_elapsed_across_wraparound() {
        assert_eq!(elapsed(10, 3), 7);
        assert_eq!(elapsed(2, u32::MAX - 1), 4);
        assert_eq!(elapsed(0, u32::MAX), 1);
        assert_eq!(elapsed(5, 5), 0);
    }

    #[test]
    fn test_tick_advances_counter() {
        let before = now();
        tick();
        assert_eq!(elapsed(now(), before), 1);
    }
}
