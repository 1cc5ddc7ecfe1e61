//! # Cortex-M Port Layer
//!
//! SysTick configuration and the tick interrupt handler for ARM
//! Cortex-M targets. Unlike a preemptive kernel there is no context
//! switching here: the interrupt only advances the tick counter, and
//! all task execution happens synchronously inside
//! [`Scheduler::run`](crate::Scheduler::run) on the main stack.

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use cortex_m_rt::exception;

use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};

/// Configure the SysTick timer to fire at [`TICK_HZ`] from the core
/// clock. Call once before [`Scheduler::run`](crate::Scheduler::run).
pub fn configure_systick(syst: &mut SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

/// SysTick exception handler. The tick counter is the only state shared
/// with interrupt context.
#[exception]
fn SysTick() {
    crate::time::tick();
}
