//! # Architecture Ports
//!
//! Hardware-specific glue. The kernel itself is portable `core` code
//! driven entirely by its injected clock, so a port only has to do one
//! thing: arrange for [`time::tick`](crate::time::tick) to be called at
//! [`TICK_HZ`](crate::config::TICK_HZ).
//!
//! On hosted targets (tests, simulation) no port is compiled at all;
//! drive the scheduler with [`Scheduler::with_clock`](crate::Scheduler::with_clock)
//! instead.

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod cortex_m;
