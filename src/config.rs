//! # COS Configuration
//!
//! Compile-time constants governing the scheduler and system behavior.
//! All limits are fixed at compile time — no dynamic allocation.

/// Maximum number of tasks the system can manage simultaneously,
/// including the two built-in bookkeeping tasks. Bounds the task table
/// and every semaphore wait list.
pub const MAX_TASKS: usize = 8;

/// Maximum number of counting semaphores. FIFOs consume two each.
pub const MAX_SEMAPHORES: usize = 8;

/// Maximum number of slot FIFOs.
pub const MAX_FIFOS: usize = 4;

/// Byte capacity of one FIFO's slot buffer. A FIFO's
/// `slot_size * capacity` must fit in this many bytes.
pub const FIFO_BUFFER_BYTES: usize = 256;

/// Tick frequency in Hz. Determines scheduler tick granularity.
/// Higher values give finer sleep precision at the cost of increased
/// interrupt overhead.
pub const TICK_HZ: u32 = 1000;

/// Microseconds per tick, derived from `TICK_HZ`.
pub const MICROS_PER_TICK: u32 = 1_000_000 / TICK_HZ;

/// Period of the built-in idle task in milliseconds.
pub const IDLE_TASK_PERIOD_MS: u32 = 10;

/// The load-measurement task runs once per this many idle-task periods.
/// With the defaults, the idle task fits 100 runs into one measurement
/// period on an otherwise unloaded system.
pub const LOAD_MEASURE_PERIOD_FACTOR: u32 = 100;

/// Priority reserved for the built-in idle task. Never use for
/// application tasks.
pub const IDLE_TASK_PRIO: u8 = 0;

/// Priority reserved for the built-in load-measurement task. Never use
/// for application tasks.
pub const LOAD_TASK_PRIO: u8 = 255;

/// Lowest priority available to application tasks.
pub const MIN_USER_PRIO: u8 = 1;

/// Highest priority available to application tasks.
pub const MAX_USER_PRIO: u8 = 254;

/// System clock frequency in Hz, used by the Cortex-M port to derive
/// the SysTick reload value (default for STM32F4 at 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;
