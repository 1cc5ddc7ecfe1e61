//! # COS — Co-operative Scheduler
//!
//! A preemption-free, stackless task scheduler for microcontrollers,
//! with a tick clock, a priority-sorted task list, counting semaphores,
//! and slot FIFOs for inter-task data transfer.
//!
//! ## Overview
//!
//! Every task shares a single call stack. The scheduler synchronously
//! calls one due task at a time, and the task suspends by *returning* a
//! [`Step`] naming its next resume point — sleep for some ticks, yield,
//! wait on a semaphore, or finish. Because a suspension is a return,
//! nothing local survives it: state that must persist lives in the
//! task's data record, and the entry function is written as a small
//! state machine over its resume point.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                  Application Tasks                    │
//! │        fn(&mut Context<'_, D>) -> Step                │
//! ├───────────────┬──────────────────┬────────────────────┤
//! │   Scheduler   │    Semaphores    │     Slot FIFOs     │
//! │  scheduler.rs │   semaphore.rs   │      fifo.rs       │
//! │  ─ poll()     │   ─ sem_signal() │  ─ fifo_try_write()│
//! │  ─ run()      │   ─ sem_wait     │  ─ fifo_try_read() │
//! ├───────────────┴──────────────────┴────────────────────┤
//! │     Task Model (task.rs) · Task List (list.rs)        │
//! ├───────────────────────────────────────────────────────┤
//! │          Tick Clock (time.rs, u32 wrapping)           │
//! ├───────────────────────────────────────────────────────┤
//! │        Arch Port (arch/cortex_m.rs, SysTick)          │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! ## Memory Model
//!
//! - **No heap, no `alloc`**: tasks, semaphores, and FIFOs live in
//!   fixed-capacity arenas inside the [`Scheduler`]
//! - **Generation-checked handles**: deleting an object invalidates
//!   every outstanding handle to it; stale handles fail with
//!   [`Error::NotFound`] instead of aliasing the reused slot
//! - **Single shared word with interrupt context**: the tick counter
//!
//! ## Example
//!
//! A periodic task that counts its own runs:
//!
//! ```
//! use cos::{Context, Scheduler, Step};
//!
//! fn blinker(cx: &mut Context<'_, u32>) -> Step {
//!     match cx.resume_point() {
//!         0 => {
//!             // LED on
//!             Step::Sleep { ticks: 500, next: 1 }
//!         }
//!         _ => {
//!             // LED off
//!             *cx.data() += 1;
//!             Step::Sleep { ticks: 500, next: 0 }
//!         }
//!     }
//! }
//!
//! let mut cos: Scheduler<u32> = Scheduler::new();
//! cos.init()?;
//! let task = cos.create_task(10, 0, blinker)?;
//! cos.run_for(4);
//! assert!(cos.task_state(task).is_ok());
//! # Ok::<(), cos::Error>(())
//! ```
//!
//! On hardware, configure the tick interrupt and hand over control:
//!
//! ```ignore
//! cos::arch::cortex_m::configure_systick(&mut core_peripherals.SYST);
//! cos.run();
//! ```

#![no_std]

mod arena;
mod list;

pub mod arch;
pub mod config;
pub mod fifo;
pub mod scheduler;
pub mod semaphore;
pub mod task;
pub mod time;

pub use fifo::FifoId;
pub use scheduler::{Context, Policy, Scheduler, TaskFn};
pub use semaphore::SemId;
pub use task::{ResumePoint, Step, TaskId, TaskState};
pub use time::Tick;

/// Errors reported by the kernel API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The handle refers to a deleted or never-created object.
    NotFound,
    /// The relevant fixed-capacity arena is full.
    NoSpace,
    /// Priorities 0 and 255 belong to the built-in tasks.
    ReservedPriority,
    /// The built-in idle and load tasks cannot be deleted.
    ReservedTask,
    /// The task is parked on a semaphore wait list; resume it first.
    TaskBlocked,
    /// The buffer length does not match the FIFO's slot size.
    SlotSizeMismatch,
    /// Zero slot size or capacity, or slots that exceed
    /// [`config::FIFO_BUFFER_BYTES`].
    BadFifoGeometry,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::NotFound => "no such object",
            Error::NoSpace => "out of slots",
            Error::ReservedPriority => "priority reserved for built-in tasks",
            Error::ReservedTask => "built-in tasks cannot be deleted",
            Error::TaskBlocked => "task is blocked on a semaphore",
            Error::SlotSizeMismatch => "buffer length does not match slot size",
            Error::BadFifoGeometry => "invalid FIFO slot geometry",
        };
        f.write_str(msg)
    }
}
