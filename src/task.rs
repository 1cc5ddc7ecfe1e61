//! # Task Model
//!
//! A task is one co-operative unit of work: a priority, a lifecycle
//! state, a resumable entry function, and whatever state must survive
//! between invocations.
//!
//! ## Stackless resumption
//!
//! There is exactly one call stack, shared by the scheduler and every
//! task. A task "blocks" by returning a [`Step`] from its entry
//! function; the stack frame is gone afterwards, so nothing local
//! survives. Anything the task needs across a suspension point lives in
//! its record instead: the [`resume_point`](Task::resume_point) selects
//! the arm of the entry function's state machine to continue in, and
//! the application-defined `data` field carries the promoted locals.
//!
//! Because suspension is expressed *only* as the entry function's
//! return value, suspending from a nested helper is impossible by
//! construction — helpers take data and return data, and only the task
//! body can turn that into a `Step`.

use crate::arena::Arena;
use crate::config::MAX_TASKS;
use crate::scheduler::TaskFn;
use crate::semaphore::SemId;
use crate::time::Tick;

/// Identifies where a task's entry function resumes on its next
/// invocation. `0` is the start of the task body.
pub type ResumePoint = u8;

/// Lifecycle state of a task.
///
/// There is no `Running` state: a task is logically running only for
/// the duration of one synchronous call into its entry function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Eligible for dispatch whenever its sleep time has elapsed.
    Ready,
    /// Never dispatched until explicitly resumed.
    Suspended,
    /// Parked on a semaphore's wait list; made ready only by a signal.
    Blocked,
}

/// Generation-checked handle to a task slot.
///
/// Handles stay valid until the task is deleted; after that, every
/// operation against the stale handle fails with
/// [`Error::NotFound`](crate::Error::NotFound) — even if the slot has
/// been reused for a new task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl TaskId {
    /// Slot index, for diagnostics only.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// What a task does at a co-operative suspension point.
///
/// Returning a `Step` is the *only* way to suspend; each variant names
/// the resume point for the next invocation, mirroring how the original
/// line-numbered macros stored a re-entry location and then returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Yield. The task stays ready and is due again immediately.
    Schedule { next: ResumePoint },
    /// Sleep for at least `ticks` ticks, then become due again.
    ///
    /// The scheduler clears the sleep time before every invocation, so
    /// a task that wants periodic behavior must re-arm on every run.
    Sleep { ticks: Tick, next: ResumePoint },
    /// Wait on a counting semaphore.
    ///
    /// The task always suspends here. If the semaphore has no event
    /// available it is additionally marked [`TaskState::Blocked`] and
    /// parked on the wait list until a signal releases it; otherwise it
    /// stays ready and continues at `next` on the following dispatch.
    WaitSem { sem: SemId, next: ResumePoint },
    /// The task body ran to its logical end. The scheduler unlinks and
    /// frees the task; to run it again it must be created anew.
    Finish,
}

/// The record backing one task.
pub(crate) struct Task<D> {
    /// Dispatch priority; higher runs first. `0` and `255` are reserved
    /// for the built-in idle and load-measurement tasks.
    pub(crate) priority: u8,
    pub(crate) state: TaskState,
    /// Tick at which this task last began executing.
    pub(crate) last_run: Tick,
    /// Ticks to wait since `last_run` before becoming due again.
    /// Forcibly reset to 0 immediately before every invocation.
    pub(crate) sleep_ticks: Tick,
    /// Where the entry function continues on the next invocation.
    /// Meaningful only between invocations of this one task.
    pub(crate) resume_point: ResumePoint,
    pub(crate) entry: TaskFn<D>,
    /// Application state that must survive suspension points.
    pub(crate) data: D,
}

/// The single owning table of task records.
pub(crate) type TaskTable<D> = Arena<Task<D>, MAX_TASKS>;

pub(crate) fn task_ref<D>(table: &TaskTable<D>, id: TaskId) -> Option<&Task<D>> {
    table.get(id.index, id.generation)
}

pub(crate) fn task_mut<D>(table: &mut TaskTable<D>, id: TaskId) -> Option<&mut Task<D>> {
    table.get_mut(id.index, id.generation)
}
