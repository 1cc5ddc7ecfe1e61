//! # Counting Semaphore
//!
//! A counting semaphore for co-operative tasks. "Wait" never blocks the
//! call stack — there is only one — it mutates the *task*: if no event
//! is available the task is marked [`TaskState::Blocked`] and parked on
//! the semaphore's wait list, and the scheduler simply stops dispatching
//! it until a signal releases it.
//!
//! A task waits by returning [`Step::WaitSem`] from its entry function;
//! see [`task`](crate::task) for why that return *is* the suspension.
//! There is no timeout: a task waiting on a semaphore that is never
//! signaled parks forever.
//!
//! Waiters are prepended to the wait list and `signal` releases the
//! list head, i.e. the most recently parked task. Release order is not
//! priority-aware; priority inversion through semaphores is a known,
//! accepted limitation.

use log::debug;

use crate::list::TaskList;
use crate::scheduler::Scheduler;
use crate::task::{task_mut, TaskId, TaskState, TaskTable};
use crate::Error;

/// Generation-checked handle to a semaphore owned by a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

/// Counting semaphore state.
///
/// `count > 0` means events are available and the wait list is empty;
/// `count <= 0` means `|count|` tasks have waited without an event.
pub(crate) struct Semaphore {
    pub(crate) count: i16,
    pub(crate) waiters: TaskList,
}

impl Semaphore {
    pub(crate) fn new(initial: i16) -> Self {
        Self {
            count: initial,
            waiters: TaskList::new(),
        }
    }
}

/// Consume one event on behalf of `id`.
///
/// If none is available (pre-decrement `count <= 0`), the task is
/// blocked and parked at the head of the wait list. The count is
/// decremented unconditionally. The caller has already returned from
/// its entry function; this only records the consequences.
pub(crate) fn wait<D>(sem: &mut Semaphore, tasks: &mut TaskTable<D>, id: TaskId) {
    if sem.count <= 0 {
        match task_mut(tasks, id) {
            Some(task) => task.state = TaskState::Blocked,
            None => debug!("sem wait: task {:?} not found", id),
        }
        if sem.waiters.push_front(id).is_err() {
            // Unreachable while the wait list capacity matches the task
            // table: a blocked task cannot wait twice.
            debug!("sem wait: wait list full, task {:?} not parked", id);
        }
    }
    sem.count -= 1;
}

/// Post one event: increment the count and release the head waiter, if
/// any, back to [`TaskState::Ready`]. Sleep times are not touched.
pub(crate) fn signal<D>(sem: &mut Semaphore, tasks: &mut TaskTable<D>) {
    sem.count += 1;
    if let Some(head) = sem.waiters.head() {
        match task_mut(tasks, head) {
            Some(task) => task.state = TaskState::Ready,
            None => debug!("sem signal: stale waiter {:?}", head),
        }
        sem.waiters.unlink(head);
    }
}

impl<D> Scheduler<D> {
    /// Create a counting semaphore with the given initial count.
    pub fn sem_create(&mut self, initial: i16) -> Result<SemId, Error> {
        let (index, generation) = self
            .sems
            .insert(Semaphore::new(initial))
            .ok_or(Error::NoSpace)?;
        Ok(SemId { index, generation })
    }

    /// Destroy a semaphore, dropping its wait list.
    ///
    /// Waiting tasks are *not* released or deleted; they stay blocked
    /// and can only be recovered by [`resume_task`](Self::resume_task).
    pub fn sem_destroy(&mut self, id: SemId) -> Result<(), Error> {
        self.sems
            .remove(id.index, id.generation)
            .map(|_| ())
            .ok_or(Error::NotFound)
    }

    /// Post one event to the semaphore, releasing the head waiter if
    /// one is parked. Signals with no waiters accumulate in the count.
    pub fn sem_signal(&mut self, id: SemId) -> Result<(), Error> {
        let Self { sems, tasks, .. } = self;
        let sem = sems
            .get_mut(id.index, id.generation)
            .ok_or(Error::NotFound)?;
        signal(sem, tasks);
        Ok(())
    }

    /// Current semaphore count. Negative magnitude approximates the
    /// number of parked waiters.
    pub fn sem_count(&self, id: SemId) -> Result<i16, Error> {
        self.sems
            .get(id.index, id.generation)
            .map(|s| s.count)
            .ok_or(Error::NotFound)
    }

    /// Number of tasks currently parked on the wait list.
    pub fn sem_waiter_count(&self, id: SemId) -> Result<usize, Error> {
        self.sems
            .get(id.index, id.generation)
            .map(|s| s.waiters.len())
            .ok_or(Error::NotFound)
    }

    /// Consume one event on behalf of `task`, parking it if none is
    /// available. Reached via [`Step::WaitSem`](crate::Step::WaitSem).
    pub(crate) fn sem_wait_for(&mut self, id: SemId, task: TaskId) {
        let Self { sems, tasks, .. } = self;
        match sems.get_mut(id.index, id.generation) {
            Some(sem) => wait(sem, tasks, task),
            // Invalid handle: documented no-op, task stays ready.
            None => debug!("sem wait: semaphore {:?} not found", id),
        }
    }
}
