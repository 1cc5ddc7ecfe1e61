//! # Scheduler
//!
//! Co-operative, priority-aware dispatch loop. There is no preemption
//! and no per-task stack: the scheduler synchronously calls one task
//! entry function at a time, and the task suspends by returning a
//! [`Step`].
//!
//! ## Dispatch Algorithm
//!
//! On every [`poll`](Scheduler::poll):
//! 1. Read the clock once.
//! 2. Walk the task list from the scan cursor. A task is *due* when it
//!    is [`TaskState::Ready`] and at least `sleep_ticks` ticks have
//!    elapsed since it last began running (tick wraparound safe).
//! 3. Dispatch the first due task: stamp `last_run`, force its sleep
//!    time back to zero, call its entry function, apply the returned
//!    [`Step`].
//! 4. Move the cursor per the [`Policy`]: back to the head for
//!    [`Policy::Priority`] (the list is sorted by descending priority,
//!    so a due high-priority task always wins the next poll), past the
//!    dispatched task for [`Policy::RoundRobin`].
//!
//! Under `Priority`, a high-priority task that is always due starves
//! everything below it. That is the intended semantic, not a bug.
//!
//! ## Built-in tasks and CPU load
//!
//! [`init`](Scheduler::init) seeds two reserved tasks. The idle task
//! (priority 0) runs every [`IDLE_TASK_PERIOD_MS`] when nothing else is
//! due and decrements a countdown that starts at 100; the load task
//! (priority 255) runs once per 100 idle periods, publishes the
//! countdown as the CPU load percentage, and rewinds it. A fully idle
//! system measures 0, a saturated one 100.

use core::ops::{Deref, DerefMut};

use log::{info, trace};

use crate::arena::Arena;
use crate::config::{
    IDLE_TASK_PERIOD_MS, IDLE_TASK_PRIO, LOAD_MEASURE_PERIOD_FACTOR, LOAD_TASK_PRIO,
    MAX_FIFOS, MAX_SEMAPHORES, MAX_USER_PRIO, MIN_USER_PRIO,
};
use crate::fifo::Fifo;
use crate::list::TaskList;
use crate::semaphore::Semaphore;
use crate::task::{task_mut, task_ref, ResumePoint, Step, Task, TaskId, TaskState, TaskTable};
use crate::time::{self, ticks_from_millis, Tick};
use crate::Error;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Cursor behavior after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Restart the scan at the head of the priority-sorted list.
    #[default]
    Priority,
    /// Continue the scan past the dispatched task, giving equal-priority
    /// tasks alternating turns.
    RoundRobin,
}

/// A task entry function. Called synchronously by the scheduler; the
/// returned [`Step`] is the task's suspension.
pub type TaskFn<D> = fn(&mut Context<'_, D>) -> Step;

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// The central scheduler state: every task record, every semaphore and
/// FIFO, the clock source, and the dispatch cursor.
///
/// `D` is the application-defined per-task data type, the home for any
/// state a task must carry across suspension points.
///
/// Not `Sync` and never touched from interrupt context; the tick
/// interrupt only feeds the clock ([`time::tick`]).
pub struct Scheduler<D> {
    pub(crate) tasks: TaskTable<D>,
    /// Every live task, sorted by descending priority. Head runs first.
    pub(crate) ready: TaskList,
    pub(crate) sems: Arena<Semaphore, MAX_SEMAPHORES>,
    pub(crate) fifos: Arena<Fifo, MAX_FIFOS>,
    /// Tick source. Injected so hosted tests can drive time directly.
    clock: fn() -> Tick,
    policy: Policy,
    /// Position in `ready` where the next scan begins.
    cursor: usize,
    /// Counts down from 100 in the idle task; sampled by the load task.
    load_counter: u8,
    load_percent: u8,
    idle_task: Option<TaskId>,
    load_task: Option<TaskId>,
}

impl<D> Scheduler<D> {
    /// Scheduler on the system tick clock with the default
    /// [`Policy::Priority`].
    pub fn new() -> Self {
        Self::with_policy(time::now, Policy::Priority)
    }

    /// Scheduler on a caller-supplied clock.
    pub fn with_clock(clock: fn() -> Tick) -> Self {
        Self::with_policy(clock, Policy::Priority)
    }

    pub fn with_policy(clock: fn() -> Tick, policy: Policy) -> Self {
        Self {
            tasks: Arena::new(),
            ready: TaskList::new(),
            sems: Arena::new(),
            fifos: Arena::new(),
            clock,
            policy,
            cursor: 0,
            load_counter: 100,
            load_percent: 100,
            idle_task: None,
            load_task: None,
        }
    }

    // -----------------------------------------------------------------------
    // Task management
    // -----------------------------------------------------------------------

    /// Create a task. It is immediately ready and due.
    ///
    /// `priority` must lie in [`MIN_USER_PRIO`]..=[`MAX_USER_PRIO`]; 0
    /// and 255 belong to the built-in idle and load tasks.
    pub fn create_task(&mut self, priority: u8, data: D, entry: TaskFn<D>) -> Result<TaskId, Error> {
        if !(MIN_USER_PRIO..=MAX_USER_PRIO).contains(&priority) {
            return Err(Error::ReservedPriority);
        }
        self.spawn(priority, data, entry)
    }

    fn spawn(&mut self, priority: u8, data: D, entry: TaskFn<D>) -> Result<TaskId, Error> {
        let now = (self.clock)();
        let (index, generation) = self
            .tasks
            .insert(Task {
                priority,
                state: TaskState::Ready,
                last_run: now,
                sleep_ticks: 0,
                resume_point: 0,
                entry,
                data,
            })
            .ok_or(Error::NoSpace)?;
        let id = TaskId { index, generation };
        if self.ready.push_front(id).is_err() {
            // The list capacity matches the table capacity, so a full
            // list implies a full table, caught above.
            self.tasks.remove(index, generation);
            return Err(Error::NoSpace);
        }
        self.sort_ready();
        trace!("task {} created at priority {}", id.index(), priority);
        Ok(id)
    }

    /// Seed the built-in idle and load-measurement tasks. Without them
    /// [`cpu_load_percent`](Self::cpu_load_percent) never updates.
    pub fn init(&mut self) -> Result<(), Error>
    where
        D: Default,
    {
        if self.idle_task.is_some() {
            return Ok(());
        }
        let idle = self.spawn(IDLE_TASK_PRIO, D::default(), idle_entry)?;
        let load = self.spawn(LOAD_TASK_PRIO, D::default(), load_entry)?;
        self.idle_task = Some(idle);
        self.load_task = Some(load);
        Ok(())
    }

    /// Delete a task and invalidate its handle.
    ///
    /// The built-in tasks cannot be deleted, and neither can a task
    /// parked on a semaphore wait list: the semaphore would keep a
    /// stale entry and a later signal would release a ghost. Resume the
    /// task first if it really must go.
    pub fn delete_task(&mut self, id: TaskId) -> Result<(), Error> {
        if self.idle_task == Some(id) || self.load_task == Some(id) {
            return Err(Error::ReservedTask);
        }
        let state = task_ref(&self.tasks, id).ok_or(Error::NotFound)?.state;
        if state == TaskState::Blocked {
            return Err(Error::TaskBlocked);
        }
        self.release(id);
        Ok(())
    }

    /// Take a task out of dispatch until [`resume_task`](Self::resume_task).
    pub fn suspend_task(&mut self, id: TaskId) -> Result<(), Error> {
        let task = task_mut(&mut self.tasks, id).ok_or(Error::NotFound)?;
        task.state = TaskState::Suspended;
        Ok(())
    }

    /// Make a task ready regardless of its previous state.
    ///
    /// This also recovers a task left blocked on a destroyed semaphore.
    pub fn resume_task(&mut self, id: TaskId) -> Result<(), Error> {
        let task = task_mut(&mut self.tasks, id).ok_or(Error::NotFound)?;
        task.state = TaskState::Ready;
        Ok(())
    }

    /// Change a task's priority and re-sort the task list.
    pub fn set_priority(&mut self, id: TaskId, priority: u8) -> Result<(), Error> {
        if !(MIN_USER_PRIO..=MAX_USER_PRIO).contains(&priority) {
            return Err(Error::ReservedPriority);
        }
        task_mut(&mut self.tasks, id)
            .ok_or(Error::NotFound)?
            .priority = priority;
        self.sort_ready();
        Ok(())
    }

    fn sort_ready(&mut self) {
        let Self { ready, tasks, .. } = self;
        ready.sort_by_priority(|id| task_ref(tasks, id).map(|t| t.priority).unwrap_or(0));
    }

    /// Unlink and free a task record. Internal: callers have already
    /// validated the deletion.
    fn release(&mut self, id: TaskId) {
        self.ready.unlink(id);
        self.tasks.remove(id.index, id.generation);
        if self.cursor >= self.ready.len() {
            self.cursor = 0;
        }
        trace!("task {} released", id.index());
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Run at most one due task.
    ///
    /// Returns the dispatched task's handle, or `None` when nothing was
    /// due. The handle may already be stale if the task finished.
    pub fn poll(&mut self) -> Option<TaskId> {
        let now = (self.clock)();
        while let Some(id) = self.ready.get(self.cursor) {
            if self.is_due(id, now) {
                self.dispatch(id, now);
                self.cursor = match self.policy {
                    Policy::Priority => 0,
                    Policy::RoundRobin => self.cursor + 1,
                };
                if self.cursor >= self.ready.len() {
                    self.cursor = 0;
                }
                return Some(id);
            }
            self.cursor += 1;
        }
        self.cursor = 0;
        None
    }

    fn is_due(&self, id: TaskId, now: Tick) -> bool {
        match task_ref(&self.tasks, id) {
            Some(task) => {
                task.state == TaskState::Ready && time::elapsed(now, task.last_run) >= task.sleep_ticks
            }
            None => false,
        }
    }

    fn dispatch(&mut self, id: TaskId, now: Tick) {
        let entry = match task_mut(&mut self.tasks, id) {
            Some(task) => {
                task.last_run = now;
                // A sleeping task re-arms by returning Step::Sleep
                // again; anything else runs on every poll.
                task.sleep_ticks = 0;
                task.entry
            }
            None => return,
        };
        let step = entry(&mut Context { sched: self, id });
        self.apply_step(id, step);
    }

    fn apply_step(&mut self, id: TaskId, step: Step) {
        match step {
            Step::Schedule { next } => {
                if let Some(task) = task_mut(&mut self.tasks, id) {
                    task.resume_point = next;
                }
            }
            Step::Sleep { ticks, next } => {
                if let Some(task) = task_mut(&mut self.tasks, id) {
                    task.resume_point = next;
                    task.sleep_ticks = ticks;
                }
            }
            Step::WaitSem { sem, next } => {
                if let Some(task) = task_mut(&mut self.tasks, id) {
                    task.resume_point = next;
                }
                self.sem_wait_for(sem, id);
            }
            Step::Finish => self.release(id),
        }
    }

    /// Dispatch forever. The busy-wait is what the idle task measures.
    pub fn run(&mut self) -> ! {
        loop {
            let _ = self.poll();
        }
    }

    /// Bounded dispatch for hosted use: `polls` calls to
    /// [`poll`](Self::poll).
    pub fn run_for(&mut self, polls: usize) {
        for _ in 0..polls {
            let _ = self.poll();
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn task_state(&self, id: TaskId) -> Result<TaskState, Error> {
        task_ref(&self.tasks, id)
            .map(|t| t.state)
            .ok_or(Error::NotFound)
    }

    pub fn task_priority(&self, id: TaskId) -> Result<u8, Error> {
        task_ref(&self.tasks, id)
            .map(|t| t.priority)
            .ok_or(Error::NotFound)
    }

    pub fn task_data(&self, id: TaskId) -> Result<&D, Error> {
        task_ref(&self.tasks, id)
            .map(|t| &t.data)
            .ok_or(Error::NotFound)
    }

    pub fn task_data_mut(&mut self, id: TaskId) -> Result<&mut D, Error> {
        task_mut(&mut self.tasks, id)
            .map(|t| &mut t.data)
            .ok_or(Error::NotFound)
    }

    /// Number of live tasks, built-ins included.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Current tick, read from the scheduler's clock source.
    pub fn now(&self) -> Tick {
        (self.clock)()
    }

    /// Most recent CPU load measurement, 0 (idle) to 100 (saturated).
    /// Stays at 100 until [`init`](Self::init) has been called and the
    /// first measurement period has elapsed.
    pub fn cpu_load_percent(&self) -> u8 {
        self.load_percent
    }

    /// Dump the task list to the `info` log, head first.
    pub fn log_task_list(&self) {
        info!("task list ({} tasks):", self.ready.len());
        for id in self.ready.iter() {
            if let Some(task) = task_ref(&self.tasks, id) {
                info!(
                    "  task {}: prio {} state {:?} sleep {} resume {}",
                    id.index(),
                    task.priority,
                    task.state,
                    task.sleep_ticks,
                    task.resume_point
                );
            }
        }
    }
}

impl<D> Default for Scheduler<D> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Built-in tasks
// ---------------------------------------------------------------------------

fn idle_entry<D>(cx: &mut Context<'_, D>) -> Step {
    cx.sched.load_counter = cx.sched.load_counter.saturating_sub(1);
    Step::Sleep {
        ticks: ticks_from_millis(IDLE_TASK_PERIOD_MS),
        next: 0,
    }
}

fn load_entry<D>(cx: &mut Context<'_, D>) -> Step {
    cx.sched.load_percent = cx.sched.load_counter;
    cx.sched.load_counter = 100;
    trace!("cpu load: {}%", cx.sched.load_percent);
    Step::Sleep {
        ticks: ticks_from_millis(IDLE_TASK_PERIOD_MS * LOAD_MEASURE_PERIOD_FACTOR),
        next: 0,
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// The view a running task has of the system.
///
/// Dereferences to the [`Scheduler`], so a task body can create tasks,
/// signal semaphores, or move FIFO data mid-run. It additionally knows
/// *which* task is running, giving access to the task's own resume
/// point and data.
pub struct Context<'a, D> {
    pub(crate) sched: &'a mut Scheduler<D>,
    pub(crate) id: TaskId,
}

impl<D> Context<'_, D> {
    /// Handle of the running task.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Where this invocation resumes. `0` on the first run.
    pub fn resume_point(&self) -> ResumePoint {
        task_ref(&self.sched.tasks, self.id)
            .map(|t| t.resume_point)
            .unwrap_or(0)
    }

    /// The running task's own data.
    ///
    /// # Panics
    ///
    /// Panics if the task has deleted itself during this invocation.
    pub fn data(&mut self) -> &mut D {
        match task_mut(&mut self.sched.tasks, self.id) {
            Some(task) => &mut task.data,
            None => panic!("task {} used its record after deleting itself", self.id.index()),
        }
    }
}

impl<'a, D> Deref for Context<'a, D> {
    type Target = Scheduler<D>;

    fn deref(&self) -> &Self::Target {
        self.sched
    }
}

impl<'a, D> DerefMut for Context<'a, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.sched
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicU32, Ordering};

    use super::{Context, Policy, Scheduler};
    use crate::config::{IDLE_TASK_PRIO, LOAD_TASK_PRIO, MAX_TASKS};
    use crate::task::{Step, TaskState};
    use crate::time::Tick;
    use crate::Error;

    fn frozen_clock() -> Tick {
        0
    }

    /// Counts invocations in the task data, always ready again.
    fn yielder(cx: &mut Context<'_, u32>) -> Step {
        *cx.data() += 1;
        Step::Schedule { next: 0 }
    }

    /// Counts invocations, then sleeps 10 ticks.
    fn periodic(cx: &mut Context<'_, u32>) -> Step {
        *cx.data() += 1;
        Step::Sleep { ticks: 10, next: 0 }
    }

    /// Runs once and parks forever.
    fn one_shot(cx: &mut Context<'_, u32>) -> Step {
        *cx.data() += 1;
        Step::Sleep {
            ticks: Tick::MAX,
            next: 0,
        }
    }

    fn finisher(cx: &mut Context<'_, u32>) -> Step {
        *cx.data() += 1;
        Step::Finish
    }

    #[test]
    fn test_priority_order_when_both_due() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut cos: Scheduler<u32> = Scheduler::with_clock(frozen_clock);
        let low = cos.create_task(5, 0, one_shot).unwrap();
        let high = cos.create_task(9, 0, one_shot).unwrap();
        cos.log_task_list();

        assert_eq!(cos.poll(), Some(high));
        assert_eq!(cos.poll(), Some(low));
        assert_eq!(cos.poll(), None);
    }

    #[test]
    fn test_high_priority_task_starves_lower() {
        let mut cos: Scheduler<u32> = Scheduler::with_clock(frozen_clock);
        let low = cos.create_task(5, 0, yielder).unwrap();
        let high = cos.create_task(9, 0, yielder).unwrap();

        for _ in 0..10 {
            assert_eq!(cos.poll(), Some(high));
        }
        assert_eq!(*cos.task_data(low).unwrap(), 0);

        // Only once the higher task parks does the lower one run.
        cos.suspend_task(high).unwrap();
        assert_eq!(cos.poll(), Some(low));
    }

    #[test]
    fn test_lower_runs_while_higher_sleeps() {
        let mut cos: Scheduler<u32> = Scheduler::with_clock(frozen_clock);
        let low = cos.create_task(5, 0, yielder).unwrap();
        let high = cos.create_task(9, 0, periodic).unwrap();

        assert_eq!(cos.poll(), Some(high));
        // High is asleep for 10 ticks and the clock is frozen.
        assert_eq!(cos.poll(), Some(low));
        assert_eq!(cos.poll(), Some(low));
    }

    #[test]
    fn test_periodic_task_run_count() {
        static CLOCK: AtomicU32 = AtomicU32::new(0);
        fn clock() -> Tick {
            CLOCK.load(Ordering::Relaxed)
        }

        CLOCK.store(0, Ordering::Relaxed);
        let mut cos: Scheduler<u32> = Scheduler::with_clock(clock);
        let t = cos.create_task(5, 0, periodic).unwrap();

        // A 10-tick period observed for 35 ticks: runs at 0, 10, 20, 30.
        for tick in 0..35 {
            CLOCK.store(tick, Ordering::Relaxed);
            cos.run_for(1);
        }
        assert_eq!(*cos.task_data(t).unwrap(), 4);
    }

    #[test]
    fn test_due_test_survives_tick_wraparound() {
        static CLOCK: AtomicU32 = AtomicU32::new(0);
        fn clock() -> Tick {
            CLOCK.load(Ordering::Relaxed)
        }

        CLOCK.store(Tick::MAX - 5, Ordering::Relaxed);
        let mut cos: Scheduler<u32> = Scheduler::with_clock(clock);
        let t = cos.create_task(5, 0, periodic).unwrap();

        cos.run_for(1);
        assert_eq!(*cos.task_data(t).unwrap(), 1);

        // 9 of 10 sleep ticks elapsed, crossing the wrap: not due yet.
        CLOCK.store(3, Ordering::Relaxed);
        cos.run_for(1);
        assert_eq!(*cos.task_data(t).unwrap(), 1);

        CLOCK.store(4, Ordering::Relaxed);
        cos.run_for(1);
        assert_eq!(*cos.task_data(t).unwrap(), 2);
    }

    #[test]
    fn test_sleep_is_cleared_before_every_run() {
        static CLOCK: AtomicU32 = AtomicU32::new(0);
        fn clock() -> Tick {
            CLOCK.load(Ordering::Relaxed)
        }

        // Sleeps 10 ticks once, then only yields. The old sleep time
        // must not linger: after the yield the task is due at once.
        fn sleep_then_yield(cx: &mut Context<'_, u32>) -> Step {
            *cx.data() += 1;
            match cx.resume_point() {
                0 => Step::Sleep { ticks: 10, next: 1 },
                _ => Step::Schedule { next: 1 },
            }
        }

        CLOCK.store(0, Ordering::Relaxed);
        let mut cos: Scheduler<u32> = Scheduler::with_clock(clock);
        let t = cos.create_task(5, 0, sleep_then_yield).unwrap();

        cos.run_for(3);
        assert_eq!(*cos.task_data(t).unwrap(), 1);

        CLOCK.store(10, Ordering::Relaxed);
        cos.run_for(3);
        assert_eq!(*cos.task_data(t).unwrap(), 4);
    }

    #[test]
    fn test_suspend_and_resume() {
        let mut cos: Scheduler<u32> = Scheduler::with_clock(frozen_clock);
        let t = cos.create_task(5, 0, yielder).unwrap();

        cos.suspend_task(t).unwrap();
        assert_eq!(cos.task_state(t).unwrap(), TaskState::Suspended);
        assert_eq!(cos.poll(), None);

        cos.resume_task(t).unwrap();
        assert_eq!(cos.poll(), Some(t));
    }

    #[test]
    fn test_finish_releases_the_task() {
        let mut cos: Scheduler<u32> = Scheduler::with_clock(frozen_clock);
        let t = cos.create_task(5, 0, finisher).unwrap();
        assert_eq!(cos.poll(), Some(t));
        assert_eq!(cos.task_state(t), Err(Error::NotFound));
        assert_eq!(cos.task_count(), 0);
        assert_eq!(cos.poll(), None);
    }

    #[test]
    fn test_delete_task_rules() {
        let mut cos: Scheduler<u32> = Scheduler::with_clock(frozen_clock);
        cos.init().unwrap();
        let idle = cos.idle_task.unwrap();
        assert_eq!(cos.delete_task(idle), Err(Error::ReservedTask));

        let t = cos.create_task(5, 0, yielder).unwrap();
        cos.delete_task(t).unwrap();
        assert_eq!(cos.delete_task(t), Err(Error::NotFound));
        assert_eq!(cos.task_state(t), Err(Error::NotFound));
    }

    #[test]
    fn test_delete_blocked_task_is_rejected() {
        fn block_forever(cx: &mut Context<'_, u32>) -> Step {
            // Data smuggles the semaphore slot: tests create the
            // semaphore first, so slot 0 generation 0 is it.
            let sem = crate::SemId {
                index: *cx.data() as usize,
                generation: 0,
            };
            Step::WaitSem { sem, next: 0 }
        }

        let mut cos: Scheduler<u32> = Scheduler::with_clock(frozen_clock);
        let sem = cos.sem_create(0).unwrap();
        let t = cos.create_task(5, sem.index as u32, block_forever).unwrap();
        cos.run_for(1);
        assert_eq!(cos.task_state(t).unwrap(), TaskState::Blocked);

        assert_eq!(cos.delete_task(t), Err(Error::TaskBlocked));

        // Resuming first makes the deletion legal.
        cos.resume_task(t).unwrap();
        cos.delete_task(t).unwrap();
    }

    #[test]
    fn test_reserved_priorities_and_capacity() {
        let mut cos: Scheduler<u32> = Scheduler::with_clock(frozen_clock);
        assert_eq!(
            cos.create_task(IDLE_TASK_PRIO, 0, yielder),
            Err(Error::ReservedPriority)
        );
        assert_eq!(
            cos.create_task(LOAD_TASK_PRIO, 0, yielder),
            Err(Error::ReservedPriority)
        );

        for _ in 0..MAX_TASKS {
            cos.create_task(5, 0, yielder).unwrap();
        }
        assert_eq!(cos.create_task(5, 0, yielder), Err(Error::NoSpace));
    }

    #[test]
    fn test_set_priority_reorders_dispatch() {
        let mut cos: Scheduler<u32> = Scheduler::with_clock(frozen_clock);
        let a = cos.create_task(5, 0, yielder).unwrap();
        let b = cos.create_task(9, 0, yielder).unwrap();

        assert_eq!(cos.poll(), Some(b));
        cos.set_priority(a, 20).unwrap();
        assert_eq!(cos.poll(), Some(a));
        assert_eq!(cos.poll(), Some(a));
        assert_eq!(cos.set_priority(a, 0), Err(Error::ReservedPriority));
    }

    #[test]
    fn test_round_robin_alternates_equal_priorities() {
        let mut cos: Scheduler<u32> =
            Scheduler::with_policy(frozen_clock, Policy::RoundRobin);
        let a = cos.create_task(5, 0, yielder).unwrap();
        let b = cos.create_task(5, 0, yielder).unwrap();

        let mut runs_a = 0;
        let mut runs_b = 0;
        for _ in 0..10 {
            match cos.poll() {
                Some(id) if id == a => runs_a += 1,
                Some(id) if id == b => runs_b += 1,
                other => panic!("unexpected poll result {:?}", other),
            }
        }
        assert_eq!(runs_a, 5);
        assert_eq!(runs_b, 5);
    }

    #[test]
    fn test_init_seeds_builtin_tasks() {
        let mut cos: Scheduler<u32> = Scheduler::with_clock(frozen_clock);
        cos.init().unwrap();
        assert_eq!(cos.task_count(), 2);
        let idle = cos.idle_task.unwrap();
        let load = cos.load_task.unwrap();
        assert_eq!(cos.task_priority(idle).unwrap(), IDLE_TASK_PRIO);
        assert_eq!(cos.task_priority(load).unwrap(), LOAD_TASK_PRIO);
        // Idempotent.
        cos.init().unwrap();
        assert_eq!(cos.task_count(), 2);
    }

    #[test]
    fn test_cpu_load_idle_system_measures_zero() {
        static CLOCK: AtomicU32 = AtomicU32::new(0);
        fn clock() -> Tick {
            CLOCK.load(Ordering::Relaxed)
        }

        CLOCK.store(0, Ordering::Relaxed);
        let mut cos: Scheduler<u32> = Scheduler::with_clock(clock);
        cos.init().unwrap();
        assert_eq!(cos.cpu_load_percent(), 100);

        // One idle period per 10 ticks, one measurement per 1000.
        for step in 0..=100u32 {
            CLOCK.store(step * 10, Ordering::Relaxed);
            cos.run_for(4);
        }
        assert_eq!(cos.cpu_load_percent(), 0);
    }

    #[test]
    fn test_cpu_load_busy_system_measures_full() {
        static CLOCK: AtomicU32 = AtomicU32::new(0);
        fn clock() -> Tick {
            CLOCK.load(Ordering::Relaxed)
        }

        CLOCK.store(0, Ordering::Relaxed);
        let mut cos: Scheduler<u32> = Scheduler::with_clock(clock);
        cos.init().unwrap();
        // Always due, outranks idle: the idle task never runs.
        cos.create_task(10, 0, yielder).unwrap();

        for step in 0..=100u32 {
            CLOCK.store(step * 10, Ordering::Relaxed);
            cos.run_for(4);
        }
        assert_eq!(cos.cpu_load_percent(), 100);
    }

    #[test]
    fn test_stale_handle_fails_everywhere() {
        let mut cos: Scheduler<u32> = Scheduler::with_clock(frozen_clock);
        let t = cos.create_task(5, 0, yielder).unwrap();
        cos.delete_task(t).unwrap();
        // The slot is reused, the old handle still misses.
        let fresh = cos.create_task(5, 0, yielder).unwrap();
        assert_eq!(fresh.index(), t.index());
        assert_eq!(cos.task_state(t), Err(Error::NotFound));
        assert_eq!(cos.task_data(t), Err(Error::NotFound));
        assert_eq!(cos.suspend_task(t), Err(Error::NotFound));
        assert_eq!(cos.resume_task(t), Err(Error::NotFound));
        assert_eq!(cos.set_priority(t, 7), Err(Error::NotFound));
    }
}
