//! # Linear Task List
//!
//! The ordered list of task handles used both for the scheduler's
//! global list (every task, sorted by descending priority) and for each
//! semaphore's wait list (blocked tasks, most recent first).
//!
//! The list stores handles, never task records: many lists may refer to
//! the same task, and removing an entry never touches the task itself.
//! Entries are kept in a bounded vector with the head at index 0, which
//! preserves the original structure's operations — insert at head,
//! unlink by identity, linear search, predecessor lookup, and an
//! in-place bubble sort that swaps payloads so positions (not links)
//! move.

use heapless::Vec;
use log::debug;

use crate::config::MAX_TASKS;
use crate::task::TaskId;

/// A bounded, ordered list of task handles. Head is index 0.
#[derive(Default)]
pub(crate) struct TaskList {
    ids: Vec<TaskId, MAX_TASKS>,
}

impl TaskList {
    pub(crate) fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Insert `id` at the head of the list. Fails only when the list is
    /// already at capacity.
    pub(crate) fn push_front(&mut self, id: TaskId) -> Result<(), ()> {
        self.ids.insert(0, id).map_err(|_| ())
    }

    /// Remove the entry referring to `id`, comparing by identity.
    ///
    /// Returns `false` and leaves the list unchanged when `id` is not
    /// present. Callers may legitimately race with removal (a resumed
    /// task that was already released by a signal, for example), so an
    /// absent entry is a logged no-op, never fatal.
    pub(crate) fn unlink(&mut self, id: TaskId) -> bool {
        match self.find(id) {
            Some(pos) => {
                self.ids.remove(pos);
                true
            }
            None => {
                debug!("task list: unlink missed task {:?}", id);
                false
            }
        }
    }

    /// Position of the entry referring to `id`, by linear scan.
    pub(crate) fn find(&self, id: TaskId) -> Option<usize> {
        self.ids.iter().position(|&t| t == id)
    }

    /// The entry immediately ahead of `id` in list order. `None` when
    /// `id` is at the head or absent.
    pub(crate) fn predecessor(&self, id: TaskId) -> Option<TaskId> {
        match self.find(id) {
            Some(0) | None => None,
            Some(pos) => Some(self.ids[pos - 1]),
        }
    }

    pub(crate) fn head(&self) -> Option<TaskId> {
        self.ids.first().copied()
    }

    pub(crate) fn get(&self, pos: usize) -> Option<TaskId> {
        self.ids.get(pos).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.ids.iter().copied()
    }

    /// Sort the list by descending priority, as reported by `prio_of`.
    ///
    /// Bubble sort that swaps entry payloads in place. Task counts are
    /// small (tens at most), so the O(n²) cost is irrelevant next to
    /// keeping the operation allocation-free. Ordering among entries of
    /// equal priority is unspecified.
    pub(crate) fn sort_by_priority<F>(&mut self, prio_of: F)
    where
        F: Fn(TaskId) -> u8,
    {
        if self.ids.is_empty() {
            return;
        }
        loop {
            let mut swaps = 0;
            for i in 0..self.ids.len() - 1 {
                if prio_of(self.ids[i]) < prio_of(self.ids[i + 1]) {
                    self.ids.swap(i, i + 1);
                    swaps += 1;
                }
            }
            if swaps == 0 {
                break;
            }
        }
    }
}
