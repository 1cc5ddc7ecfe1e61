//! # Handle Arena
//!
//! Fixed-capacity slot storage with generation-checked handles.
//!
//! Tasks, semaphores, and FIFOs all live in arenas owned by the
//! scheduler, and the public API refers to them by `(index, generation)`
//! handles instead of references. Removing an entry bumps the slot
//! generation, so a handle that outlives its entry fails cleanly with a
//! lookup miss instead of touching whatever reuses the slot. This is
//! what makes "delete a task someone else still refers to" a recoverable
//! error rather than a dangling pointer.

/// One arena slot. `generation` counts how many times the slot has been
/// vacated; a handle is valid only while its generation matches.
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// A fixed array of generation-tracked slots.
pub(crate) struct Arena<T, const N: usize> {
    slots: [Slot<T>; N],
}

impl<T, const N: usize> Arena<T, N> {
    pub(crate) fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| Slot {
                generation: 0,
                value: None,
            }),
        }
    }

    /// Store `value` in a free slot. Returns the slot's handle pair, or
    /// `None` when the arena is full.
    pub(crate) fn insert(&mut self, value: T) -> Option<(usize, u32)> {
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| s.value.is_none())?;
        slot.value = Some(value);
        Some((index, slot.generation))
    }

    pub(crate) fn get(&self, index: usize, generation: u32) -> Option<&T> {
        let slot = self.slots.get(index)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub(crate) fn get_mut(&mut self, index: usize, generation: u32) -> Option<&mut T> {
        let slot = self.slots.get_mut(index)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Vacate a slot, invalidating every outstanding handle to it.
    pub(crate) fn remove(&mut self, index: usize, generation: u32) -> Option<T> {
        let slot = self.slots.get_mut(index)?;
        if slot.generation != generation || slot.value.is_none() {
            return None;
        }
        slot.generation = slot.generation.wrapping_add(1);
        slot.value.take()
    }

    /// Number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }
}
