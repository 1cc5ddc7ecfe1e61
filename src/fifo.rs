//! # Slot FIFO
//!
//! A bounded mailbox for inter-task data transfer. Data moves in fixed
//! `slot_size`-byte units through a circular byte buffer; flow control
//! is built from two counting semaphores, `readable` (starts at 0) and
//! `writable` (starts at the slot capacity).
//!
//! The non-blocking [`fifo_try_write`](Scheduler::fifo_try_write) and
//! [`fifo_try_read`](Scheduler::fifo_try_read) transfer 0 or 1 slots.
//! The blocking variants keep the original wait-then-copy shape: the
//! task waits on the FIFO's semaphore by returning
//! [`Step::WaitSem`](crate::Step::WaitSem) and performs the try-op at
//! its resume point, where the semaphore guarantees the try-op cannot
//! observe a full (or empty) FIFO:
//!
//! ```text
//! |----------|           -------------           |----------|
//! | producer |---------> |  |  |  |  | --------> | consumer |
//! |----------|           -------------           |----------|
//!                            FIFO
//! ```

use heapless::Vec;
use log::debug;

use crate::config::FIFO_BUFFER_BYTES;
use crate::scheduler::Scheduler;
use crate::semaphore::{signal, SemId};
use crate::Error;

/// Generation-checked handle to a FIFO owned by a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FifoId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

pub(crate) struct Fifo {
    /// Circular slot storage, `capacity * slot_size` bytes.
    buffer: Vec<u8, FIFO_BUFFER_BYTES>,
    slot_size: usize,
    capacity: usize,
    /// Byte offset of the next slot to read, stepped by `slot_size`.
    read_index: usize,
    /// Byte offset of the next slot to write, stepped by `slot_size`.
    write_index: usize,
    used_slots: usize,
    /// Signaled on every successful write; tasks block here to read.
    pub(crate) readable: SemId,
    /// Signaled on every successful read; tasks block here to write.
    pub(crate) writable: SemId,
}

impl Fifo {
    pub(crate) fn new(
        slot_size: usize,
        capacity: usize,
        readable: SemId,
        writable: SemId,
    ) -> Result<Self, Error> {
        let bytes = slot_size
            .checked_mul(capacity)
            .filter(|&b| b > 0 && b <= FIFO_BUFFER_BYTES)
            .ok_or(Error::BadFifoGeometry)?;
        let mut buffer = Vec::new();
        // Cannot fail: the geometry check bounds the length.
        let _ = buffer.resize(bytes, 0);
        Ok(Self {
            buffer,
            slot_size,
            capacity,
            read_index: 0,
            write_index: 0,
            used_slots: 0,
            readable,
            writable,
        })
    }

    /// Copy one slot in. Returns the number of slots written: 0 when
    /// the FIFO is full (buffer untouched), 1 otherwise.
    fn write_slot(&mut self, data: &[u8]) -> Result<usize, Error> {
        if data.len() != self.slot_size {
            return Err(Error::SlotSizeMismatch);
        }
        if self.used_slots >= self.capacity {
            return Ok(0);
        }
        self.buffer[self.write_index..self.write_index + self.slot_size].copy_from_slice(data);
        self.write_index = (self.write_index + self.slot_size) % self.buffer.len();
        self.used_slots += 1;
        Ok(1)
    }

    /// Copy one slot out. Returns the number of slots read: 0 when the
    /// FIFO is empty (output untouched), 1 otherwise.
    fn read_slot(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        if out.len() != self.slot_size {
            return Err(Error::SlotSizeMismatch);
        }
        if self.used_slots == 0 {
            return Ok(0);
        }
        out.copy_from_slice(&self.buffer[self.read_index..self.read_index + self.slot_size]);
        self.read_index = (self.read_index + self.slot_size) % self.buffer.len();
        self.used_slots -= 1;
        Ok(1)
    }
}

impl<D> Scheduler<D> {
    /// Create a FIFO with `capacity` slots of `slot_size` bytes each.
    ///
    /// The slot geometry must be nonzero and fit within
    /// [`FIFO_BUFFER_BYTES`]. Allocates two semaphores.
    pub fn fifo_create(&mut self, slot_size: usize, capacity: usize) -> Result<FifoId, Error> {
        let readable = self.sem_create(0)?;
        let writable = match self.sem_create(capacity as i16) {
            Ok(id) => id,
            Err(e) => {
                let _ = self.sem_destroy(readable);
                return Err(e);
            }
        };
        let fifo = match Fifo::new(slot_size, capacity, readable, writable) {
            Ok(f) => f,
            Err(e) => {
                let _ = self.sem_destroy(readable);
                let _ = self.sem_destroy(writable);
                return Err(e);
            }
        };
        match self.fifos.insert(fifo) {
            Some((index, generation)) => Ok(FifoId { index, generation }),
            None => {
                let _ = self.sem_destroy(readable);
                let _ = self.sem_destroy(writable);
                Err(Error::NoSpace)
            }
        }
    }

    /// Destroy a FIFO and both of its semaphores. Tasks still parked on
    /// those semaphores stay blocked, as with
    /// [`sem_destroy`](Self::sem_destroy).
    pub fn fifo_destroy(&mut self, id: FifoId) -> Result<(), Error> {
        let fifo = self
            .fifos
            .remove(id.index, id.generation)
            .ok_or(Error::NotFound)?;
        if self.sem_destroy(fifo.readable).is_err() || self.sem_destroy(fifo.writable).is_err() {
            debug!("fifo destroy: semaphore already gone");
        }
        Ok(())
    }

    /// Write one slot without blocking.
    ///
    /// `data` must be exactly `slot_size` bytes. Returns the number of
    /// slots written: 0 when the FIFO is full, 1 on success (which also
    /// signals the `readable` semaphore).
    pub fn fifo_try_write(&mut self, id: FifoId, data: &[u8]) -> Result<usize, Error> {
        let Self {
            fifos, sems, tasks, ..
        } = self;
        let fifo = fifos
            .get_mut(id.index, id.generation)
            .ok_or(Error::NotFound)?;
        let written = fifo.write_slot(data)?;
        if written == 1 {
            match sems.get_mut(fifo.readable.index, fifo.readable.generation) {
                Some(sem) => signal(sem, tasks),
                None => debug!("fifo write: readable semaphore gone"),
            }
        }
        Ok(written)
    }

    /// Read one slot without blocking.
    ///
    /// `out` must be exactly `slot_size` bytes. Returns the number of
    /// slots read: 0 when the FIFO is empty, 1 on success (which also
    /// signals the `writable` semaphore).
    pub fn fifo_try_read(&mut self, id: FifoId, out: &mut [u8]) -> Result<usize, Error> {
        let Self {
            fifos, sems, tasks, ..
        } = self;
        let fifo = fifos
            .get_mut(id.index, id.generation)
            .ok_or(Error::NotFound)?;
        let read = fifo.read_slot(out)?;
        if read == 1 {
            match sems.get_mut(fifo.writable.index, fifo.writable.generation) {
                Some(sem) => signal(sem, tasks),
                None => debug!("fifo read: writable semaphore gone"),
            }
        }
        Ok(read)
    }

    /// The semaphore a task waits on before a blocking read.
    pub fn fifo_readable_sem(&self, id: FifoId) -> Result<SemId, Error> {
        self.fifo_ref(id).map(|f| f.readable)
    }

    /// The semaphore a task waits on before a blocking write.
    pub fn fifo_writable_sem(&self, id: FifoId) -> Result<SemId, Error> {
        self.fifo_ref(id).map(|f| f.writable)
    }

    /// Number of occupied slots.
    pub fn fifo_used_slots(&self, id: FifoId) -> Result<usize, Error> {
        self.fifo_ref(id).map(|f| f.used_slots)
    }

    /// Total number of slots.
    pub fn fifo_capacity(&self, id: FifoId) -> Result<usize, Error> {
        self.fifo_ref(id).map(|f| f.capacity)
    }

    /// Size of one slot in bytes.
    pub fn fifo_slot_size(&self, id: FifoId) -> Result<usize, Error> {
        self.fifo_ref(id).map(|f| f.slot_size)
    }

    pub fn fifo_is_empty(&self, id: FifoId) -> Result<bool, Error> {
        self.fifo_ref(id).map(|f| f.used_slots == 0)
    }

    pub fn fifo_is_full(&self, id: FifoId) -> Result<bool, Error> {
        self.fifo_ref(id).map(|f| f.used_slots == f.capacity)
    }

    fn fifo_ref(&self, id: FifoId) -> Result<&Fifo, Error> {
        self.fifos.get(id.index, id.generation).ok_or(Error::NotFound)
    }
}
