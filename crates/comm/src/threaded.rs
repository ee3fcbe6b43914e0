//! In-process multi-rank backend
//!
//! Each rank runs on its own OS thread and holds a [`ThreadComm`] handle to a
//! shared hub. A collective is two barrier phases: every rank deposits its
//! contribution into its slot, waits, reads what it needs, and waits again
//! before the slots can be reused by the next collective.
//!
//! The API mirrors a message-passing runtime so a network backend can be
//! dropped in behind the same [`Communicator`] trait.

use std::any::Any;
use std::sync::{Arc, Barrier, Mutex, PoisonError};

use crate::communicator::{Communicator, GatherLayout, ROOT};

type Slot = Option<Box<dyn Any + Send>>;

struct Hub {
    barrier: Barrier,
    slots: Mutex<Vec<Slot>>,
}

/// Handle for one rank of an in-process group
///
/// # Examples
///
/// ```
/// use comm::{Communicator, ThreadComm};
///
/// let ranks = ThreadComm::create(3);
/// let totals: Vec<f64> = std::thread::scope(|s| {
///     let handles: Vec<_> = ranks
///         .into_iter()
///         .map(|comm| s.spawn(move || comm.sum_f64(comm.rank() as f64 + 1.0)))
///         .collect();
///     handles.into_iter().map(|h| h.join().unwrap()).collect()
/// });
///
/// assert_eq!(totals, vec![6.0, 6.0, 6.0]);
/// ```
pub struct ThreadComm {
    rank: usize,
    size: usize,
    hub: Arc<Hub>,
}

impl ThreadComm {
    /// Creates the handles for a group of `n_ranks` ranks
    ///
    /// Handle `i` belongs to rank `i`; move each into its own thread.
    pub fn create(n_ranks: usize) -> Vec<ThreadComm> {
        assert!(n_ranks > 0, "a rank group needs at least one rank");

        let hub = Arc::new(Hub {
            barrier: Barrier::new(n_ranks),
            slots: Mutex::new((0..n_ranks).map(|_| None).collect()),
        });
        tracing::debug!("created in-process rank group of {} ranks", n_ranks);

        (0..n_ranks)
            .map(|rank| ThreadComm {
                rank,
                size: n_ranks,
                hub: Arc::clone(&hub),
            })
            .collect()
    }

    /// Deposit `value`, synchronize, let `read` inspect every slot, synchronize
    fn exchange<T, R>(&self, value: T, read: impl FnOnce(&mut [Slot]) -> R) -> R
    where
        T: Any + Send,
    {
        self.lock_slots()[self.rank] = Some(Box::new(value));
        self.hub.barrier.wait();

        let result = read(&mut self.lock_slots());

        self.hub.barrier.wait();
        result
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, Vec<Slot>> {
        self.hub.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn all_reduce<T, F>(&self, local: T, combine: F) -> T
    where
        T: Any + Send + Copy,
        F: Fn(T, T) -> T,
    {
        self.exchange(local, |slots| {
            slots
                .iter()
                .enumerate()
                .map(|(rank, slot)| *contribution::<T>(slot.as_deref(), rank))
                .reduce(&combine)
                .unwrap_or(local)
        })
    }
}

/// Contribution of `rank`, which must be of the type every rank agreed on
fn contribution<T: Any>(slot: Option<&(dyn Any + Send)>, rank: usize) -> &T {
    slot.and_then(|value| value.downcast_ref::<T>())
        .unwrap_or_else(|| mismatch(rank))
}

fn mismatch(rank: usize) -> ! {
    panic!("collective mismatch: rank {rank} contributed a different operation")
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_ranks(&self) -> usize {
        self.size
    }

    fn barrier(&self) {
        self.hub.barrier.wait();
    }

    fn sum_f64(&self, local: f64) -> f64 {
        self.all_reduce(local, |a, b| a + b)
    }

    fn sum_usize(&self, local: usize) -> usize {
        self.all_reduce(local, |a, b| a + b)
    }

    fn max_f64(&self, local: f64) -> f64 {
        self.all_reduce(local, f64::max)
    }

    fn max_u64(&self, local: u64) -> u64 {
        self.all_reduce(local, u64::max)
    }

    fn gather_usize(&self, local: usize) -> Option<Vec<usize>> {
        let is_root = self.rank == ROOT;
        self.exchange(local, |slots| {
            is_root.then(|| {
                slots
                    .iter()
                    .enumerate()
                    .map(|(rank, slot)| *contribution::<usize>(slot.as_deref(), rank))
                    .collect()
            })
        })
    }

    fn gather_varying<T: Clone + Send + 'static>(
        &self,
        local: Vec<T>,
        layout: Option<&GatherLayout>,
    ) -> Option<Vec<T>> {
        let is_root = self.rank == ROOT;
        self.exchange(local, |slots| {
            if !is_root {
                return None;
            }

            let buffers: Vec<Vec<T>> = slots
                .iter_mut()
                .enumerate()
                .map(|(rank, slot)| {
                    slot.take()
                        .and_then(|value| value.downcast::<Vec<T>>().ok())
                        .map(|buffer| *buffer)
                        .unwrap_or_else(|| mismatch(rank))
                })
                .collect();

            let mut global = Vec::with_capacity(buffers.iter().map(Vec::len).sum());
            for (rank, buffer) in buffers.into_iter().enumerate() {
                if let Some(layout) = layout {
                    assert_eq!(
                        layout.counts[rank],
                        buffer.len(),
                        "gather layout count for rank {rank} does not match its buffer"
                    );
                    assert_eq!(layout.offsets[rank], global.len());
                }
                global.extend(buffer);
            }
            Some(global)
        })
    }
}
