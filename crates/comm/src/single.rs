//! Single-rank backend
//!
//! Every collective degenerates to the identity. Gathers return the local
//! buffer itself, so callers never need a separate one-rank code path.

use crate::communicator::{Communicator, GatherLayout};

/// The only rank of a one-process run
///
/// # Examples
///
/// ```
/// use comm::{Communicator, SingleProcess};
///
/// let comm = SingleProcess;
/// assert_eq!(comm.sum_f64(2.5), 2.5);
/// assert_eq!(comm.gather_varying(vec![1, 2], None), Some(vec![1, 2]));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn num_ranks(&self) -> usize {
        1
    }

    fn barrier(&self) {}

    fn sum_f64(&self, local: f64) -> f64 {
        local
    }

    fn sum_usize(&self, local: usize) -> usize {
        local
    }

    fn max_f64(&self, local: f64) -> f64 {
        local
    }

    fn max_u64(&self, local: u64) -> u64 {
        local
    }

    fn gather_usize(&self, local: usize) -> Option<Vec<usize>> {
        Some(vec![local])
    }

    fn gather_varying<T: Clone + Send + 'static>(
        &self,
        local: Vec<T>,
        layout: Option<&GatherLayout>,
    ) -> Option<Vec<T>> {
        if let Some(layout) = layout {
            assert_eq!(
                layout.total(),
                local.len(),
                "gather layout does not match the local buffer"
            );
        }
        Some(local)
    }
}
