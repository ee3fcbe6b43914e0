//! The collective interface shared by all rank backends

/// Rank that receives gathered buffers
pub const ROOT: usize = 0;

/// Per-rank counts and offsets into a gathered buffer
///
/// Built on the root rank from the counts returned by
/// [`Communicator::gather_usize`]. Offsets are the exclusive prefix sum of
/// the counts, so records end up in rank order, then local order.
///
/// # Examples
///
/// ```
/// use comm::GatherLayout;
///
/// let layout = GatherLayout::from_counts(vec![2, 0, 3]);
/// assert_eq!(layout.offsets, vec![0, 2, 2]);
/// assert_eq!(layout.total(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherLayout {
    /// Number of records contributed by each rank
    pub counts: Vec<usize>,
    /// Start of each rank's records in the gathered buffer
    pub offsets: Vec<usize>,
}

impl GatherLayout {
    pub fn from_counts(counts: Vec<usize>) -> Self {
        let offsets = counts
            .iter()
            .scan(0usize, |acc, &n| {
                let start = *acc;
                *acc += n;
                Some(start)
            })
            .collect();
        Self { counts, offsets }
    }

    /// Total number of records across all ranks
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Collective operations over a fixed set of ranks
///
/// Reductions return the same value on every rank. Gathers return `Some`
/// only on [`ROOT`]; every other rank gets `None`.
pub trait Communicator {
    /// Index of the calling rank in `0..num_ranks()`
    fn rank(&self) -> usize;

    /// Number of participating ranks
    fn num_ranks(&self) -> usize;

    fn is_root(&self) -> bool {
        self.rank() == ROOT
    }

    /// Block until every rank has reached the barrier
    fn barrier(&self);

    /// Global sum of a float contribution
    fn sum_f64(&self, local: f64) -> f64;

    /// Global sum of a count contribution
    fn sum_usize(&self, local: usize) -> usize;

    /// Global maximum of a float contribution
    fn max_f64(&self, local: f64) -> f64;

    /// Global maximum of an integer contribution, exact over the whole `u64` range
    fn max_u64(&self, local: u64) -> u64;

    /// Gather one count per rank onto the root, in rank order
    fn gather_usize(&self, local: usize) -> Option<Vec<usize>>;

    /// Gather variable-length buffers onto the root
    ///
    /// The root passes the layout it built from the gathered counts; other
    /// ranks pass `None`. A root without a layout places the buffers back to
    /// back in rank order.
    fn gather_varying<T: Clone + Send + 'static>(
        &self,
        local: Vec<T>,
        layout: Option<&GatherLayout>,
    ) -> Option<Vec<T>>;
}
