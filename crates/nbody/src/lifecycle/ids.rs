use comm::Communicator;
use rayon::prelude::*;

use crate::system::ParticleView;

/// Stamps every local particle with its slot index and owning rank
///
/// Also resets the decomposition flags. Running it twice without a change
/// in particle count gives the same assignment.
pub fn refresh_local_ids<V: ParticleView, C: Communicator>(view: &mut V, comm: &C) {
    let rank = comm.rank();
    view.particles_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, p)| {
            p.id_local = i;
            p.myrank = rank;
            p.in_domain = true;
            p.is_sent = false;
        });
}
