use thiserror::Error;

use crate::particle::ParticleId;

/// Failures of the per-step lifecycle routines
///
/// Everything except `Io` is a broken contract with the collision solver or
/// a peer rank. Any of them is fatal for the run.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(
        "particle {id} at local index {index} is flagged for merging but has no same-id partner"
    )]
    MissingMergePartner { id: ParticleId, index: usize },

    #[error(
        "particle {id} at local index {index} has {partners} same-id partners; \
         only pairwise merges are supported"
    )]
    ChainedMerge {
        id: ParticleId,
        index: usize,
        partners: usize,
    },

    #[error("merge partner of particle {id} at local index {index} is not marked dead")]
    PartnerNotDead { id: ParticleId, index: usize },

    #[error("merge partners with id {id} do not share a position")]
    MergePositionMismatch { id: ParticleId },

    #[error("{failed_ranks} peer rank(s) failed during a collective step")]
    PeerFailure { failed_ranks: usize },

    #[error("failed to write removal log")]
    Io(#[from] std::io::Error),
}
