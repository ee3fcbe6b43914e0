//! Collective operations across ranks
//!
//! Every rank owns a disjoint slice of the global particle set. The lifecycle
//! routines only ever talk to other ranks through the [`Communicator`] trait:
//! barriers, sum/max reductions, a gather of one count per rank, and a
//! variable-length gather that assembles records on the root rank.
//!
//! Two backends are provided:
//! - [`SingleProcess`]: a single rank; gathers hand the local buffer back
//! - [`ThreadComm`]: several ranks living on OS threads of one process
//!
//! Every rank must issue the same collectives in the same order. A rank that
//! skips one leaves its peers waiting forever.

pub mod communicator;
pub mod single;
pub mod threaded;


pub use communicator::{Communicator, GatherLayout, ROOT};
pub use single::SingleProcess;
pub use threaded::ThreadComm;
