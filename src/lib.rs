//! Distributed output, input and assembly of generated graphs.
//!
//! Every rank owns a contiguous range of vertices together with their
//! outgoing edges. [`io`] writes such slices into one shared file or one file
//! per rank and reads files back in rank-partitioned windows; [`assembly`]
//! turns the local edges into a vertex distribution and a CSR structure.

pub mod api;
pub mod assembly;
pub mod comm;
pub mod error;
pub mod graph;
pub mod io;
pub mod memory_manager;
pub mod types;
