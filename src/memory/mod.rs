//! In-process collaborators.
//!
//! Ready-made [`Registry`](crate::Registry) and [`Backlog`](crate::Backlog)
//! implementations for embedders that keep everything in memory.

mod backlog;
mod registry;

pub use backlog::MemoryBacklog;
pub use registry::StaticRegistry;
