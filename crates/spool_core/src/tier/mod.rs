//! Where payloads live: a bounded in-memory staging area and one file per
//! entry on disk.

mod disk;
mod memory;

pub use disk::DiskTier;
pub use memory::MemoryTier;
