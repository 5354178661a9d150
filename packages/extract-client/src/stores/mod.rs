//! Collaborator implementations.

pub mod memory;

pub use memory::{MemoryFilterStore, MemorySchema};
