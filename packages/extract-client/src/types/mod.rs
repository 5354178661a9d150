//! Wire and domain types.

pub mod clause;
pub mod filter;
pub mod job;
pub mod schema;
pub mod search;
pub mod slice;
