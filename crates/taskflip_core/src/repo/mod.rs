//! Persistence adapter and typed task collection contract.
//!
//! # Responsibility
//! - Define the synchronous key-value store seam (`KeyValueStore`).
//! - Keep storage keys and the stored collection shape centrally declared.
//!
//! # Invariants
//! - Both collections are rewritten together on every save.
//! - Reads never fail outward: absent or malformed entries load as empty.

pub mod kv_store;
pub mod task_repo;
