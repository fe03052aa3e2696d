//! Cache replacement policies.
//!
//! # Available Policies
//!
//! - **SIEVE**: insertion-ordered ring with a persistent scan hand. Hits set a
//!   visited bit, eviction sweeps from the hand towards the head clearing bits
//!   until it finds an unvisited entry. See the SIEVE paper (NSDI '24).
//!
//! # Interface
//!
//! A policy tracks keys only; the cache that owns the values calls
//! `access()` on every reference and drops whatever key comes back.

mod sieve;
pub use sieve::SievePolicy;
pub(crate) use sieve::index_size;
