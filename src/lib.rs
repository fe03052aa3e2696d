//! SIEVE cache-eviction policy.
//!
//! [`SievePolicy`] decides which key a cache should drop when it is full and
//! can persist its exact state, scan hand included, to any byte stream. It
//! holds no values and does no locking; callers that share a policy across
//! threads wrap it in their own lock.

mod codec;
mod error;
mod intrusive_dll;
mod replacement;
#[cfg(test)]
mod test_utils;

pub use codec::{read_int, write_int, FORMAT_VERSION};
pub use error::{PolicyError, Result};
pub use replacement::SievePolicy;
