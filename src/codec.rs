//! Byte-stream persistence for [`SievePolicy`].
//!
//! Layout, all integers 4-byte little-endian and non-negative:
//!
//! ```text
//! version:u8 | capacity:i32 | count:i32 | count * (visited:u8 | key) | [hand:i32]
//! ```
//!
//! Entries are written head to tail. The hand position is the zero-based
//! offset of the hand entry from the head and is only written when the hand
//! is set. Keys are encoded by caller-supplied functions the codec never
//! looks inside.

use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hash},
    io::{self, Read, Write},
    sync::atomic::{AtomicBool, Ordering},
};

use tracing::{debug, warn};

use crate::{
    error::{PolicyError, Result},
    replacement::{index_size, SievePolicy},
};

pub const FORMAT_VERSION: u8 = 0;

/// Upper bound on slots reserved up front while loading; a corrupt count
/// must not turn into a huge allocation before any entry has been read.
const MAX_PRELOAD_RESERVE: usize = 1 << 16;

/// Writes `value` as 4 little-endian bytes. Negative values are rejected.
pub fn write_int<W: Write>(writer: &mut W, value: i32) -> Result<()> {
    if value < 0 {
        return Err(PolicyError::InvalidArgument(format!(
            "cannot encode negative integer {value}"
        )));
    }
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Reads 4 little-endian bytes as an `i32`.
pub fn read_int<R: Read>(reader: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn write_len<W: Write>(writer: &mut W, value: usize) -> Result<()> {
    let value = i32::try_from(value).map_err(|_| {
        PolicyError::InvalidArgument(format!("{value} does not fit a 32-bit integer"))
    })?;
    write_int(writer, value)
}

fn read_len<R: Read>(reader: &mut R, field: &str) -> Result<usize> {
    let value = read_int(reader)?;
    usize::try_from(value).map_err(|_| PolicyError::CorruptData(format!("negative {field}: {value}")))
}

fn write_byte<W: Write>(writer: &mut W, value: u8) -> Result<()> {
    writer.write_all(&[value])?;
    Ok(())
}

fn read_byte<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Like [`read_int`], but a stream that ends cleanly before the first byte
/// yields `None`.
fn read_trailing_int<R: Read>(reader: &mut R) -> Result<Option<i32>> {
    let mut buf = [0u8; 4];
    let first = loop {
        match reader.read(&mut buf[..1]) {
            Ok(n) => break n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    };
    if first == 0 {
        return Ok(None);
    }
    reader.read_exact(&mut buf[1..])?;
    Ok(Some(i32::from_le_bytes(buf)))
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
}

impl<K, S> SievePolicy<K, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Serializes the policy to `writer`, encoding each key with `key_writer`.
    ///
    /// `cancel` is polled before every entry; once set, the save stops with
    /// [`PolicyError::Cancelled`] and the bytes written so far are garbage.
    /// The policy itself is never modified. Errors from `key_writer` are
    /// returned as-is.
    pub fn save<W, F, E>(
        &self,
        writer: &mut W,
        mut key_writer: F,
        cancel: Option<&AtomicBool>,
    ) -> std::result::Result<(), E>
    where
        W: Write,
        F: FnMut(&K, &mut W) -> std::result::Result<(), E>,
        E: From<PolicyError>,
    {
        write_byte(writer, FORMAT_VERSION)?;
        write_len(writer, self.capacity())?;
        write_len(writer, self.len())?;

        let mut hand_position = None;
        for (position, (entry, is_hand)) in self.walk().enumerate() {
            if is_cancelled(cancel) {
                debug!(written = position, "policy save cancelled");
                return Err(PolicyError::Cancelled.into());
            }
            write_byte(writer, u8::from(entry.visited))?;
            key_writer(&entry.key, writer)?;
            if is_hand {
                hand_position = Some(position);
            }
        }

        if let Some(position) = hand_position {
            write_len(writer, position)?;
        }
        debug!(
            capacity = self.capacity(),
            count = self.len(),
            hand = ?hand_position,
            "saved sieve policy"
        );
        Ok(())
    }

    /// Restores a policy written by [`SievePolicy::save`], hashing keys with
    /// `hasher`. Errors from `key_reader` are returned as-is.
    pub fn load_with_hasher<R, F, E>(
        reader: &mut R,
        mut key_reader: F,
        hasher: S,
    ) -> std::result::Result<Self, E>
    where
        R: Read,
        F: FnMut(&mut R) -> std::result::Result<K, E>,
        E: From<PolicyError>,
    {
        let version = read_byte(reader)?;
        if version != FORMAT_VERSION {
            return Err(
                PolicyError::CorruptData(format!("unsupported format version {version}")).into(),
            );
        }
        let capacity = read_len(reader, "capacity")?;
        let count = read_len(reader, "entry count")?;
        let index_slots = index_size(capacity)?;
        if count > capacity {
            return Err(PolicyError::CorruptData(format!(
                "entry count {count} exceeds capacity {capacity}"
            ))
            .into());
        }

        let reserve = count.min(MAX_PRELOAD_RESERVE);
        let mut policy = Self::with_reserved(
            capacity,
            reserve,
            index_slots.min(reserve + reserve / 3),
            hasher,
        );
        for position in 0..count {
            let visited = match read_byte(reader)? {
                0 => false,
                1 => true,
                other => {
                    return Err(PolicyError::CorruptData(format!(
                        "entry {position} has visited flag {other}"
                    ))
                    .into())
                }
            };
            let key = key_reader(reader)?;
            if !policy.push_tail(key, visited) {
                return Err(
                    PolicyError::CorruptData(format!("entry {position} repeats a key")).into(),
                );
            }
        }

        if count > 0 {
            if let Some(position) = read_trailing_int(reader)? {
                let placed = usize::try_from(position)
                    .map(|position| policy.set_hand_position(position))
                    .unwrap_or(false);
                if !placed {
                    warn!(position, count, "hand position out of range, starting from tail");
                }
            }
        }
        debug!(
            capacity,
            count,
            hand = ?policy.hand_position(),
            "loaded sieve policy"
        );
        Ok(policy)
    }
}

impl<K> SievePolicy<K>
where
    K: Eq + Hash + Clone,
{
    /// Restores a policy written by [`SievePolicy::save`].
    pub fn load<R, F, E>(reader: &mut R, key_reader: F) -> std::result::Result<Self, E>
    where
        R: Read,
        F: FnMut(&mut R) -> std::result::Result<K, E>,
        E: From<PolicyError>,
    {
        Self::load_with_hasher(reader, key_reader, RandomState::new())
    }
}
