//! Key codecs and logging setup shared by the unit tests.

use std::io::{Read, Write};

use crate::{
    codec::{read_int, write_int},
    error::{PolicyError, Result},
};

pub fn write_i32_key<W: Write>(key: &i32, writer: &mut W) -> Result<()> {
    write_int(writer, *key)
}

pub fn read_i32_key<R: Read>(reader: &mut R) -> Result<i32> {
    read_int(reader)
}

/// Length-prefixed UTF-8.
#[allow(clippy::ptr_arg)]
pub fn write_str_key<W: Write>(key: &String, writer: &mut W) -> Result<()> {
    let len = i32::try_from(key.len())
        .map_err(|_| PolicyError::InvalidArgument(format!("key of {} bytes", key.len())))?;
    write_int(writer, len)?;
    writer.write_all(key.as_bytes())?;
    Ok(())
}

pub fn read_str_key<R: Read>(reader: &mut R) -> Result<String> {
    let len = usize::try_from(read_int(reader)?)
        .map_err(|_| PolicyError::CorruptData("negative key length".to_string()))?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| PolicyError::CorruptData(e.to_string()))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
