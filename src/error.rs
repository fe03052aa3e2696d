//! Error type shared by the policy and its codec.

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PolicyError>;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("corrupt data: {0}")]
    CorruptData(String),
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,
    #[error("save cancelled")]
    Cancelled,
    #[error("i/o error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for PolicyError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            PolicyError::UnexpectedEndOfStream
        } else {
            PolicyError::Io(err)
        }
    }
}
