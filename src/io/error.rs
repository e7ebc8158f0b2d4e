//! Custom error types for the I/O module.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("could not open file read-write: {0}")]
    Open(#[source] std::io::Error),

    #[error("file is empty, nothing to map")]
    Empty,

    #[error("could not map file: {0}")]
    Map(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IoError>;
