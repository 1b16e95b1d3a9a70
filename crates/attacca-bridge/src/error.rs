//! Error types for the bridge core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OSC receiver thread not running")]
    ReceiverGone,
}

pub type Result<T> = std::result::Result<T, Error>;
