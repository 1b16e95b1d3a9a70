//! Error types for the plugin integration boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown parameter key: {0}")]
    UnknownKey(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
