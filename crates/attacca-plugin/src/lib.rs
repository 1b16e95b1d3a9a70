//! Plugin integration boundary for the attacca bridge.
//!
//! The bridge core knows nothing about hosts; this crate is the thin,
//! host-shaped surface around it: lifecycle (`prepare`/`release`), the
//! per-block MIDI drain, port rebinding, and flat string-keyed
//! configuration for save/restore.

pub mod error;
pub use error::{Error, Result};

pub use config::{BridgeConfig, ChannelConfig, DEFAULT_PORT, NUM_CHANNELS};
pub use processor::BridgeProcessor;

pub(crate) mod config;
pub(crate) mod processor;
