//! OSC-to-MIDI bridging core.
//!
//! Receives OSC over UDP on a worker thread, converts accepted messages to
//! MIDI events under per-channel mapping rules, and hands them to a
//! real-time audio callback through lock-free per-channel queues.
//!
//! # Architecture
//!
//! - **`ChannelState`** — struct-of-atomics mapping configuration plus the
//!   live value/version pair polled by activity displays
//! - **`MidiEventQueue`** — SPSC ring buffer between the receiver and the
//!   audio callback
//! - **`BridgeChannel`** — one OSC-address-to-MIDI-target mapping: accept,
//!   normalize, convert, enqueue
//! - **`BridgeManager`** — the channel registry and UDP receiver; routes
//!   each inbound message to every matching channel
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use attacca_bridge::{BridgeChannel, BridgeManager, ChannelState, MessageKind};
//!
//! let channel = Arc::new(BridgeChannel::new(ChannelState::new(
//!     "/1/value",
//!     0.0,
//!     1.0,
//!     1,
//!     60,
//!     MessageKind::Note,
//! )));
//! let manager = BridgeManager::new(vec![channel]);
//! manager.bind(6666)?;
//!
//! // Audio callback, once per block:
//! let mut block_midi = Vec::with_capacity(512);
//! for channel in manager.channels() {
//!     channel.drain_into(&mut block_midi);
//! }
//! # Ok::<(), attacca_bridge::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

pub use channel::{BridgeChannel, ChannelObserver};
pub use convert::{convert, MessageKind};
pub use event::MidiEvent;
pub use manager::{BridgeManager, GlobalObserver};
pub use queue::{MidiEventQueue, DEFAULT_QUEUE_CAPACITY};
pub use state::{ChannelState, LiveValue};

// Re-export essential upstream types (users shouldn't need to import
// midi-msg or rosc directly).
pub use midi_msg::{Channel, ChannelVoiceMsg, ControlChange};
pub use rosc::{OscMessage, OscPacket, OscType};

pub(crate) mod channel;
pub(crate) mod convert;
pub(crate) mod event;
pub(crate) mod manager;
pub(crate) mod queue;
pub(crate) mod receiver;
pub(crate) mod state;
