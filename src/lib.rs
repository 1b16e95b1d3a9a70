//! # Attacca - OSC to MIDI bridge
//!
//! Bridges Open Sound Control input to MIDI output inside a real-time
//! audio host: a worker thread receives OSC over UDP, converts accepted
//! messages to MIDI under per-channel mapping rules, and hands them to
//! the audio callback through lock-free per-channel queues.
//!
//! ## Architecture
//!
//! Umbrella crate coordinating:
//! - **attacca-bridge** - the bridging core (channel state, conversion,
//!   event queues, UDP receiver, dispatch)
//! - **attacca-plugin** - the host-facing boundary (lifecycle, block
//!   drain, configuration and persistence keys)
//!
//! ## Quick Start
//!
//! ```no_run
//! use attacca::prelude::*;
//!
//! let processor = BridgeProcessor::new();
//! processor.prepare(48_000.0, 512);
//!
//! // Audio callback, once per block:
//! let mut block_midi: Vec<MidiEvent> = Vec::with_capacity(512);
//! processor.process_block(&mut block_midi);
//! ```

/// Re-export of the bridge core for direct access
pub use attacca_bridge as bridge;
/// Re-export of the plugin boundary for direct access
pub use attacca_plugin as plugin;

// Core types
pub use attacca_bridge::{
    convert, BridgeChannel, BridgeManager, ChannelState, Error as BridgeError, LiveValue,
    MessageKind, MidiEvent, MidiEventQueue, OscMessage, OscPacket, OscType,
};

// Host-facing types
pub use attacca_plugin::{
    BridgeConfig, BridgeProcessor, ChannelConfig, Error as PluginError, DEFAULT_PORT, NUM_CHANNELS,
};

pub mod prelude {
    pub use crate::{
        BridgeChannel, BridgeConfig, BridgeManager, BridgeProcessor, ChannelConfig, ChannelState,
        LiveValue, MessageKind, MidiEvent, OscMessage, OscType,
    };
}
