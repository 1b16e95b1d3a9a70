//! Host-facing processor: lifecycle, port management, and the per-block
//! MIDI drain.

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use attacca_bridge::{BridgeChannel, BridgeManager, ChannelState, MidiEvent};

use crate::config::{BridgeConfig, ChannelConfig};

/// Owns the bridge for one plugin instance.
///
/// The host shell calls `prepare`/`release` from its lifecycle callbacks,
/// `process_block` from the audio callback, and everything else from its
/// control/UI threads.
pub struct BridgeProcessor {
    manager: BridgeManager,
    port: AtomicU16,
    connected: AtomicBool,
}

impl BridgeProcessor {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        let channels = config
            .channels
            .iter()
            .cloned()
            .map(|mut channel| {
                channel.clamp();
                Arc::new(BridgeChannel::new(channel_state(&channel)))
            })
            .collect();

        Self {
            manager: BridgeManager::new(channels),
            port: AtomicU16::new(config.port),
            connected: AtomicBool::new(false),
        }
    }

    /// Host is about to start streaming: bind the configured port.
    ///
    /// Sample rate and block size are accepted for interface parity with
    /// the host callback; the bridge emits block-relative offsets of 0 and
    /// needs neither.
    pub fn prepare(&self, _sample_rate: f64, _block_size: usize) {
        let port = self.port.load(Ordering::SeqCst);
        self.try_connect(port);
    }

    /// Host stopped streaming: tear the binding down.
    pub fn release(&self) {
        self.manager.unbind();
        self.connected.store(false, Ordering::SeqCst);
        info!("bridge released");
    }

    /// Bind `port`, replacing any existing binding, and record the result
    /// in the `connected` flag.
    pub fn try_connect(&self, port: u16) -> bool {
        self.port.store(port, Ordering::SeqCst);
        let connected = match self.manager.bind(port) {
            Ok(()) => true,
            Err(e) => {
                warn!("could not listen on port {}: {}", port, e);
                false
            }
        };
        self.connected.store(connected, Ordering::SeqCst);
        connected
    }

    /// Port parameter changed: stop the old listener, start a new one.
    pub fn set_port(&self, port: u16) -> bool {
        self.try_connect(port)
    }

    pub fn port(&self) -> u16 {
        self.port.load(Ordering::SeqCst)
    }

    /// Whether the last bind attempt succeeded and the listener is up.
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Audio callback: move every channel's pending MIDI into `midi_out`,
    /// in slot order, emitting all-notes-off first for any channel whose
    /// output mapping changed since the previous block.
    ///
    /// `midi_out` should be preallocated and reused across blocks; this
    /// method only appends.
    pub fn process_block(&self, midi_out: &mut Vec<MidiEvent>) {
        for channel in self.manager.channels() {
            channel.drain_into(midi_out);
        }
    }

    pub fn num_channels(&self) -> usize {
        self.manager.channels().len()
    }

    pub fn channel(&self, slot: usize) -> Option<&Arc<BridgeChannel>> {
        self.manager.channel(slot)
    }

    pub fn manager(&self) -> &BridgeManager {
        &self.manager
    }

    /// Push a restored configuration into the live channel state. If the
    /// port changed while listening, the listener is rebound.
    pub fn apply_config(&self, config: &BridgeConfig) {
        for (channel, restored) in self.manager.channels().iter().zip(&config.channels) {
            let state = channel.state();
            state.set_address(restored.address.clone());
            state.set_input_min(restored.input_min);
            state.set_input_max(restored.input_max);
            state.set_output_channel(restored.output_channel);
            state.set_output_number(restored.output_number);
            state.set_kind(restored.kind);
            state.set_muted(restored.muted);
        }

        let previous = self.port.swap(config.port, Ordering::SeqCst);
        if previous != config.port && self.manager.is_bound() {
            self.try_connect(config.port);
        }
    }

    /// Snapshot the live state for host persistence.
    pub fn capture_config(&self) -> BridgeConfig {
        BridgeConfig {
            port: self.port.load(Ordering::SeqCst),
            channels: self
                .manager
                .channels()
                .iter()
                .map(|channel| {
                    let state = channel.state();
                    ChannelConfig {
                        address: state.address(),
                        input_min: state.input_min(),
                        input_max: state.input_max(),
                        output_channel: state.output_channel(),
                        output_number: state.output_number(),
                        kind: state.kind(),
                        muted: state.muted(),
                    }
                })
                .collect(),
        }
    }
}

impl Default for BridgeProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn channel_state(config: &ChannelConfig) -> ChannelState {
    let state = ChannelState::new(
        config.address.clone(),
        config.input_min,
        config.input_max,
        config.output_channel,
        config.output_number,
        config.kind,
    );
    state.set_muted(config.muted);
    state
}
