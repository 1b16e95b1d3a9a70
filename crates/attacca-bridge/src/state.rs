//! Per-channel mapping state shared across the receiver, audio, and UI
//! threads.
//!
//! Every field is individually atomic: the control thread mutates through
//! the typed setters while the receiver and audio threads read, and no
//! reader can observe a torn struct or take a lock. The OSC address is the
//! one non-scalar field; it lives behind an `ArcSwap` so address matching
//! on the receiver thread stays wait-free.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use atomic_float::AtomicF32;

use crate::convert::MessageKind;

/// Snapshot of the last received raw value.
///
/// `version` strictly increases on every accepted message, so pollers
/// detect new data by comparing versions, never values (values can
/// repeat).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LiveValue {
    pub raw: f32,
    pub version: u64,
}

/// Mapping configuration and live value for one bridge channel.
pub struct ChannelState {
    address: ArcSwap<String>,
    input_min: AtomicF32,
    input_max: AtomicF32,
    /// 1-based MIDI channel, clamped to 1..=16.
    output_channel: AtomicU8,
    /// Note or controller number, clamped to 0..=127.
    output_number: AtomicU8,
    kind: AtomicU8,
    muted: AtomicBool,
    /// Set when the MIDI target (channel, number, or kind) changes;
    /// cleared only by the audio-thread drain after it has emitted a
    /// compensating all-notes-off.
    midi_mapping_changed: AtomicBool,
    raw_value: AtomicF32,
    version: AtomicU64,
}

impl ChannelState {
    pub fn new(
        address: impl Into<String>,
        input_min: f32,
        input_max: f32,
        output_channel: u8,
        output_number: u8,
        kind: MessageKind,
    ) -> Self {
        Self {
            address: ArcSwap::new(Arc::new(address.into())),
            input_min: AtomicF32::new(input_min),
            input_max: AtomicF32::new(input_max),
            output_channel: AtomicU8::new(output_channel.clamp(1, 16)),
            output_number: AtomicU8::new(output_number.min(127)),
            kind: AtomicU8::new(kind as u8),
            muted: AtomicBool::new(false),
            midi_mapping_changed: AtomicBool::new(false),
            raw_value: AtomicF32::new(0.0),
            version: AtomicU64::new(0),
        }
    }

    // Getters

    pub fn address(&self) -> String {
        self.address.load().as_str().to_owned()
    }

    #[inline]
    pub fn matches(&self, address: &str) -> bool {
        self.address.load().as_str() == address
    }

    #[inline]
    pub fn input_min(&self) -> f32 {
        self.input_min.load(Ordering::Acquire)
    }

    #[inline]
    pub fn input_max(&self) -> f32 {
        self.input_max.load(Ordering::Acquire)
    }

    #[inline]
    pub fn output_channel(&self) -> u8 {
        self.output_channel.load(Ordering::Acquire)
    }

    #[inline]
    pub fn output_number(&self) -> u8 {
        self.output_number.load(Ordering::Acquire)
    }

    #[inline]
    pub fn kind(&self) -> MessageKind {
        MessageKind::from_u8(self.kind.load(Ordering::Acquire))
    }

    #[inline]
    pub fn muted(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }

    // Setters (control thread)

    pub fn set_address(&self, address: impl Into<String>) {
        self.address.store(Arc::new(address.into()));
    }

    pub fn set_input_min(&self, value: f32) {
        self.input_min.store(value, Ordering::Release);
    }

    pub fn set_input_max(&self, value: f32) {
        self.input_max.store(value, Ordering::Release);
    }

    pub fn set_output_channel(&self, channel: u8) {
        let channel = channel.clamp(1, 16);
        if self.output_channel.swap(channel, Ordering::AcqRel) != channel {
            self.midi_mapping_changed.store(true, Ordering::Release);
        }
    }

    pub fn set_output_number(&self, number: u8) {
        let number = number.min(127);
        if self.output_number.swap(number, Ordering::AcqRel) != number {
            self.midi_mapping_changed.store(true, Ordering::Release);
        }
    }

    pub fn set_kind(&self, kind: MessageKind) {
        if self.kind.swap(kind as u8, Ordering::AcqRel) != kind as u8 {
            self.midi_mapping_changed.store(true, Ordering::Release);
        }
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Release);
    }

    /// Consume the mapping-changed flag. Audio thread only; the caller
    /// must emit an all-notes-off for the current output channel when
    /// this returns true.
    #[inline]
    pub fn take_mapping_changed(&self) -> bool {
        self.midi_mapping_changed.swap(false, Ordering::AcqRel)
    }

    // Live value

    /// Record an accepted raw value. Receiver thread only.
    pub fn update_live(&self, raw: f32) {
        self.raw_value.store(raw, Ordering::Release);
        self.version.fetch_add(1, Ordering::Release);
    }

    /// Wait-free snapshot for activity displays.
    pub fn live_value(&self) -> LiveValue {
        LiveValue {
            raw: self.raw_value.load(Ordering::Acquire),
            version: self.version.load(Ordering::Acquire),
        }
    }

    /// Map a raw value into [0, 1] against the configured input range.
    ///
    /// Equal bounds are a degenerate map: the result is a constant 0.0
    /// (biased toward note-off) rather than a division by zero. Inverted
    /// bounds (`min > max`) invert the mapping.
    pub fn normalize(&self, raw: f32) -> f32 {
        let min = self.input_min();
        let max = self.input_max();
        if min == max {
            return 0.0;
        }
        ((raw - min) / (max - min)).clamp(0.0, 1.0)
    }
}
