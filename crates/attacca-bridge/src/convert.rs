//! Conversion from normalized control values to MIDI events.

use serde::{Deserialize, Serialize};

use crate::event::MidiEvent;

/// The MIDI message family a bridge channel produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageKind {
    Note = 0,
    ControlChange = 1,
    PitchBend = 2,
}

impl MessageKind {
    /// Total conversion for atomically stored kinds; unknown values fall
    /// back to `Note`.
    #[inline]
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => MessageKind::ControlChange,
            2 => MessageKind::PitchBend,
            _ => MessageKind::Note,
        }
    }
}

/// Build the MIDI event for a normalized value.
///
/// `output_channel` is the 1-based MIDI channel from the mapping
/// configuration. Inputs are assumed pre-clamped by the configuration
/// boundary, but everything is clamped again here so an out-of-range value
/// can never produce a malformed event.
///
/// - `Note`: 0.0 maps to note-off, anything else to note-on with velocity
///   `round(normalized * 127)`.
/// - `ControlChange`: controller value `round(normalized * 127)`.
/// - `PitchBend`: unsigned 14-bit bend `round(normalized * 16383)`, so 0.5
///   lands on the MIDI-spec center of 8192.
pub fn convert(normalized: f32, output_channel: u8, number: u8, kind: MessageKind) -> MidiEvent {
    let normalized = if normalized.is_finite() {
        normalized.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let channel = output_channel.clamp(1, 16) - 1;
    let number = number.min(127);

    match kind {
        MessageKind::Note => {
            if normalized == 0.0 {
                MidiEvent::note_off(0, channel, number, 0)
            } else {
                let velocity = (normalized * 127.0).round() as u8;
                MidiEvent::note_on(0, channel, number, velocity)
            }
        }
        MessageKind::ControlChange => {
            let value = (normalized * 127.0).round() as u8;
            MidiEvent::control_change(0, channel, number, value)
        }
        MessageKind::PitchBend => {
            let bend = (normalized * 16383.0).round() as u16;
            MidiEvent::pitch_bend(0, channel, bend)
        }
    }
}
