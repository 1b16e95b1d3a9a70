//! RT-safe MIDI event types with sample-accurate timing.

use midi_msg::{Channel, ChannelVoiceMsg, ControlChange, MidiMsg};

/// All Notes Off is controller 123 with value 0.
const CC_ALL_NOTES_OFF: u8 = 123;

/// RT-safe MIDI event with sample-accurate frame offset.
///
/// Constructors take the 0-based wire channel (0 = MIDI channel 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MidiEvent {
    /// Offset within the current buffer (0 = first sample).
    pub frame_offset: usize,
    pub channel: Channel,
    pub msg: ChannelVoiceMsg,
}

impl MidiEvent {
    #[inline]
    pub fn new(frame_offset: usize, channel: Channel, msg: ChannelVoiceMsg) -> Self {
        Self {
            frame_offset,
            channel,
            msg,
        }
    }

    #[inline]
    pub fn note_on(frame_offset: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            frame_offset,
            channel: Channel::from_u8(channel),
            msg: ChannelVoiceMsg::NoteOn { note, velocity },
        }
    }

    #[inline]
    pub fn note_off(frame_offset: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            frame_offset,
            channel: Channel::from_u8(channel),
            msg: ChannelVoiceMsg::NoteOff { note, velocity },
        }
    }

    #[inline]
    pub fn control_change(frame_offset: usize, channel: u8, cc: u8, value: u8) -> Self {
        Self {
            frame_offset,
            channel: Channel::from_u8(channel),
            msg: ChannelVoiceMsg::ControlChange {
                control: ControlChange::CC { control: cc, value },
            },
        }
    }

    #[inline]
    pub fn pitch_bend(frame_offset: usize, channel: u8, bend: u16) -> Self {
        Self {
            frame_offset,
            channel: Channel::from_u8(channel),
            msg: ChannelVoiceMsg::PitchBend { bend },
        }
    }

    /// Compensating event emitted when a channel's output mapping is changed
    /// while a note may still be sounding.
    #[inline]
    pub fn all_notes_off(frame_offset: usize, channel: u8) -> Self {
        Self::control_change(frame_offset, channel, CC_ALL_NOTES_OFF, 0)
    }

    #[inline]
    pub fn channel_num(&self) -> u8 {
        self.channel as u8
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self.msg, ChannelVoiceMsg::NoteOn { velocity, .. } if velocity > 0)
    }

    #[inline]
    pub fn is_note_off(&self) -> bool {
        matches!(
            self.msg,
            ChannelVoiceMsg::NoteOff { .. } | ChannelVoiceMsg::NoteOn { velocity: 0, .. }
        )
    }

    #[inline]
    pub fn is_all_notes_off(&self) -> bool {
        matches!(
            self.msg,
            ChannelVoiceMsg::ControlChange {
                control: ControlChange::CC {
                    control: CC_ALL_NOTES_OFF,
                    value: 0,
                },
            }
        )
    }

    #[inline]
    pub fn note(&self) -> Option<u8> {
        match self.msg {
            ChannelVoiceMsg::NoteOn { note, .. } | ChannelVoiceMsg::NoteOff { note, .. } => {
                Some(note)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn velocity(&self) -> Option<u8> {
        match self.msg {
            ChannelVoiceMsg::NoteOn { velocity, .. } | ChannelVoiceMsg::NoteOff { velocity, .. } => {
                Some(velocity)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn to_midi_msg(&self) -> MidiMsg {
        MidiMsg::ChannelVoice {
            channel: self.channel,
            msg: self.msg,
        }
    }

    /// Serialize to the standard three-byte wire form.
    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_midi_msg().to_midi()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, midi_msg::ParseError> {
        let (msg, _len) = MidiMsg::from_midi(bytes)?;
        match msg {
            MidiMsg::ChannelVoice { channel, msg } => Ok(Self {
                frame_offset: 0,
                channel,
                msg,
            }),
            _ => Err(midi_msg::ParseError::Invalid(
                "Expected ChannelVoice message",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on() {
        let event = MidiEvent::note_on(100, 0, 60, 100);
        assert!(event.is_note_on());
        assert!(!event.is_note_off());
        assert_eq!(event.note(), Some(60));
        assert_eq!(event.velocity(), Some(100));
        assert_eq!(event.channel_num(), 0);
        assert_eq!(event.frame_offset, 100);
    }

    #[test]
    fn test_note_off() {
        let event = MidiEvent::note_off(50, 3, 64, 0);
        assert!(event.is_note_off());
        assert!(!event.is_note_on());
        assert_eq!(event.note(), Some(64));
        assert_eq!(event.channel_num(), 3);
    }

    #[test]
    fn test_note_on_zero_velocity_is_note_off() {
        let event = MidiEvent::note_on(0, 0, 60, 0);
        assert!(event.is_note_off());
        assert!(!event.is_note_on());
    }

    #[test]
    fn test_control_change() {
        let event = MidiEvent::control_change(0, 5, 7, 127);
        assert_eq!(event.channel_num(), 5);
        match event.msg {
            ChannelVoiceMsg::ControlChange { control } => match control {
                ControlChange::CC { control: cc, value } => {
                    assert_eq!(cc, 7);
                    assert_eq!(value, 127);
                }
                _ => panic!("Expected CC"),
            },
            _ => panic!("Expected ControlChange"),
        }
    }

    #[test]
    fn test_pitch_bend() {
        let event = MidiEvent::pitch_bend(0, 0, 8192);
        match event.msg {
            ChannelVoiceMsg::PitchBend { bend } => {
                assert_eq!(bend, 8192);
            }
            _ => panic!("Expected PitchBend"),
        }
    }

    #[test]
    fn test_all_notes_off() {
        let event = MidiEvent::all_notes_off(0, 2);
        assert!(event.is_all_notes_off());
        assert_eq!(event.channel_num(), 2);
        assert!(!event.is_note_off());
        assert_eq!(event.note(), None);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let event = MidiEvent::note_on(0, 5, 60, 100);
        let bytes = event.to_bytes();
        let parsed = MidiEvent::from_bytes(&bytes).unwrap();
        assert_eq!(event.channel, parsed.channel);
        assert_eq!(event.msg, parsed.msg);
    }
}
