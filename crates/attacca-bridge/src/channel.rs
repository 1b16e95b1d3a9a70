//! One configured OSC-address-to-MIDI-target mapping.

use parking_lot::Mutex;
use rosc::{OscMessage, OscType};
use tracing::debug;

use crate::convert::convert;
use crate::event::MidiEvent;
use crate::queue::MidiEventQueue;
use crate::state::ChannelState;

/// Observer callback invoked for every message addressed to a channel:
/// `(normalized_value, accepted, message)`. Observers feed activity
/// displays; they never influence the mapping itself.
pub type ChannelObserver = Box<dyn Fn(f32, bool, &OscMessage) + Send + Sync>;

/// A bridge channel: mapping state, a pending-MIDI queue, and the
/// accept/convert/enqueue pipeline between them.
///
/// `handle_message` runs on the receiver thread, `drain_into` on the audio
/// thread; everything else may be called from the control or UI threads.
pub struct BridgeChannel {
    state: ChannelState,
    queue: MidiEventQueue,
    observers: Mutex<Vec<ChannelObserver>>,
}

impl BridgeChannel {
    pub fn new(state: ChannelState) -> Self {
        Self::with_queue_capacity(state, crate::queue::DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_queue_capacity(state: ChannelState, capacity: usize) -> Self {
        Self {
            state,
            queue: MidiEventQueue::with_capacity(capacity),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    pub fn add_observer(&self, observer: impl Fn(f32, bool, &OscMessage) + Send + Sync + 'static) {
        self.observers.lock().push(Box::new(observer));
    }

    /// Exact string match against the configured address. OSC pattern
    /// semantics beyond that are deliberately not applied.
    #[inline]
    pub fn matches(&self, address: &str) -> bool {
        self.state.matches(address)
    }

    /// Process one OSC message addressed to this channel.
    ///
    /// Messages that do not carry exactly one float32 or int32 argument
    /// are a no-op, not an error. Accepted values update the live value
    /// even when the channel is muted; mute only suppresses MIDI output.
    pub fn handle_message(&self, message: &OscMessage) {
        let Some(raw) = extract_value(message) else {
            self.notify_observers(0.0, false, message);
            return;
        };

        self.state.update_live(raw);
        let normalized = self.state.normalize(raw);

        if !self.state.muted() {
            let event = convert(
                normalized,
                self.state.output_channel(),
                self.state.output_number(),
                self.state.kind(),
            );
            if !self.queue.push(event) {
                debug!("MIDI event queue full, dropping event for {}", message.addr);
            }
        }

        self.notify_observers(normalized, true, message);
    }

    /// Move this channel's pending MIDI into `out`. Audio thread, once per
    /// block.
    ///
    /// If the MIDI target was remapped since the last block, an
    /// all-notes-off for the *current* output channel is emitted ahead of
    /// the pending events so no note sticks on the old target.
    pub fn drain_into(&self, out: &mut Vec<MidiEvent>) {
        if self.state.take_mapping_changed() {
            out.push(MidiEvent::all_notes_off(0, self.state.output_channel() - 1));
        }
        self.queue.drain_into(out);
    }

    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    fn notify_observers(&self, normalized: f32, accepted: bool, message: &OscMessage) {
        for observer in self.observers.lock().iter() {
            observer(normalized, accepted, message);
        }
    }
}

/// Accept exactly one numeric argument; anything else is rejected.
fn extract_value(message: &OscMessage) -> Option<f32> {
    if message.args.len() != 1 {
        return None;
    }
    match message.args[0] {
        OscType::Float(value) => Some(value),
        OscType::Int(value) => Some(value as f32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::MessageKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn channel() -> BridgeChannel {
        BridgeChannel::new(ChannelState::new(
            "/1/value",
            0.0,
            1.0,
            1,
            60,
            MessageKind::Note,
        ))
    }

    fn message(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_owned(),
            args,
        }
    }

    fn drain(channel: &BridgeChannel) -> Vec<MidiEvent> {
        let mut out = Vec::new();
        channel.drain_into(&mut out);
        out
    }

    #[test]
    fn test_float_message_produces_midi() {
        let channel = channel();
        channel.handle_message(&message("/1/value", vec![OscType::Float(1.0)]));

        let live = channel.state().live_value();
        assert_eq!(live.raw, 1.0);
        assert_eq!(live.version, 1);

        let events = drain(&channel);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_note_on());
        assert_eq!(events[0].channel_num(), 0);
        assert_eq!(events[0].note(), Some(60));
        assert_eq!(events[0].velocity(), Some(127));
    }

    #[test]
    fn test_int_argument_accepted() {
        let channel = channel();
        channel
            .state()
            .set_input_max(10.0);
        channel.handle_message(&message("/1/value", vec![OscType::Int(5)]));

        assert_eq!(channel.state().live_value().raw, 5.0);
        assert_eq!(channel.pending(), 1);
    }

    #[test]
    fn test_wrong_shapes_are_noops() {
        let channel = channel();

        channel.handle_message(&message("/1/value", vec![]));
        channel.handle_message(&message(
            "/1/value",
            vec![OscType::Float(1.0), OscType::Float(2.0)],
        ));
        channel.handle_message(&message("/1/value", vec![OscType::String("on".into())]));

        assert_eq!(channel.state().live_value().version, 0);
        assert_eq!(channel.pending(), 0);
    }

    #[test]
    fn test_mute_suppresses_midi_not_live_value() {
        let channel = channel();
        channel.state().set_muted(true);

        channel.handle_message(&message("/1/value", vec![OscType::Float(0.7)]));

        let live = channel.state().live_value();
        assert_eq!(live.raw, 0.7);
        assert_eq!(live.version, 1);
        assert_eq!(channel.pending(), 0);
    }

    #[test]
    fn test_address_match_is_exact() {
        let channel = channel();
        channel.state().set_address("/3/value");

        assert!(channel.matches("/3/value"));
        assert!(!channel.matches("/3/Value"));
        assert!(!channel.matches("/30/value"));
        assert!(!channel.matches("/3/value/"));
    }

    #[test]
    fn test_observers_fire_regardless_of_mute() {
        let channel = channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        channel.add_observer(move |normalized, accepted, message| {
            assert!(accepted);
            assert_eq!(normalized, 1.0);
            assert_eq!(message.addr, "/1/value");
            seen.fetch_add(1, Ordering::SeqCst);
        });

        channel.handle_message(&message("/1/value", vec![OscType::Float(1.0)]));
        channel.state().set_muted(true);
        channel.handle_message(&message("/1/value", vec![OscType::Float(1.0)]));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_observers_see_rejected_messages() {
        let channel = channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        channel.add_observer(move |_normalized, accepted, _message| {
            assert!(!accepted);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        channel.handle_message(&message("/1/value", vec![OscType::String("x".into())]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remap_emits_all_notes_off_before_pending() {
        let channel = channel();
        channel.handle_message(&message("/1/value", vec![OscType::Float(1.0)]));

        // Remap the target while a note-on is still pending.
        channel.state().set_output_channel(5);
        channel.handle_message(&message("/1/value", vec![OscType::Float(0.0)]));

        let events = drain(&channel);
        assert_eq!(events.len(), 3);
        assert!(events[0].is_all_notes_off());
        // All-notes-off goes to the *current* output channel.
        assert_eq!(events[0].channel_num(), 4);
        assert!(events[1].is_note_on());
        assert!(events[2].is_note_off());

        // Flag was consumed; the next drain is clean.
        assert!(drain(&channel).is_empty());
    }

    #[test]
    fn test_queue_overflow_drops_newest() {
        let channel = BridgeChannel::with_queue_capacity(
            ChannelState::new("/1/value", 0.0, 1.0, 1, 60, MessageKind::Note),
            2,
        );

        for _ in 0..5 {
            channel.handle_message(&message("/1/value", vec![OscType::Float(1.0)]));
        }

        // Live value saw every message even though the queue clipped.
        assert_eq!(channel.state().live_value().version, 5);
        assert_eq!(channel.pending(), 2);
    }
}
