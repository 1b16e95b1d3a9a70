//! Per-channel SPSC queue carrying MIDI events to the audio thread.

use parking_lot::Mutex;
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};

use crate::event::MidiEvent;

/// Default capacity of a channel's pending-event ring buffer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Single-producer/single-consumer buffer of MIDI events awaiting the next
/// audio block.
///
/// The ring buffer itself is the cross-thread synchronization. The two
/// mutexes only wrap the producer and consumer handles so the queue can be
/// shared behind an `Arc`; each side is locked by exactly one thread (the
/// receiver pushes, the audio callback drains), so neither lock is ever
/// contended and the critical sections are a single ring-buffer operation.
pub struct MidiEventQueue {
    producer: Mutex<HeapProd<MidiEvent>>,
    consumer: Mutex<HeapCons<MidiEvent>>,
}

impl MidiEventQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (producer, consumer) = HeapRb::new(capacity).split();
        Self {
            producer: Mutex::new(producer),
            consumer: Mutex::new(consumer),
        }
    }

    /// Append an event. Receiver context only.
    ///
    /// Returns false if the buffer is full; the event is dropped rather
    /// than blocking.
    #[inline]
    pub fn push(&self, event: MidiEvent) -> bool {
        self.producer.lock().try_push(event).is_ok()
    }

    /// Move all pending events into `out`, preserving push order. Audio
    /// context only, called once per block.
    pub fn drain_into(&self, out: &mut Vec<MidiEvent>) {
        let mut consumer = self.consumer.lock();
        while let Some(event) = consumer.try_pop() {
            out.push(event);
        }
    }

    pub fn pending(&self) -> usize {
        self.consumer.lock().occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.lock().is_empty()
    }
}

impl Default for MidiEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_drain_preserves_order() {
        let queue = MidiEventQueue::new();
        assert!(queue.push(MidiEvent::note_on(0, 0, 60, 100)));
        assert!(queue.push(MidiEvent::note_off(0, 0, 60, 0)));
        assert_eq!(queue.pending(), 2);

        let mut out = Vec::new();
        queue.drain_into(&mut out);
        assert_eq!(out.len(), 2);
        assert!(out[0].is_note_on());
        assert!(out[1].is_note_off());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_clears_queue() {
        let queue = MidiEventQueue::new();
        queue.push(MidiEvent::note_on(0, 0, 60, 100));

        let mut out = Vec::new();
        queue.drain_into(&mut out);
        assert_eq!(out.len(), 1);

        out.clear();
        queue.drain_into(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_capacity_overflow_drops() {
        let queue = MidiEventQueue::with_capacity(4);
        let event = MidiEvent::note_on(0, 0, 60, 100);

        assert!(queue.push(event));
        assert!(queue.push(event));
        assert!(queue.push(event));
        assert!(queue.push(event));

        // Full: push fails, nothing blocks.
        assert!(!queue.push(event));
        assert_eq!(queue.pending(), 4);
    }
}
