//! Demultiplexes inbound OSC onto the configured bridge channels.

use std::sync::Arc;

use parking_lot::Mutex;
use rosc::OscMessage;

use crate::channel::BridgeChannel;
use crate::error::Result;
use crate::receiver::OscReceiver;

/// Observer invoked for every inbound OSC message, matched or not.
pub type GlobalObserver = Box<dyn Fn(&OscMessage) + Send + Sync>;

struct Registry {
    /// Slot order is fixed for the instance lifetime; the slot index is
    /// the channel's identity.
    channels: Vec<Arc<BridgeChannel>>,
    observers: Mutex<Vec<GlobalObserver>>,
}

impl Registry {
    fn dispatch(&self, message: &OscMessage) {
        for observer in self.observers.lock().iter() {
            observer(message);
        }
        // Every matching channel is notified; an address may hit zero, one,
        // or several channels.
        for channel in &self.channels {
            if channel.matches(&message.addr) {
                channel.handle_message(message);
            }
        }
    }
}

/// Owns the channel registry and the UDP receiver, and routes each
/// inbound message to every matching channel.
pub struct BridgeManager {
    registry: Arc<Registry>,
    receiver: OscReceiver,
}

impl BridgeManager {
    pub fn new(channels: Vec<Arc<BridgeChannel>>) -> Self {
        let registry = Arc::new(Registry {
            channels,
            observers: Mutex::new(Vec::new()),
        });
        let dispatch_registry = Arc::clone(&registry);
        let receiver = OscReceiver::new(Arc::new(move |message: &OscMessage| {
            dispatch_registry.dispatch(message);
        }));

        Self { registry, receiver }
    }

    /// Start listening on `port`. An existing binding is torn down first;
    /// on failure the manager is left unbound and the caller decides what
    /// to surface.
    pub fn bind(&self, port: u16) -> Result<()> {
        self.receiver.bind(port)
    }

    /// Stop listening. Idempotent.
    pub fn unbind(&self) {
        self.receiver.unbind();
    }

    pub fn is_bound(&self) -> bool {
        self.receiver.is_bound()
    }

    /// The actual bound port while listening (useful when binding port 0).
    pub fn local_port(&self) -> Option<u16> {
        self.receiver.local_port()
    }

    pub fn channels(&self) -> &[Arc<BridgeChannel>] {
        &self.registry.channels
    }

    pub fn channel(&self, slot: usize) -> Option<&Arc<BridgeChannel>> {
        self.registry.channels.get(slot)
    }

    pub fn add_observer(&self, observer: impl Fn(&OscMessage) + Send + Sync + 'static) {
        self.registry.observers.lock().push(Box::new(observer));
    }

    /// Route one message as if it had arrived from the network. Used by
    /// the receiver thread and directly by in-process callers.
    pub fn dispatch(&self, message: &OscMessage) {
        self.registry.dispatch(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::MessageKind;
    use crate::state::ChannelState;
    use rosc::OscType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn channel(address: &str, note: u8) -> Arc<BridgeChannel> {
        Arc::new(BridgeChannel::new(ChannelState::new(
            address,
            0.0,
            1.0,
            1,
            note,
            MessageKind::Note,
        )))
    }

    fn message(addr: &str, value: f32) -> OscMessage {
        OscMessage {
            addr: addr.to_owned(),
            args: vec![OscType::Float(value)],
        }
    }

    #[test]
    fn test_dispatch_reaches_matching_channel_only() {
        let manager = BridgeManager::new(vec![channel("/1/value", 60), channel("/2/value", 61)]);

        manager.dispatch(&message("/1/value", 1.0));

        assert_eq!(manager.channel(0).unwrap().pending(), 1);
        assert_eq!(manager.channel(1).unwrap().pending(), 0);
        assert_eq!(manager.channel(1).unwrap().state().live_value().version, 0);
    }

    #[test]
    fn test_dispatch_multiplicity() {
        // Two slots configured with the same address: both fire.
        let manager = BridgeManager::new(vec![channel("/dup", 60), channel("/dup", 72)]);

        manager.dispatch(&message("/dup", 1.0));

        for slot in 0..2 {
            let channel = manager.channel(slot).unwrap();
            assert_eq!(channel.state().live_value().version, 1);
            assert_eq!(channel.pending(), 1);
        }
    }

    #[test]
    fn test_global_observers_see_unmatched_messages() {
        let manager = BridgeManager::new(vec![channel("/1/value", 60)]);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        manager.add_observer(move |_message| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        manager.dispatch(&message("/1/value", 1.0));
        manager.dispatch(&message("/nobody/home", 1.0));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(manager.channel(0).unwrap().pending(), 1);
    }

    #[test]
    fn test_channel_slots_are_stable() {
        let manager = BridgeManager::new(vec![channel("/a", 1), channel("/b", 2), channel("/c", 3)]);
        assert_eq!(manager.channels().len(), 3);
        assert!(manager.channel(0).unwrap().matches("/a"));
        assert!(manager.channel(2).unwrap().matches("/c"));
        assert!(manager.channel(3).is_none());
    }
}
