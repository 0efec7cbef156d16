use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::trace;

pub const INVALID_STREAM: &str = "Invalid stream.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The active stream has no valid frame. Raised on every redraw while
    /// that holds.
    Warning(String),
    /// The view now shows the named topic.
    Change(String),
}

type Listener = Box<dyn Fn(&Event) + Send + Sync>;

/// Delivers view notifications to synchronous listeners and to broadcast
/// subscribers.
pub struct Emitter {
    sender: broadcast::Sender<Event>,
    listeners: RwLock<Vec<Listener>>,
}

impl Emitter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Emitter {
            sender,
            listeners: RwLock::new(vec![]),
        }
    }

    /// Registers a listener that runs on the emitting thread. Listeners must
    /// not register further listeners from inside the callback.
    pub fn on<F>(&self, listener: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.listeners.write().push(Box::new(listener));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: Event) {
        trace!("emit {:?}", event);
        for listener in self.listeners.read().iter() {
            listener(&event);
        }
        // no subscribers is fine
        let _ = self.sender.send(event);
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new(64)
    }
}
