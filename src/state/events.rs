use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use uuid::Uuid;

use crate::dto::events::StateChangedEvent;

/// Identifier handed out when a callback listener is registered.
pub type ListenerId = Uuid;

type Listener = Arc<dyn Fn(&StateChangedEvent) + Send + Sync>;

/// Fan-out of state-change notifications to channel subscribers and callbacks.
pub struct EventHub {
    sender: broadcast::Sender<StateChangedEvent>,
    listeners: DashMap<ListenerId, Listener>,
}

impl EventHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self {
            sender,
            listeners: DashMap::new(),
        }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChangedEvent> {
        self.sender.subscribe()
    }

    /// Subsequent events as a stream; lagged receivers skip what they missed.
    pub fn stream(&self) -> impl Stream<Item = StateChangedEvent> + use<> {
        BroadcastStream::new(self.sender.subscribe()).filter_map(Result::ok)
    }

    /// Register a callback invoked synchronously on every event.
    pub fn on<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&StateChangedEvent) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        self.listeners.insert(id, Arc::new(callback));
        id
    }

    /// Unregister a callback; `false` if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Deliver an event to every subscriber and listener.
    pub fn broadcast(&self, event: StateChangedEvent) {
        let listeners: Vec<Listener> = self
            .listeners
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for listener in listeners {
            listener(&event);
        }

        let _ = self.sender.send(event);
    }
}
