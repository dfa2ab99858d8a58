use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::Event;

const CHANNEL_CAPACITY: usize = 256;

/// Per-employee broadcast hub. LISTEN subscribes, calendar mutations publish.
pub struct NotifyHub {
    channels: DashMap<Ulid, broadcast::Sender<Event>>,
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to events for one employee's calendar. Creates the channel
    /// on first use.
    pub fn subscribe(&self, employee_id: Ulid) -> broadcast::Receiver<Event> {
        let sender = self
            .channels
            .entry(employee_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Publish an event. No-op if nobody is listening.
    pub fn send(&self, employee_id: Ulid, event: &Event) {
        if let Some(sender) = self.channels.get(&employee_id) {
            let _ = sender.send(event.clone());
        }
    }
}
