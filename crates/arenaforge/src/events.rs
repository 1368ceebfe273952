//! Where lifecycle notifications go.
//!
//! The orchestrator calls [`EventSink::emit`] once per committed change,
//! while still holding the lock of the arena concerned, so events for one
//! arena arrive in the order the changes happened. Sinks should hand the
//! event off and return; they must not call back into the orchestrator.

use std::sync::Arc;

use arenaforge_protocol::LifecycleEvent;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Receiver of [`LifecycleEvent`]s.
pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, event: LifecycleEvent);
}

/// Discards every event.
impl EventSink for () {
    fn emit(&self, _event: LifecycleEvent) {}
}

/// Forwards events into a tokio channel, for hosts that consume them from
/// an async task. A closed receiver is not an error; events are dropped.
impl EventSink for mpsc::UnboundedSender<LifecycleEvent> {
    fn emit(&self, event: LifecycleEvent) {
        if self.send(event).is_err() {
            tracing::debug!("event receiver dropped, discarding event");
        }
    }
}

impl<S: EventSink> EventSink for Arc<S> {
    fn emit(&self, event: LifecycleEvent) {
        (**self).emit(event);
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything recorded so far.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().clone()
    }

    /// Drains the log.
    pub fn take(&self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: LifecycleEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use arenaforge_protocol::{ArenaId, WorldId};

    use super::*;

    fn created(id: u64) -> LifecycleEvent {
        LifecycleEvent::ArenaCreated {
            arena_id: ArenaId(id),
            world_id: WorldId(1),
        }
    }

    #[test]
    fn test_event_log_records_in_order() {
        let log = EventLog::new();
        log.emit(created(1));
        log.emit(created(2));

        assert_eq!(log.events(), vec![created(1), created(2)]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_event_log_take_drains() {
        let log = EventLog::new();
        log.emit(created(1));

        assert_eq!(log.take(), vec![created(1)]);
        assert!(log.is_empty());
    }

    #[test]
    fn test_shared_log_through_arc() {
        let log = Arc::new(EventLog::new());
        let sink: Arc<EventLog> = Arc::clone(&log);
        sink.emit(created(5));
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_channel_sink_delivers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.emit(created(9));
        assert_eq!(rx.recv().await, Some(created(9)));
    }

    #[test]
    fn test_channel_sink_tolerates_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel::<LifecycleEvent>();
        drop(rx);
        tx.emit(created(1));
    }
}
