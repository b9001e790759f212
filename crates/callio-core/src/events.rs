use std::sync::Arc;

use crate::engine::OfflineReason;

/// Lifecycle states of a call session.
///
/// Drives which operations are currently permitted: `join` requires
/// `Ready`, `leave` requires `Joined`, `destroy` is valid everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Initializing,
    Ready,
    Joining,
    Joined,
    Leaving,
    Error,
}

/// Events emitted by the session core to UI listeners.
#[derive(Debug, Clone)]
pub enum CallioEvent {
    StateChanged(SessionState),
    ParticipantJoined(u32),
    ParticipantLeft { uid: u32, reason: OfflineReason },
    /// Fresh snapshot of the remote participant set after a change.
    ParticipantsChanged(Vec<u32>),
    /// User-facing notice (toast/alert-equivalent).
    Notice(String),
}

/// Trait for receiving events from the core.
/// Implementations must be Send + Sync (called from tokio tasks).
pub trait CallioEventListener: Send + Sync {
    fn on_event(&self, event: CallioEvent);
}

/// Internal event emitter that dispatches to registered listeners.
#[derive(Clone)]
pub struct EventEmitter {
    listeners: Arc<std::sync::RwLock<Vec<Arc<dyn CallioEventListener>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(std::sync::RwLock::new(Vec::new())),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn CallioEventListener>) {
        self.listeners.write().unwrap().push(listener);
    }

    pub fn emit(&self, event: CallioEvent) {
        let listeners = self.listeners.read().unwrap();
        for listener in listeners.iter() {
            listener.on_event(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListener {
        count: Arc<AtomicUsize>,
    }

    impl CallioEventListener for CountingListener {
        fn on_event(&self, _event: CallioEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn emitter_dispatches_to_listener() {
        let emitter = EventEmitter::new();
        let count = Arc::new(AtomicUsize::new(0));
        let listener = Arc::new(CountingListener { count: count.clone() });

        emitter.add_listener(listener);
        emitter.emit(CallioEvent::StateChanged(SessionState::Ready));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn emitter_dispatches_to_multiple_listeners() {
        let emitter = EventEmitter::new();
        let count1 = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::new(AtomicUsize::new(0));

        emitter.add_listener(Arc::new(CountingListener { count: count1.clone() }));
        emitter.add_listener(Arc::new(CountingListener { count: count2.clone() }));

        emitter.emit(CallioEvent::StateChanged(SessionState::Joined));

        assert_eq!(count1.load(Ordering::SeqCst), 1);
        assert_eq!(count2.load(Ordering::SeqCst), 1);
    }

    struct EventCapture {
        events: Arc<std::sync::Mutex<Vec<CallioEvent>>>,
    }

    impl CallioEventListener for EventCapture {
        fn on_event(&self, event: CallioEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn emitter_delivers_correct_events() {
        let emitter = EventEmitter::new();
        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let listener = Arc::new(EventCapture { events: events.clone() });

        emitter.add_listener(listener);
        emitter.emit(CallioEvent::ParticipantJoined(42));

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        match &captured[0] {
            CallioEvent::ParticipantJoined(uid) => assert_eq!(*uid, 42),
            _ => panic!("expected ParticipantJoined"),
        }
    }
}
