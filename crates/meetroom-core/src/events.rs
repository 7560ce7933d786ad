use std::sync::{Arc, RwLock};

use crate::chat::ChatMessage;
use crate::errors::MeetError;
use crate::local::LocalStatus;
use crate::roster::{Participant, StatusRecord};

/// Events emitted by the core to embedder listeners.
#[derive(Debug, Clone)]
pub enum MeetEvent {
    PhaseChanged(SessionPhase),
    RosterReplaced(Vec<Participant>),
    ParticipantJoined(Participant),
    ParticipantLeft(String), // peer id
    StatusChanged { peer_id: String, status: StatusRecord },
    RemoteStreamAdded { peer_id: String },
    RemoteStreamRemoved { peer_id: String },
    CallFailed { peer_id: String, error: MeetError },
    TrackReplacementFailed { peer_id: String },
    ChatMessageReceived(ChatMessage),
    LocalStateChanged(LocalStatus),
    SessionEnded { reason: EndReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Initializing,
    Joining,
    Active,
    Leaving,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    LeaveRequested,
    SignalingClosed,
    LivenessTimeout,
    HandlesDropped,
}

/// Trait for receiving events from the core.
/// Implementations must be Send + Sync (called from tokio tasks).
pub trait MeetEventListener: Send + Sync {
    fn on_event(&self, event: MeetEvent);
}

/// Internal event emitter that dispatches to registered listeners.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<RwLock<Vec<Arc<dyn MeetEventListener>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn MeetEventListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(listener);
    }

    pub fn emit(&self, event: MeetEvent) {
        let listeners = self.listeners.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        for listener in listeners.iter() {
            listener.on_event(event.clone());
        }
    }
}
