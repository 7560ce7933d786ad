//! Meetroom core session logic.
//!
//! Coordinates one client's participation in a multi-party audio/video
//! room: presence, per-peer media links, screen sharing, chat and
//! teardown. Platform media, signaling and peer transport are supplied
//! by the embedder through the capability traits.

pub mod calls;
pub mod chat;
pub mod config;
pub mod controls;
pub mod coordinator;
pub mod errors;
pub mod events;
pub mod links;
pub mod local;
pub mod logging;
pub mod media;
pub mod roster;
pub mod session;
pub mod signaling;

#[cfg(test)]
mod testing;

pub use chat::{ChatMessage, ChatService, MessageKind};
pub use config::{HeartbeatConfig, SessionConfig};
pub use controls::MeetingControls;
pub use coordinator::{ReplacementReport, RoomSnapshot};
pub use errors::MeetError;
pub use events::{EndReason, MeetEvent, MeetEventListener, SessionPhase};
pub use links::{CallEvent, CallHandle, IncomingCall, MediaLinks, PeerLink, TrackSender};
pub use local::LocalStatus;
pub use media::{LocalMediaSource, MediaConstraints, MediaStream, MediaTrack, ScreenCapture, TrackKind};
pub use roster::{Participant, StatusField, StatusRecord};
pub use session::{Capabilities, RoomSession};
pub use signaling::{OutboundMessage, SignalingChannel, SignalingEvent};
