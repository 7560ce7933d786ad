use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::errors::MeetError;
use crate::media::{MediaStream, MediaTrack};

/// The outgoing side of one track on a call.
pub trait TrackSender: Send + Sync {
    fn track(&self) -> Option<Arc<dyn MediaTrack>>;
    fn replace_track(&self, track: Arc<dyn MediaTrack>) -> Result<(), MeetError>;
}

/// One point-to-point media connection to a remote peer.
///
/// All methods return immediately; negotiation progress is reported
/// through the [`CallEvent`] stream handed out with the link.
pub trait PeerLink: Send + Sync {
    fn peer_id(&self) -> &str;
    fn answer(&self, stream: Arc<MediaStream>) -> Result<(), MeetError>;
    fn video_senders(&self) -> Vec<Arc<dyn TrackSender>>;
    fn close(&self);
}

#[derive(Debug, Clone)]
pub enum CallEvent {
    Stream(Arc<MediaStream>),
    Closed,
    Error(String),
}

pub struct CallHandle {
    pub link: Arc<dyn PeerLink>,
    pub events: mpsc::UnboundedReceiver<CallEvent>,
}

/// An unsolicited call from a remote peer.
pub type IncomingCall = CallHandle;

impl fmt::Debug for CallHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallHandle")
            .field("peer_id", &self.link.peer_id())
            .finish_non_exhaustive()
    }
}

/// Media-link endpoint (the peer broker connection).
#[async_trait]
pub trait MediaLinks: Send + Sync {
    /// Registers with the broker. Returns the local peer id and the
    /// stream of incoming calls.
    async fn open(&self) -> Result<(String, mpsc::UnboundedReceiver<IncomingCall>), MeetError>;

    fn dial(&self, peer_id: &str, stream: Arc<MediaStream>) -> Result<CallHandle, MeetError>;

    fn destroy(&self);
}
