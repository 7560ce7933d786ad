use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MeetError {
    #[error("media acquisition failed: {0}")]
    MediaAcquisition(String),
    #[error("signaling connection failed: {0}")]
    SignalingConnection(String),
    #[error("call negotiation with {peer_id} failed: {reason}")]
    CallNegotiation { peer_id: String, reason: String },
    #[error("no outgoing video sender for {peer_id}")]
    TrackReplacement { peer_id: String },
    #[error("screen capture declined")]
    ScreenCaptureDeclined,
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("session is not active")]
    NotActive,
}
