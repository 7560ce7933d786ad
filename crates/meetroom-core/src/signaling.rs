//! Room-scoped signaling relay: wire format and the channel capability.
//!
//! Messages are JSON objects of the form `{"event": "<name>", "data": {...}}`
//! with kebab-case event names and camelCase payload fields.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::mpsc;

use crate::errors::MeetError;
use crate::roster::{Participant, StatusField, StatusRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantPayload {
    #[serde(default)]
    pub socket_id: String,
    pub peer_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub status: StatusRecord,
}

impl ParticipantPayload {
    pub fn to_participant(&self) -> Participant {
        Participant {
            peer_id: self.peer_id.clone(),
            display_name: self.user_name.clone(),
            socket_id: self.socket_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingParticipants {
    #[serde(default)]
    pub participants: Vec<ParticipantPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeft {
    #[serde(default)]
    pub socket_id: String,
    pub peer_id: String,
    #[serde(default)]
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_peer_id: Option<String>,
    pub message: String,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub peer_id: String,
    #[serde(rename = "type")]
    pub field: StatusField,
    pub status: bool,
    #[serde(default)]
    pub user_name: String,
}

/// Events delivered by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum SignalingEvent {
    ExistingParticipants(ExistingParticipants),
    UserJoined(ParticipantPayload),
    UserLeft(UserLeft),
    ReceiveChatMessage(ChatPayload),
    ReceiveStatusChange(StatusChange),
    Pong,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub meeting_id: String,
    pub user_name: String,
    pub peer_id: String,
    pub initial_audio: bool,
    pub initial_video: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSend {
    pub meeting_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(rename = "type")]
    pub field: StatusField,
    pub status: bool,
}

/// Messages this client sends to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum OutboundMessage {
    JoinRoom(JoinRoom),
    SendChatMessage(ChatSend),
    SendStatusChange(StatusUpdate),
    Ping,
}

pub fn decode_event(text: &str) -> Result<SignalingEvent, MeetError> {
    serde_json::from_str(text).map_err(|e| MeetError::Protocol(format!("decode signaling event: {e}")))
}

pub fn encode_message(message: &OutboundMessage) -> Result<String, MeetError> {
    serde_json::to_string(message).map_err(|e| MeetError::Protocol(format!("encode signaling message: {e}")))
}

/// Accepts RFC 3339 text or epoch milliseconds.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(DateTime<Utc>),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Text(ts)) => Ok(Some(ts)),
        Some(Raw::Millis(ms)) => DateTime::from_timestamp_millis(ms)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ms}"))),
    }
}

/// The real-time relay used for presence, chat and status.
///
/// Reconnection and keepalive at the transport level belong to the
/// implementation; the session only adds an application-level ping.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// Connects to the relay for `room_id` and returns the inbound event
    /// stream. The stream ending means the channel is gone for good.
    async fn connect(&self, room_id: &str) -> Result<mpsc::UnboundedReceiver<SignalingEvent>, MeetError>;

    /// Sends `join-room` and waits for the relay to acknowledge it.
    async fn join(&self, request: JoinRoom) -> Result<(), MeetError>;

    /// Enqueues an outbound message without waiting for delivery.
    fn send(&self, message: OutboundMessage) -> Result<(), MeetError>;

    fn disconnect(&self);
}
