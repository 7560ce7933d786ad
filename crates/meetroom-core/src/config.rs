use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::MeetError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SessionConfig {
    #[serde(default)]
    pub room_id: String,
    #[serde(default = "default_display_name")]
    pub display_name: String,
    #[serde(default = "default_true")]
    pub audio_on_join: bool,
    #[serde(default = "default_true")]
    pub video_on_join: bool,
    /// Pause before dialing a newly seen peer.
    #[serde(default = "default_dial_grace_ms")]
    pub dial_grace_ms: u64,
    /// `null` disables the application-level heartbeat.
    #[serde(default = "default_heartbeat")]
    pub heartbeat: Option<HeartbeatConfig>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeartbeatConfig {
    #[serde(default = "default_heartbeat_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_liveness_timeout_ms")]
    pub liveness_timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_display_name() -> String {
    "Guest".to_string()
}

fn default_dial_grace_ms() -> u64 {
    1000
}

fn default_heartbeat_interval_ms() -> u64 {
    10_000
}

fn default_liveness_timeout_ms() -> u64 {
    30_000
}

fn default_heartbeat() -> Option<HeartbeatConfig> {
    Some(HeartbeatConfig::default())
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_heartbeat_interval_ms(),
            liveness_timeout_ms: default_liveness_timeout_ms(),
        }
    }
}

impl HeartbeatConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            room_id: String::new(),
            display_name: default_display_name(),
            audio_on_join: true,
            video_on_join: true,
            dial_grace_ms: default_dial_grace_ms(),
            heartbeat: default_heartbeat(),
        }
    }
}

impl SessionConfig {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            ..Default::default()
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, MeetError> {
        serde_json::from_str(text).map_err(|e| MeetError::Config(e.to_string()))
    }

    /// Loads a config file, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("ignoring config {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn dial_grace(&self) -> Duration {
        Duration::from_millis(self.dial_grace_ms)
    }

    pub fn validate(&self) -> Result<(), MeetError> {
        if self.room_id.trim().is_empty() {
            return Err(MeetError::Config("room_id is empty".into()));
        }
        if let Some(hb) = &self.heartbeat {
            if hb.interval_ms == 0 {
                return Err(MeetError::Config("heartbeat interval must be positive".into()));
            }
            if hb.liveness_timeout_ms < hb.interval_ms {
                return Err(MeetError::Config(
                    "liveness timeout shorter than heartbeat interval".into(),
                ));
            }
        }
        Ok(())
    }
}
