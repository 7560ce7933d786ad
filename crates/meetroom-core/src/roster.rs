use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A remote room member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub peer_id: String,
    pub display_name: String,
    /// Signaling transport id; may change when the member reconnects.
    pub socket_id: String,
}

impl Participant {
    /// Name shown in system messages; falls back to the peer id.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.peer_id
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusField {
    Audio,
    Video,
}

/// Audio/video enablement of one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(default = "default_true")]
    pub audio: bool,
    #[serde(default = "default_true")]
    pub video: bool,
}

fn default_true() -> bool {
    true
}

impl Default for StatusRecord {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

impl StatusRecord {
    pub fn set(&mut self, field: StatusField, value: bool) {
        match field {
            StatusField::Audio => self.audio = value,
            StatusField::Video => self.video = value,
        }
    }
}

/// Ordered peerId -> Participant mapping, in join order.
///
/// Updated by the session coordinator only.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full replace with the snapshot delivered at join time.
    pub fn replace_all(&mut self, participants: Vec<Participant>) {
        self.participants.clear();
        for p in participants {
            self.upsert(p);
        }
    }

    /// Appends a new participant, or refreshes an existing one in place
    /// (keeping its join position). Returns `true` when the entry is new.
    pub fn upsert(&mut self, info: Participant) -> bool {
        match self.participant_mut(&info.peer_id) {
            Some(existing) => {
                existing.display_name = info.display_name;
                existing.socket_id = info.socket_id;
                false
            }
            None => {
                self.participants.push(info);
                true
            }
        }
    }

    pub fn remove(&mut self, peer_id: &str) -> Option<Participant> {
        let idx = self.participants.iter().position(|p| p.peer_id == peer_id)?;
        Some(self.participants.remove(idx))
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, peer_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.peer_id == peer_id)
    }

    fn participant_mut(&mut self, peer_id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.peer_id == peer_id)
    }

    pub fn contains(&self, peer_id: &str) -> bool {
        self.participant(peer_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn clear(&mut self) {
        self.participants.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusTable {
    records: HashMap<String, StatusRecord>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_all(&mut self, records: impl IntoIterator<Item = (String, StatusRecord)>) {
        self.records = records.into_iter().collect();
    }

    pub fn insert(&mut self, peer_id: String, record: StatusRecord) {
        self.records.insert(peer_id, record);
    }

    /// Merges one field, creating a default record if the peer has none.
    pub fn merge(&mut self, peer_id: &str, field: StatusField, value: bool) -> StatusRecord {
        let record = self.records.entry(peer_id.to_string()).or_default();
        record.set(field, value);
        *record
    }

    pub fn get(&self, peer_id: &str) -> Option<StatusRecord> {
        self.records.get(peer_id).copied()
    }

    pub fn contains(&self, peer_id: &str) -> bool {
        self.records.contains_key(peer_id)
    }

    pub fn remove(&mut self, peer_id: &str) -> Option<StatusRecord> {
        self.records.remove(peer_id)
    }

    pub fn records(&self) -> &HashMap<String, StatusRecord> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
