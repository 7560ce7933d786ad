use std::collections::HashMap;
use std::sync::Arc;

use crate::links::PeerLink;
use crate::media::MediaStream;
use crate::roster::Roster;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallDirection {
    Outbound,
    Inbound,
}

/// One live media negotiation with a peer.
pub struct CallEntry {
    /// Monotonic id; events tagged with a stale id are ignored.
    pub call_id: u64,
    pub direction: CallDirection,
    pub link: Arc<dyn PeerLink>,
    /// First remote stream reported by the call.
    pub remote: Option<Arc<MediaStream>>,
    /// Local stream whose video this call is currently sending.
    pub outgoing: Arc<MediaStream>,
}

#[derive(Debug, Clone)]
pub struct RemoteStream {
    pub peer_id: String,
    pub stream: Arc<MediaStream>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSummary {
    pub peer_id: String,
    pub call_id: u64,
    pub direction: CallDirection,
    pub has_stream: bool,
}

/// At most one call per peer id.
#[derive(Default)]
pub struct CallTable {
    calls: HashMap<String, CallEntry>,
}

impl CallTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, peer_id: &str) -> bool {
        self.calls.contains_key(peer_id)
    }

    pub fn get(&self, peer_id: &str) -> Option<&CallEntry> {
        self.calls.get(peer_id)
    }

    pub fn is_current(&self, peer_id: &str, call_id: u64) -> bool {
        self.calls.get(peer_id).is_some_and(|c| c.call_id == call_id)
    }

    /// Inserts `entry`, returning whatever call it displaced.
    pub fn insert(&mut self, peer_id: String, entry: CallEntry) -> Option<CallEntry> {
        self.calls.insert(peer_id, entry)
    }

    pub fn remove(&mut self, peer_id: &str) -> Option<CallEntry> {
        self.calls.remove(peer_id)
    }

    /// Records the call's remote stream unless one is already present.
    /// Returns `true` if the stream was stored.
    pub fn set_remote(&mut self, peer_id: &str, call_id: u64, stream: Arc<MediaStream>) -> bool {
        match self.calls.get_mut(peer_id) {
            Some(entry) if entry.call_id == call_id && entry.remote.is_none() => {
                entry.remote = Some(stream);
                true
            }
            _ => false,
        }
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut CallEntry)> {
        self.calls.iter_mut()
    }

    pub fn get_mut(&mut self, peer_id: &str) -> Option<&mut CallEntry> {
        self.calls.get_mut(peer_id)
    }

    pub fn drain(&mut self) -> impl Iterator<Item = (String, CallEntry)> + '_ {
        self.calls.drain()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The stream table: remote streams of calls whose peer is in the
    /// roster, in roster order.
    pub fn streams(&self, roster: &Roster) -> Vec<RemoteStream> {
        roster
            .participants()
            .iter()
            .filter_map(|p| {
                let remote = self.calls.get(&p.peer_id)?.remote.clone()?;
                Some(RemoteStream {
                    peer_id: p.peer_id.clone(),
                    stream: remote,
                })
            })
            .collect()
    }

    pub fn summaries(&self) -> Vec<CallSummary> {
        let mut out: Vec<CallSummary> = self
            .calls
            .iter()
            .map(|(peer_id, c)| CallSummary {
                peer_id: peer_id.clone(),
                call_id: c.call_id,
                direction: c.direction,
                has_stream: c.remote.is_some(),
            })
            .collect();
        out.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));
        out
    }
}
