//! Single-owner reconciliation of signaling, media-link and local media
//! events.
//!
//! Every handler runs to completion on the session task; the roster,
//! status, call and stream tables are only touched here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::calls::{CallDirection, CallEntry, CallSummary, CallTable, RemoteStream};
use crate::chat::{ChatLog, ChatMessage};
use crate::config::SessionConfig;
use crate::errors::MeetError;
use crate::events::{EndReason, EventEmitter, MeetEvent, SessionPhase};
use crate::links::{CallEvent, CallHandle, IncomingCall, MediaLinks, PeerLink};
use crate::local::{LocalSessionState, LocalStatus};
use crate::media::{LocalMediaSource, MediaStream, MediaTrack, ScreenCapture};
use crate::roster::{Participant, Roster, StatusField, StatusRecord, StatusTable};
use crate::session::{Capabilities, Command};
use crate::signaling::{
    ChatSend, OutboundMessage, ParticipantPayload, SignalingChannel, SignalingEvent, StatusChange, StatusUpdate,
    UserLeft,
};

/// Events the coordinator schedules for itself.
pub(crate) enum Internal {
    Call {
        peer_id: String,
        call_id: u64,
        event: CallEvent,
    },
    DialDue {
        peer_id: String,
        dial_id: u64,
    },
    ScreenCaptured(Result<ScreenCapture, MeetError>),
    ScreenEnded {
        stream_id: String,
    },
}

/// Per-peer outcome of swapping the outgoing video track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementReport {
    pub replaced: Vec<String>,
    pub failed: Vec<(String, MeetError)>,
}

#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub phase: SessionPhase,
    pub local_peer_id: String,
    pub participants: Vec<Participant>,
    pub statuses: HashMap<String, StatusRecord>,
    pub streams: Vec<RemoteStream>,
    pub calls: Vec<CallSummary>,
    pub messages: Vec<ChatMessage>,
    pub local: LocalStatus,
    pub published_stream: Arc<MediaStream>,
}

type ShareReply = oneshot::Sender<Result<ReplacementReport, MeetError>>;

pub(crate) struct Coordinator {
    room_id: String,
    local_peer_id: String,
    dial_grace: Duration,
    roster: Roster,
    statuses: StatusTable,
    calls: CallTable,
    chat: ChatLog,
    local: LocalSessionState,
    signaling: Arc<dyn SignalingChannel>,
    links: Arc<dyn MediaLinks>,
    media: Arc<dyn LocalMediaSource>,
    internal: mpsc::UnboundedSender<Internal>,
    /// Pending dials keyed by peer, tagged with the id their timer reports.
    dial_timers: HashMap<String, (u64, JoinHandle<()>)>,
    next_dial_id: u64,
    forwarders: HashMap<u64, JoinHandle<()>>,
    share_task: Option<JoinHandle<()>>,
    share_waiters: Vec<ShareReply>,
    screen_watcher: Option<JoinHandle<()>>,
    next_call_id: u64,
    end_reason: Option<EndReason>,
    phase: Arc<watch::Sender<SessionPhase>>,
    emitter: EventEmitter,
}

impl Coordinator {
    pub(crate) fn new(
        config: &SessionConfig,
        local_peer_id: String,
        local: LocalSessionState,
        caps: &Capabilities,
        emitter: EventEmitter,
        phase: Arc<watch::Sender<SessionPhase>>,
    ) -> (Self, mpsc::UnboundedReceiver<Internal>) {
        let (internal, internal_rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            room_id: config.room_id.clone(),
            local_peer_id,
            dial_grace: config.dial_grace(),
            roster: Roster::new(),
            statuses: StatusTable::new(),
            calls: CallTable::new(),
            chat: ChatLog::new(),
            local,
            signaling: caps.signaling.clone(),
            links: caps.links.clone(),
            media: caps.media.clone(),
            internal,
            dial_timers: HashMap::new(),
            next_dial_id: 1,
            forwarders: HashMap::new(),
            share_task: None,
            share_waiters: Vec::new(),
            screen_watcher: None,
            next_call_id: 1,
            end_reason: None,
            phase,
            emitter,
        };
        (coordinator, internal_rx)
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    fn is_active(&self) -> bool {
        self.phase() == SessionPhase::Active
    }

    pub(crate) fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    fn set_phase(&self, phase: SessionPhase) {
        self.phase.send_replace(phase);
        tracing::info!("session phase: {phase:?}");
        self.emitter.emit(MeetEvent::PhaseChanged(phase));
    }

    pub(crate) fn activate(&self) {
        self.set_phase(SessionPhase::Active);
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    pub(crate) fn handle_signaling(&mut self, event: SignalingEvent) {
        if !self.is_active() {
            tracing::debug!("dropping signaling event after teardown: {event:?}");
            return;
        }
        match event {
            SignalingEvent::ExistingParticipants(snapshot) => self.on_existing_participants(snapshot.participants),
            SignalingEvent::UserJoined(joined) => self.on_participant_joined(joined),
            SignalingEvent::UserLeft(left) => self.on_participant_left(left),
            SignalingEvent::ReceiveChatMessage(payload) => {
                let msg = ChatMessage::from_payload(payload);
                tracing::debug!("chat from {}: {}", msg.sender_name, msg.body);
                self.append_chat(msg);
            }
            SignalingEvent::ReceiveStatusChange(change) => self.on_status_changed(change),
            SignalingEvent::Pong => tracing::trace!("signaling pong"),
        }
    }

    pub(crate) fn handle_internal(&mut self, event: Internal) {
        if !self.is_active() {
            if let Internal::ScreenCaptured(Ok(capture)) = event {
                self.local.discard(&capture.stream);
            }
            return;
        }
        match event {
            Internal::Call { peer_id, call_id, event } => self.on_call_event(peer_id, call_id, event),
            Internal::DialDue { peer_id, dial_id } => self.on_dial_due(peer_id, dial_id),
            Internal::ScreenCaptured(result) => self.on_screen_captured(result),
            Internal::ScreenEnded { stream_id } => self.on_screen_ended(&stream_id),
        }
    }

    pub(crate) fn handle_command(&mut self, command: Command) {
        match command {
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::Leave { reply } => {
                self.teardown(EndReason::LeaveRequested);
                let _ = reply.send(());
            }
            _ if !self.is_active() => {
                // Dropping the reply reports NotActive to the caller.
            }
            Command::SetAudio { enabled, reply } => {
                let _ = reply.send(self.set_local_audio(enabled));
            }
            Command::SetVideo { enabled, reply } => {
                let _ = reply.send(self.set_local_video(enabled));
            }
            Command::SendChat { body, reply } => {
                let _ = reply.send(self.send_chat(body));
            }
            Command::StartScreenShare { reply } => self.start_screen_share(reply),
            Command::StopScreenShare { reply } => {
                let _ = reply.send(Ok(self.stop_screen_share(false)));
            }
        }
    }

    // ── Roster & status ─────────────────────────────────────────────

    fn on_existing_participants(&mut self, members: Vec<ParticipantPayload>) {
        let members: Vec<ParticipantPayload> =
            members.into_iter().filter(|m| m.peer_id != self.local_peer_id).collect();
        tracing::info!("existing participants: {}", members.len());

        let departed: Vec<String> = self
            .roster
            .participants()
            .iter()
            .map(|p| p.peer_id.clone())
            .filter(|peer| !members.iter().any(|m| &m.peer_id == peer))
            .collect();
        for peer_id in &departed {
            tracing::debug!("{peer_id} missing from roster snapshot");
            self.cancel_dial(peer_id);
            if let Some(entry) = self.calls.remove(peer_id) {
                self.retire_call(peer_id, entry, true);
            }
        }

        self.roster.replace_all(members.iter().map(ParticipantPayload::to_participant).collect());
        self.statuses.replace_all(members.iter().map(|m| (m.peer_id.clone(), m.status)));
        self.emitter.emit(MeetEvent::RosterReplaced(self.roster.participants().to_vec()));

        for member in &members {
            if self.calls.get(&member.peer_id).is_some_and(|c| c.remote.is_some()) {
                self.emitter.emit(MeetEvent::RemoteStreamAdded {
                    peer_id: member.peer_id.clone(),
                });
            }
            self.schedule_dial(&member.peer_id);
        }
    }

    fn on_participant_joined(&mut self, joined: ParticipantPayload) {
        if joined.peer_id == self.local_peer_id {
            tracing::debug!("ignoring join event for the local peer");
            return;
        }
        let participant = joined.to_participant();
        tracing::info!("participant joined: {} ({})", participant.label(), participant.peer_id);

        let is_new = self.roster.upsert(participant.clone());
        self.statuses.insert(joined.peer_id.clone(), joined.status);
        self.append_chat(ChatMessage::system(format!("{} joined the call.", participant.label())));
        self.emitter.emit(MeetEvent::ParticipantJoined(participant));

        if is_new && self.calls.get(&joined.peer_id).is_some_and(|c| c.remote.is_some()) {
            self.emitter.emit(MeetEvent::RemoteStreamAdded {
                peer_id: joined.peer_id.clone(),
            });
        }
        self.schedule_dial(&joined.peer_id);
    }

    fn on_participant_left(&mut self, left: UserLeft) {
        let peer_id = left.peer_id.as_str();
        let known = self.roster.contains(peer_id)
            || self.statuses.contains(peer_id)
            || self.calls.contains(peer_id)
            || self.dial_timers.contains_key(peer_id);
        if !known {
            tracing::debug!("leave for unknown peer {peer_id} ignored");
            return;
        }

        self.cancel_dial(peer_id);
        if let Some(entry) = self.calls.remove(peer_id) {
            self.retire_call(peer_id, entry, true);
        }
        self.statuses.remove(peer_id);

        if let Some(participant) = self.roster.remove(peer_id) {
            let label = if left.user_name.is_empty() {
                participant.label().to_string()
            } else {
                left.user_name.clone()
            };
            tracing::info!("participant left: {label} ({peer_id})");
            self.append_chat(ChatMessage::system(format!("{label} left the call.")));
            self.emitter.emit(MeetEvent::ParticipantLeft(peer_id.to_string()));
        }
    }

    fn on_status_changed(&mut self, change: StatusChange) {
        let status = self.statuses.merge(&change.peer_id, change.field, change.status);
        tracing::debug!("status of {}: {:?} = {}", change.peer_id, change.field, change.status);
        self.emitter.emit(MeetEvent::StatusChanged {
            peer_id: change.peer_id,
            status,
        });
    }

    fn set_local_audio(&mut self, enabled: bool) -> Result<(), MeetError> {
        self.local.set_audio_enabled(enabled);
        self.emit_local_state();
        self.broadcast_status(StatusField::Audio, enabled);
        Ok(())
    }

    fn set_local_video(&mut self, enabled: bool) -> Result<(), MeetError> {
        self.local.set_video_enabled(enabled);
        self.emit_local_state();
        self.broadcast_status(StatusField::Video, enabled);
        Ok(())
    }

    fn broadcast_status(&self, field: StatusField, status: bool) {
        let message = OutboundMessage::SendStatusChange(StatusUpdate { field, status });
        if let Err(e) = self.signaling.send(message) {
            tracing::warn!("status broadcast {field:?}={status} not sent: {e}");
        }
    }

    fn emit_local_state(&self) {
        self.emitter.emit(MeetEvent::LocalStateChanged(self.local.status()));
    }

    // ── Call negotiation ────────────────────────────────────────────

    fn schedule_dial(&mut self, peer_id: &str) {
        if peer_id == self.local_peer_id || self.dial_timers.contains_key(peer_id) {
            return;
        }
        let dial_id = self.next_dial_id;
        self.next_dial_id += 1;
        let tx = self.internal.clone();
        let grace = self.dial_grace;
        let peer = peer_id.to_string();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let _ = tx.send(Internal::DialDue { peer_id: peer, dial_id });
        });
        self.dial_timers.insert(peer_id.to_string(), (dial_id, timer));
    }

    fn cancel_dial(&mut self, peer_id: &str) {
        if let Some((_, timer)) = self.dial_timers.remove(peer_id) {
            timer.abort();
        }
    }

    fn on_dial_due(&mut self, peer_id: String, dial_id: u64) {
        if !self.dial_timers.get(&peer_id).is_some_and(|(id, _)| *id == dial_id) {
            tracing::debug!("dropping superseded dial timer {dial_id} for {peer_id}");
            return;
        }
        self.dial_timers.remove(&peer_id);
        if self.calls.contains(&peer_id) {
            tracing::debug!("not dialing {peer_id}: call already exists");
            return;
        }
        if !self.roster.contains(&peer_id) {
            tracing::debug!("not dialing {peer_id}: no longer in the room");
            return;
        }

        let stream = self.local.published_stream().clone();
        match self.links.dial(&peer_id, stream.clone()) {
            Ok(handle) => {
                tracing::info!("dialing {peer_id}");
                self.install_call(peer_id, CallDirection::Outbound, handle, stream);
            }
            Err(e) => {
                tracing::warn!("could not dial {peer_id}: {e}");
                self.emitter.emit(MeetEvent::CallFailed { peer_id, error: e });
            }
        }
    }

    pub(crate) fn on_incoming_call(&mut self, call: IncomingCall) {
        if !self.is_active() {
            call.link.close();
            return;
        }
        let peer_id = call.link.peer_id().to_string();
        let stream = self.local.published_stream().clone();

        if let Err(e) = call.link.answer(stream.clone()) {
            tracing::warn!("answering {peer_id} failed: {e}");
            call.link.close();
            self.emitter.emit(MeetEvent::CallFailed { peer_id, error: e });
            return;
        }

        if let Some(existing) = self.calls.get(&peer_id) {
            // Both sides apply the same rule, so exactly one link survives:
            // the one dialed by the peer with the smaller id.
            let keep_existing = existing.direction == CallDirection::Outbound && self.local_peer_id < peer_id;
            if keep_existing {
                tracing::info!("simultaneous dial with {peer_id}: keeping our outbound call");
                call.link.close();
                return;
            }
            if let Some(old) = self.calls.remove(&peer_id) {
                tracing::info!("inbound call from {peer_id} supersedes call {}", old.call_id);
                self.retire_call(&peer_id, old, true);
            }
        }

        tracing::info!("accepted call from {peer_id}");
        self.install_call(peer_id, CallDirection::Inbound, call, stream);
    }

    fn install_call(&mut self, peer_id: String, direction: CallDirection, handle: CallHandle, outgoing: Arc<MediaStream>) {
        let call_id = self.next_call_id;
        self.next_call_id += 1;

        let CallHandle { link, mut events } = handle;
        let tx = self.internal.clone();
        let peer = peer_id.clone();
        let forwarder = tokio::spawn(async move {
            loop {
                let event = events.recv().await.unwrap_or(CallEvent::Closed);
                let terminal = matches!(event, CallEvent::Closed | CallEvent::Error(_));
                let sent = tx.send(Internal::Call {
                    peer_id: peer.clone(),
                    call_id,
                    event,
                });
                if sent.is_err() || terminal {
                    break;
                }
            }
        });
        self.forwarders.insert(call_id, forwarder);

        let displaced = self.calls.insert(
            peer_id.clone(),
            CallEntry {
                call_id,
                direction,
                link,
                remote: None,
                outgoing,
            },
        );
        if let Some(old) = displaced {
            self.retire_call(&peer_id, old, true);
        }
    }

    fn retire_call(&mut self, peer_id: &str, entry: CallEntry, close_link: bool) {
        if let Some(forwarder) = self.forwarders.remove(&entry.call_id) {
            forwarder.abort();
        }
        if close_link {
            entry.link.close();
        }
        if entry.remote.is_some() && self.roster.contains(peer_id) {
            self.emitter.emit(MeetEvent::RemoteStreamRemoved {
                peer_id: peer_id.to_string(),
            });
        }
    }

    fn on_call_event(&mut self, peer_id: String, call_id: u64, event: CallEvent) {
        if !self.calls.is_current(&peer_id, call_id) {
            tracing::debug!("dropping event from superseded call {call_id} ({peer_id})");
            return;
        }
        match event {
            CallEvent::Stream(stream) => {
                if self.calls.set_remote(&peer_id, call_id, stream) {
                    tracing::info!("remote stream from {peer_id}");
                    if self.roster.contains(&peer_id) {
                        self.emitter.emit(MeetEvent::RemoteStreamAdded {
                            peer_id: peer_id.clone(),
                        });
                    }
                }
                self.resync_outgoing(&peer_id);
            }
            CallEvent::Closed => {
                if let Some(entry) = self.calls.remove(&peer_id) {
                    tracing::info!("call with {peer_id} closed");
                    self.retire_call(&peer_id, entry, false);
                }
            }
            CallEvent::Error(reason) => {
                let error = MeetError::CallNegotiation {
                    peer_id: peer_id.clone(),
                    reason,
                };
                tracing::warn!("{error}");
                if let Some(entry) = self.calls.remove(&peer_id) {
                    self.retire_call(&peer_id, entry, true);
                }
                self.emitter.emit(MeetEvent::CallFailed { peer_id, error });
            }
        }
    }

    // ── Track replacement ───────────────────────────────────────────

    /// Sends the published stream's video on every open call.
    fn publish_current(&mut self) -> ReplacementReport {
        let stream = self.local.published_stream().clone();
        let mut report = ReplacementReport::default();
        let Some(track) = stream.first_video_track() else {
            tracing::warn!("published stream {} has no video track", stream.id());
            return report;
        };

        for (peer_id, entry) in self.calls.iter_mut() {
            if MediaStream::same(&entry.outgoing, &stream) {
                report.replaced.push(peer_id.clone());
                continue;
            }
            match replace_video_track(entry.link.as_ref(), peer_id, &track) {
                Ok(()) => {
                    entry.outgoing = stream.clone();
                    report.replaced.push(peer_id.clone());
                }
                Err(e) => {
                    tracing::warn!("track replacement for {peer_id} failed: {e}");
                    report.failed.push((peer_id.clone(), e));
                }
            }
        }

        report.replaced.sort();
        report.failed.sort_by(|a, b| a.0.cmp(&b.0));
        for (peer_id, _) in &report.failed {
            self.emitter.emit(MeetEvent::TrackReplacementFailed {
                peer_id: peer_id.clone(),
            });
        }
        report
    }

    /// Brings a call negotiated before the latest publish up to date.
    fn resync_outgoing(&mut self, peer_id: &str) {
        let stream = self.local.published_stream().clone();
        let Some(entry) = self.calls.get_mut(peer_id) else {
            return;
        };
        if MediaStream::same(&entry.outgoing, &stream) {
            return;
        }
        let Some(track) = stream.first_video_track() else {
            return;
        };
        match replace_video_track(entry.link.as_ref(), peer_id, &track) {
            Ok(()) => entry.outgoing = stream,
            Err(e) => {
                tracing::warn!("late track replacement for {peer_id} failed: {e}");
                self.emitter.emit(MeetEvent::TrackReplacementFailed {
                    peer_id: peer_id.to_string(),
                });
            }
        }
    }

    fn start_screen_share(&mut self, reply: ShareReply) {
        if self.local.is_screen_sharing() {
            let _ = reply.send(Ok(ReplacementReport::default()));
            return;
        }
        self.share_waiters.push(reply);
        if self.share_task.is_some() {
            return;
        }
        let media = self.media.clone();
        let tx = self.internal.clone();
        self.share_task = Some(tokio::spawn(async move {
            let result = media.acquire_display().await;
            let _ = tx.send(Internal::ScreenCaptured(result));
        }));
    }

    fn on_screen_captured(&mut self, result: Result<ScreenCapture, MeetError>) {
        self.share_task = None;
        let outcome = match result {
            Ok(capture) => self.begin_screen_share(capture),
            Err(e) => {
                tracing::info!("screen share not started: {e}");
                Err(e)
            }
        };
        for waiter in self.share_waiters.drain(..) {
            let _ = waiter.send(outcome.clone());
        }
    }

    fn begin_screen_share(&mut self, capture: ScreenCapture) -> Result<ReplacementReport, MeetError> {
        let ScreenCapture { stream, ended } = capture;
        if stream.first_video_track().is_none() {
            self.local.discard(&stream);
            return Err(MeetError::MediaAcquisition("screen capture has no video track".into()));
        }

        tracing::info!("screen share started: {}", stream.id());
        self.local.begin_screen_share(stream.clone());
        let report = self.publish_current();

        let tx = self.internal.clone();
        let stream_id = stream.id().to_string();
        self.screen_watcher = Some(tokio::spawn(async move {
            ended.await;
            let _ = tx.send(Internal::ScreenEnded { stream_id });
        }));
        self.emit_local_state();
        Ok(report)
    }

    fn stop_screen_share(&mut self, ended_externally: bool) -> ReplacementReport {
        if !self.local.is_screen_sharing() {
            return ReplacementReport::default();
        }
        if let Some(watcher) = self.screen_watcher.take() {
            watcher.abort();
        }
        tracing::info!("screen share stopped (external: {ended_externally})");
        self.local.end_screen_share(ended_externally);
        let report = self.publish_current();
        self.emit_local_state();
        report
    }

    fn on_screen_ended(&mut self, stream_id: &str) {
        if self.local.screen_stream().is_some_and(|s| s.id() == stream_id) {
            self.stop_screen_share(true);
        }
    }

    // ── Chat ────────────────────────────────────────────────────────

    fn send_chat(&mut self, body: String) -> Result<(), MeetError> {
        if body.trim().is_empty() {
            return Ok(());
        }
        self.signaling.send(OutboundMessage::SendChatMessage(ChatSend {
            meeting_id: self.room_id.clone(),
            message: body,
        }))
    }

    fn append_chat(&mut self, message: ChatMessage) {
        self.chat.append(message.clone());
        self.emitter.emit(MeetEvent::ChatMessageReceived(message));
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    pub(crate) fn send_ping(&self) {
        if let Err(e) = self.signaling.send(OutboundMessage::Ping) {
            tracing::warn!("heartbeat not sent: {e}");
        }
    }

    /// Leaving -> Closed in one pass. Idempotent.
    pub(crate) fn teardown(&mut self, reason: EndReason) {
        if self.end_reason.is_some() {
            return;
        }
        self.end_reason = Some(reason);
        self.set_phase(SessionPhase::Leaving);

        for (_, (_, timer)) in self.dial_timers.drain() {
            timer.abort();
        }
        if let Some(task) = self.share_task.take() {
            task.abort();
        }
        if let Some(watcher) = self.screen_watcher.take() {
            watcher.abort();
        }
        for waiter in self.share_waiters.drain(..) {
            let _ = waiter.send(Err(MeetError::NotActive));
        }

        let calls: Vec<(String, CallEntry)> = self.calls.drain().collect();
        for (peer_id, entry) in calls {
            tracing::debug!("closing call with {peer_id}");
            entry.link.close();
        }
        for (_, forwarder) in self.forwarders.drain() {
            forwarder.abort();
        }

        self.local.release_all();
        self.signaling.disconnect();
        self.links.destroy();
        self.roster.clear();
        self.statuses.clear();

        self.set_phase(SessionPhase::Closed);
        tracing::info!("session ended: {reason:?}");
        self.emitter.emit(MeetEvent::SessionEnded { reason });
    }

    pub(crate) fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            phase: self.phase(),
            local_peer_id: self.local_peer_id.clone(),
            participants: self.roster.participants().to_vec(),
            statuses: self.statuses.records().clone(),
            streams: self.calls.streams(&self.roster),
            calls: self.calls.summaries(),
            messages: self.chat.messages().to_vec(),
            local: self.local.status(),
            published_stream: self.local.published_stream().clone(),
        }
    }
}

fn replace_video_track(link: &dyn PeerLink, peer_id: &str, track: &Arc<dyn MediaTrack>) -> Result<(), MeetError> {
    let sender = link
        .video_senders()
        .into_iter()
        .next()
        .ok_or_else(|| MeetError::TrackReplacement {
            peer_id: peer_id.to_string(),
        })?;
    if sender.track().is_some_and(|current| Arc::ptr_eq(&current, track)) {
        return Ok(());
    }
    sender.replace_track(track.clone())
}
