use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::time::{Instant, Interval};

use crate::chat::ChatService;
use crate::config::{HeartbeatConfig, SessionConfig};
use crate::controls::MeetingControls;
use crate::coordinator::{Coordinator, Internal, ReplacementReport, RoomSnapshot};
use crate::errors::MeetError;
use crate::events::{EndReason, EventEmitter, MeetEvent, MeetEventListener, SessionPhase};
use crate::links::{IncomingCall, MediaLinks};
use crate::local::LocalSessionState;
use crate::media::{LocalMediaSource, MediaConstraints};
use crate::signaling::{JoinRoom, SignalingChannel, SignalingEvent};

/// The platform services a session drives.
#[derive(Clone)]
pub struct Capabilities {
    pub media: Arc<dyn LocalMediaSource>,
    pub signaling: Arc<dyn SignalingChannel>,
    pub links: Arc<dyn MediaLinks>,
}

/// Requests from the public handles to the session task.
pub(crate) enum Command {
    SetAudio {
        enabled: bool,
        reply: oneshot::Sender<Result<(), MeetError>>,
    },
    SetVideo {
        enabled: bool,
        reply: oneshot::Sender<Result<(), MeetError>>,
    },
    StartScreenShare {
        reply: oneshot::Sender<Result<ReplacementReport, MeetError>>,
    },
    StopScreenShare {
        reply: oneshot::Sender<Result<ReplacementReport, MeetError>>,
    },
    SendChat {
        body: String,
        reply: oneshot::Sender<Result<(), MeetError>>,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    Leave {
        reply: oneshot::Sender<()>,
    },
}

/// Sending side of the session task, shared by every handle.
#[derive(Clone)]
pub(crate) struct CommandLink {
    tx: mpsc::UnboundedSender<Command>,
    phase: watch::Receiver<SessionPhase>,
    final_snapshot: Arc<Mutex<Option<RoomSnapshot>>>,
}

impl CommandLink {
    fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    /// Whether the session task has been started.
    fn is_running(&self) -> bool {
        matches!(
            self.phase(),
            SessionPhase::Active | SessionPhase::Leaving | SessionPhase::Closed
        )
    }

    /// Sends a command and waits for its reply. Fails with
    /// [`MeetError::NotActive`] unless the session is Active.
    pub(crate) async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, MeetError> {
        if self.phase() != SessionPhase::Active {
            return Err(MeetError::NotActive);
        }
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).map_err(|_| MeetError::NotActive)?;
        rx.await.map_err(|_| MeetError::NotActive)
    }

    /// Live snapshot while the task runs, the final one after it exits.
    pub(crate) async fn snapshot(&self) -> Result<RoomSnapshot, MeetError> {
        if self.is_running() {
            let (reply, rx) = oneshot::channel();
            if self.tx.send(Command::Snapshot { reply }).is_ok() {
                if let Ok(snapshot) = rx.await {
                    return Ok(snapshot);
                }
            }
        }
        self.final_snapshot.lock().await.clone().ok_or(MeetError::NotActive)
    }

    pub(crate) async fn leave(&self) {
        if self.phase() != SessionPhase::Active {
            return;
        }
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Leave { reply }).is_ok() {
            let _ = rx.await;
        }
    }
}

/// One client's membership in one room.
///
/// `join()` runs the entry sequence and hands the tables to a background
/// task. All other methods talk to that task. Dropping the session and
/// every handle obtained from it tears the session down.
pub struct RoomSession {
    config: SessionConfig,
    caps: Capabilities,
    emitter: EventEmitter,
    phase: Arc<watch::Sender<SessionPhase>>,
    link: CommandLink,
    commands: Mutex<Option<mpsc::UnboundedReceiver<Command>>>,
}

impl RoomSession {
    pub fn new(config: SessionConfig, caps: Capabilities) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (phase, phase_rx) = watch::channel(SessionPhase::Idle);
        Self {
            config,
            caps,
            emitter: EventEmitter::new(),
            phase: Arc::new(phase),
            link: CommandLink {
                tx,
                phase: phase_rx,
                final_snapshot: Arc::new(Mutex::new(None)),
            },
            commands: Mutex::new(Some(rx)),
        }
    }

    /// Register a listener for session events.
    pub fn add_listener(&self, listener: Arc<dyn MeetEventListener>) {
        self.emitter.add_listener(listener);
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    /// Resolves once the session reaches `Closed`.
    pub async fn closed(&self) {
        let mut rx = self.phase.subscribe();
        let _ = rx.wait_for(|p| *p == SessionPhase::Closed).await;
    }

    pub fn controls(&self) -> MeetingControls {
        MeetingControls::new(self.link.clone())
    }

    pub fn chat(&self) -> ChatService {
        ChatService::new(self.link.clone())
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, MeetError> {
        self.link.snapshot().await
    }

    /// Leave the room. Returns once teardown has completed; a no-op when
    /// the session is not Active.
    pub async fn leave(&self) {
        self.link.leave().await;
    }

    /// Acquire local media, connect to the room and start the session task.
    ///
    /// Any failure releases what was acquired so far and leaves the session
    /// `Closed`.
    pub async fn join(&self) -> Result<(), MeetError> {
        self.config.validate()?;
        let commands = self.commands.lock().await.take().ok_or(MeetError::NotActive)?;

        self.set_phase(SessionPhase::Initializing);
        let camera = match self.caps.media.acquire(MediaConstraints::CAMERA_AND_MIC).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("local media unavailable: {e}");
                self.set_phase(SessionPhase::Closed);
                return Err(e);
            }
        };
        let mut local = LocalSessionState::new(camera, self.config.audio_on_join, self.config.video_on_join);
        tracing::info!("local media acquired");

        self.set_phase(SessionPhase::Joining);
        let (local_peer_id, incoming) = match self.caps.links.open().await {
            Ok(opened) => opened,
            Err(e) => {
                local.release_all();
                return Err(self.fail_entry(as_connection_error(e)));
            }
        };
        tracing::info!("media links open as {local_peer_id}");

        let signaling_rx = match self.caps.signaling.connect(&self.config.room_id).await {
            Ok(rx) => rx,
            Err(e) => {
                local.release_all();
                self.caps.links.destroy();
                return Err(self.fail_entry(as_connection_error(e)));
            }
        };

        let request = JoinRoom {
            meeting_id: self.config.room_id.clone(),
            user_name: self.config.display_name.clone(),
            peer_id: local_peer_id.clone(),
            initial_audio: self.config.audio_on_join,
            initial_video: self.config.video_on_join,
        };
        if let Err(e) = self.caps.signaling.join(request).await {
            local.release_all();
            self.caps.signaling.disconnect();
            self.caps.links.destroy();
            return Err(self.fail_entry(e));
        }
        tracing::info!("joined room {} as {}", self.config.room_id, self.config.display_name);

        let (coordinator, internal) = Coordinator::new(
            &self.config,
            local_peer_id,
            local,
            &self.caps,
            self.emitter.clone(),
            self.phase.clone(),
        );
        coordinator.activate();

        let actor = SessionActor {
            coordinator,
            commands,
            signaling: signaling_rx,
            incoming,
            internal,
            heartbeat: self.config.heartbeat,
            final_snapshot: self.link.final_snapshot.clone(),
        };
        tokio::spawn(actor.run());
        Ok(())
    }

    fn set_phase(&self, phase: SessionPhase) {
        self.phase.send_replace(phase);
        tracing::info!("session phase: {phase:?}");
        self.emitter.emit(MeetEvent::PhaseChanged(phase));
    }

    fn fail_entry(&self, err: MeetError) -> MeetError {
        tracing::error!("could not join room {}: {err}", self.config.room_id);
        self.set_phase(SessionPhase::Closed);
        err
    }
}

fn as_connection_error(err: MeetError) -> MeetError {
    match err {
        MeetError::SignalingConnection(_) => err,
        other => MeetError::SignalingConnection(other.to_string()),
    }
}

struct SessionActor {
    coordinator: Coordinator,
    commands: mpsc::UnboundedReceiver<Command>,
    signaling: mpsc::UnboundedReceiver<SignalingEvent>,
    incoming: mpsc::UnboundedReceiver<IncomingCall>,
    internal: mpsc::UnboundedReceiver<Internal>,
    heartbeat: Option<HeartbeatConfig>,
    final_snapshot: Arc<Mutex<Option<RoomSnapshot>>>,
}

impl SessionActor {
    async fn run(mut self) {
        let mut ticker = self
            .heartbeat
            .map(|hb| tokio::time::interval_at(Instant::now() + hb.interval(), hb.interval()));
        let mut last_inbound = Instant::now();
        let mut incoming_open = true;

        while self.coordinator.end_reason().is_none() {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.coordinator.handle_command(command),
                    None => {
                        tracing::info!("all session handles dropped");
                        self.coordinator.teardown(EndReason::HandlesDropped);
                    }
                },
                event = self.signaling.recv() => match event {
                    Some(event) => {
                        last_inbound = Instant::now();
                        self.coordinator.handle_signaling(event);
                    }
                    None => {
                        tracing::warn!("signaling channel closed");
                        self.coordinator.teardown(EndReason::SignalingClosed);
                    }
                },
                call = self.incoming.recv(), if incoming_open => match call {
                    Some(call) => self.coordinator.on_incoming_call(call),
                    None => {
                        tracing::warn!("incoming call channel closed");
                        incoming_open = false;
                    }
                },
                Some(event) = self.internal.recv() => self.coordinator.handle_internal(event),
                _ = next_tick(&mut ticker) => {
                    if let Some(hb) = self.heartbeat {
                        if last_inbound.elapsed() >= hb.liveness_timeout() {
                            tracing::warn!("no signaling traffic for {:?}", last_inbound.elapsed());
                            self.coordinator.teardown(EndReason::LivenessTimeout);
                        } else {
                            self.coordinator.send_ping();
                        }
                    }
                }
            }
        }

        *self.final_snapshot.lock().await = Some(self.coordinator.snapshot());
        tracing::debug!("session task finished");
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
