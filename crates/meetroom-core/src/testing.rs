//! In-memory capabilities for unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::sync::{mpsc, oneshot};

use crate::config::SessionConfig;
use crate::errors::MeetError;
use crate::events::{MeetEvent, MeetEventListener};
use crate::links::{CallEvent, CallHandle, IncomingCall, MediaLinks, PeerLink, TrackSender};
use crate::media::{LocalMediaSource, MediaConstraints, MediaStream, MediaTrack, ScreenCapture, TrackKind};
use crate::session::{Capabilities, RoomSession};
use crate::signaling::{JoinRoom, OutboundMessage, SignalingChannel, SignalingEvent};

pub struct FakeTrack {
    id: String,
    kind: TrackKind,
    enabled: AtomicBool,
    stops: AtomicUsize,
}

impl FakeTrack {
    pub fn new(id: &str, kind: TrackKind) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            kind,
            enabled: AtomicBool::new(true),
            stops: AtomicUsize::new(0),
        })
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// A stream plus typed handles on its fake tracks.
#[derive(Clone)]
pub struct FakeStream {
    pub stream: Arc<MediaStream>,
    pub tracks: Vec<Arc<FakeTrack>>,
}

impl FakeStream {
    pub fn camera(id: &str) -> Self {
        Self::build(id, &[TrackKind::Audio, TrackKind::Video])
    }

    pub fn screen(id: &str) -> Self {
        Self::build(id, &[TrackKind::Video])
    }

    fn build(id: &str, kinds: &[TrackKind]) -> Self {
        let tracks: Vec<Arc<FakeTrack>> = kinds
            .iter()
            .map(|kind| {
                let suffix = match kind {
                    TrackKind::Audio => "audio",
                    TrackKind::Video => "video",
                };
                FakeTrack::new(&format!("{id}-{suffix}"), *kind)
            })
            .collect();
        let dyn_tracks: Vec<Arc<dyn MediaTrack>> =
            tracks.iter().map(|t| t.clone() as Arc<dyn MediaTrack>).collect();
        Self {
            stream: Arc::new(MediaStream::new(id, dyn_tracks)),
            tracks,
        }
    }

    pub fn audio(&self) -> &Arc<FakeTrack> {
        self.tracks.iter().find(|t| t.kind == TrackKind::Audio).expect("no audio track")
    }

    pub fn video(&self) -> &Arc<FakeTrack> {
        self.tracks.iter().find(|t| t.kind == TrackKind::Video).expect("no video track")
    }
}

#[derive(Default)]
pub struct FakeMediaSource {
    camera: Mutex<Option<Result<Arc<MediaStream>, MeetError>>>,
    displays: Mutex<VecDeque<Result<(Arc<MediaStream>, oneshot::Receiver<()>), MeetError>>>,
}

impl FakeMediaSource {
    pub fn with_camera(camera: &FakeStream) -> Arc<Self> {
        let source = Self::default();
        *source.camera.lock().unwrap() = Some(Ok(camera.stream.clone()));
        Arc::new(source)
    }

    pub fn failing(err: MeetError) -> Arc<Self> {
        let source = Self::default();
        *source.camera.lock().unwrap() = Some(Err(err));
        Arc::new(source)
    }

    /// Queues a screen capture; firing the returned sender ends it out of band.
    pub fn queue_display(&self, screen: &FakeStream) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.displays.lock().unwrap().push_back(Ok((screen.stream.clone(), rx)));
        tx
    }

    pub fn queue_display_error(&self, err: MeetError) {
        self.displays.lock().unwrap().push_back(Err(err));
    }
}

#[async_trait]
impl LocalMediaSource for FakeMediaSource {
    async fn acquire(&self, _constraints: MediaConstraints) -> Result<Arc<MediaStream>, MeetError> {
        self.camera
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(MeetError::MediaAcquisition("camera already in use".into())))
    }

    async fn acquire_display(&self) -> Result<ScreenCapture, MeetError> {
        let next = self.displays.lock().unwrap().pop_front();
        let (stream, ended) = next.unwrap_or(Err(MeetError::ScreenCaptureDeclined))?;
        Ok(ScreenCapture {
            stream,
            ended: async move {
                if ended.await.is_err() {
                    futures_util::future::pending::<()>().await;
                }
            }
            .boxed(),
        })
    }
}

#[derive(Default)]
pub struct FakeSignaling {
    inbound: Mutex<Option<mpsc::UnboundedSender<SignalingEvent>>>,
    sent: Mutex<Vec<OutboundMessage>>,
    joins: Mutex<Vec<JoinRoom>>,
    fail_connect: Mutex<Option<MeetError>>,
    fail_join: Mutex<Option<MeetError>>,
    disconnects: AtomicUsize,
}

impl FakeSignaling {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Pre-wires the inbound channel without going through `connect`.
    pub fn attach(&self) -> mpsc::UnboundedReceiver<SignalingEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.inbound.lock().unwrap() = Some(tx);
        rx
    }

    pub fn fail_connect_with(&self, err: MeetError) {
        *self.fail_connect.lock().unwrap() = Some(err);
    }

    pub fn fail_join_with(&self, err: MeetError) {
        *self.fail_join.lock().unwrap() = Some(err);
    }

    pub fn push(&self, event: SignalingEvent) {
        if let Some(tx) = self.inbound.lock().unwrap().as_ref() {
            let _ = tx.send(event);
        }
    }

    /// Drops the inbound sender, ending the event stream.
    pub fn close_inbound(&self) {
        self.inbound.lock().unwrap().take();
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn joins(&self) -> Vec<JoinRoom> {
        self.joins.lock().unwrap().clone()
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalingChannel for FakeSignaling {
    async fn connect(&self, _room_id: &str) -> Result<mpsc::UnboundedReceiver<SignalingEvent>, MeetError> {
        if let Some(err) = self.fail_connect.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.attach())
    }

    async fn join(&self, request: JoinRoom) -> Result<(), MeetError> {
        if let Some(err) = self.fail_join.lock().unwrap().take() {
            return Err(err);
        }
        self.joins.lock().unwrap().push(request);
        Ok(())
    }

    fn send(&self, message: OutboundMessage) -> Result<(), MeetError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeSender {
    track: Mutex<Option<Arc<dyn MediaTrack>>>,
    fail: AtomicBool,
}

impl FakeSender {
    fn new(track: Option<Arc<dyn MediaTrack>>) -> Arc<Self> {
        Arc::new(Self {
            track: Mutex::new(track),
            fail: AtomicBool::new(false),
        })
    }
}

impl TrackSender for FakeSender {
    fn track(&self) -> Option<Arc<dyn MediaTrack>> {
        self.track.lock().unwrap().clone()
    }

    fn replace_track(&self, track: Arc<dyn MediaTrack>) -> Result<(), MeetError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MeetError::CallNegotiation {
                peer_id: String::new(),
                reason: "sender rejected track".into(),
            });
        }
        *self.track.lock().unwrap() = Some(track);
        Ok(())
    }
}

pub struct FakeLink {
    peer_id: String,
    senders: Vec<Arc<FakeSender>>,
    answered: Mutex<Option<Arc<MediaStream>>>,
    closes: AtomicUsize,
}

impl FakeLink {
    /// An outbound link already sending `stream`'s video.
    pub fn new(peer_id: &str, stream: &Arc<MediaStream>) -> Arc<Self> {
        Arc::new(Self {
            peer_id: peer_id.to_string(),
            senders: vec![FakeSender::new(stream.first_video_track())],
            answered: Mutex::new(None),
            closes: AtomicUsize::new(0),
        })
    }

    /// An inbound link; its video sender is populated by `answer`.
    pub fn incoming(peer_id: &str) -> Arc<Self> {
        Arc::new(Self {
            peer_id: peer_id.to_string(),
            senders: vec![FakeSender::new(None)],
            answered: Mutex::new(None),
            closes: AtomicUsize::new(0),
        })
    }

    pub fn without_video_sender(peer_id: &str) -> Arc<Self> {
        Arc::new(Self {
            peer_id: peer_id.to_string(),
            senders: Vec::new(),
            answered: Mutex::new(None),
            closes: AtomicUsize::new(0),
        })
    }

    pub fn video_track_id(&self) -> Option<String> {
        let sender = self.senders.first()?;
        sender.track().map(|t| t.id().to_string())
    }

    pub fn fail_replacements(&self) {
        for sender in &self.senders {
            sender.fail.store(true, Ordering::SeqCst);
        }
    }

    pub fn allow_replacements(&self) {
        for sender in &self.senders {
            sender.fail.store(false, Ordering::SeqCst);
        }
    }

    pub fn answered_with(&self) -> Option<Arc<MediaStream>> {
        self.answered.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl PeerLink for FakeLink {
    fn peer_id(&self) -> &str {
        &self.peer_id
    }

    fn answer(&self, stream: Arc<MediaStream>) -> Result<(), MeetError> {
        if let Some(sender) = self.senders.first() {
            let mut track = sender.track.lock().unwrap();
            if track.is_none() {
                *track = stream.first_video_track();
            }
        }
        *self.answered.lock().unwrap() = Some(stream);
        Ok(())
    }

    fn video_senders(&self) -> Vec<Arc<dyn TrackSender>> {
        self.senders.iter().map(|s| s.clone() as Arc<dyn TrackSender>).collect()
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// A fake call: the link plus the sender side of its event stream.
#[derive(Clone)]
pub struct FakeCall {
    pub link: Arc<FakeLink>,
    pub events: mpsc::UnboundedSender<CallEvent>,
}

impl FakeCall {
    pub fn emit(&self, event: CallEvent) {
        let _ = self.events.send(event);
    }

    fn pair(link: Arc<FakeLink>) -> (Self, CallHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = CallHandle {
            link: link.clone(),
            events: rx,
        };
        (Self { link, events: tx }, handle)
    }
}

pub struct FakeLinks {
    local_peer_id: String,
    incoming: Mutex<Option<mpsc::UnboundedSender<IncomingCall>>>,
    dials: Mutex<Vec<(String, FakeCall)>>,
    failing_peers: Mutex<HashSet<String>>,
    no_sender_peers: Mutex<HashSet<String>>,
    destroyed: AtomicUsize,
}

impl FakeLinks {
    pub fn new(local_peer_id: &str) -> Arc<Self> {
        Arc::new(Self {
            local_peer_id: local_peer_id.to_string(),
            incoming: Mutex::new(None),
            dials: Mutex::new(Vec::new()),
            failing_peers: Mutex::new(HashSet::new()),
            no_sender_peers: Mutex::new(HashSet::new()),
            destroyed: AtomicUsize::new(0),
        })
    }

    pub fn fail_dials_to(&self, peer_id: &str) {
        self.failing_peers.lock().unwrap().insert(peer_id.to_string());
    }

    pub fn without_video_sender_for(&self, peer_id: &str) {
        self.no_sender_peers.lock().unwrap().insert(peer_id.to_string());
    }

    /// Builds an incoming call without delivering it.
    pub fn make_incoming(peer_id: &str) -> (FakeCall, IncomingCall) {
        FakeCall::pair(FakeLink::incoming(peer_id))
    }

    /// Delivers an incoming call through the channel returned by `open`.
    pub fn push_incoming(&self, peer_id: &str) -> FakeCall {
        let (call, handle) = Self::make_incoming(peer_id);
        if let Some(tx) = self.incoming.lock().unwrap().as_ref() {
            let _ = tx.send(handle);
        }
        call
    }

    pub fn dials_to(&self, peer_id: &str) -> Vec<FakeCall> {
        self.dials
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == peer_id)
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn last_dial(&self, peer_id: &str) -> Option<FakeCall> {
        self.dials_to(peer_id).pop()
    }

    pub fn dial_count(&self) -> usize {
        self.dials.lock().unwrap().len()
    }

    pub fn destroy_count(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaLinks for FakeLinks {
    async fn open(&self) -> Result<(String, mpsc::UnboundedReceiver<IncomingCall>), MeetError> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.incoming.lock().unwrap() = Some(tx);
        Ok((self.local_peer_id.clone(), rx))
    }

    fn dial(&self, peer_id: &str, stream: Arc<MediaStream>) -> Result<CallHandle, MeetError> {
        if self.failing_peers.lock().unwrap().contains(peer_id) {
            return Err(MeetError::CallNegotiation {
                peer_id: peer_id.to_string(),
                reason: "peer unavailable".into(),
            });
        }
        let link = if self.no_sender_peers.lock().unwrap().contains(peer_id) {
            FakeLink::without_video_sender(peer_id)
        } else {
            FakeLink::new(peer_id, &stream)
        };
        let (call, handle) = FakeCall::pair(link);
        self.dials.lock().unwrap().push((peer_id.to_string(), call));
        Ok(handle)
    }

    fn destroy(&self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<MeetEvent>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<MeetEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl MeetEventListener for RecordingListener {
    fn on_event(&self, event: MeetEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// A session wired to fresh fakes. The links fake reports `me` as the
/// local peer id.
pub struct TestRoom {
    pub session: RoomSession,
    pub camera: FakeStream,
    pub media: Arc<FakeMediaSource>,
    pub signaling: Arc<FakeSignaling>,
    pub links: Arc<FakeLinks>,
    pub listener: Arc<RecordingListener>,
}

impl TestRoom {
    pub fn new(config: SessionConfig) -> Self {
        let camera = FakeStream::camera("cam");
        let media = FakeMediaSource::with_camera(&camera);
        Self::build(config, camera, media)
    }

    pub fn with_media(config: SessionConfig, media: Arc<FakeMediaSource>) -> Self {
        Self::build(config, FakeStream::camera("cam"), media)
    }

    pub async fn joined() -> Self {
        let room = Self::new(SessionConfig::new("room-1"));
        room.session.join().await.expect("join");
        room
    }

    fn build(config: SessionConfig, camera: FakeStream, media: Arc<FakeMediaSource>) -> Self {
        let signaling = FakeSignaling::new();
        let links = FakeLinks::new("me");
        let session = RoomSession::new(
            config,
            Capabilities {
                media: media.clone(),
                signaling: signaling.clone(),
                links: links.clone(),
            },
        );
        let listener = RecordingListener::new();
        session.add_listener(listener.clone());
        Self {
            session,
            camera,
            media,
            signaling,
            links,
            listener,
        }
    }
}
