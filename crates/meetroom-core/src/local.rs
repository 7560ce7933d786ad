use std::collections::HashSet;
use std::sync::Arc;

use crate::media::{MediaStream, TrackKind};

/// UI-facing view of the local media flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalStatus {
    pub muted: bool,
    pub video_off: bool,
    pub screen_sharing: bool,
}

/// This client's media and status.
///
/// Sole owner of the camera, microphone and screen tracks: every
/// `enabled` flip and every `stop()` goes through here, and a track is
/// stopped at most once.
pub struct LocalSessionState {
    camera: Arc<MediaStream>,
    published: Arc<MediaStream>,
    screen: Option<Arc<MediaStream>>,
    muted: bool,
    video_off: bool,
    stopped: HashSet<String>,
}

impl LocalSessionState {
    pub fn new(camera: Arc<MediaStream>, audio_on: bool, video_on: bool) -> Self {
        let state = Self {
            published: camera.clone(),
            camera,
            screen: None,
            muted: !audio_on,
            video_off: !video_on,
            stopped: HashSet::new(),
        };
        state.apply_audio();
        state.apply_video();
        state
    }

    /// The stream currently sent to peers and shown in the local preview.
    pub fn published_stream(&self) -> &Arc<MediaStream> {
        &self.published
    }

    pub fn screen_stream(&self) -> Option<&Arc<MediaStream>> {
        self.screen.as_ref()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_video_off(&self) -> bool {
        self.video_off
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.screen.is_some()
    }

    pub fn status(&self) -> LocalStatus {
        LocalStatus {
            muted: self.muted,
            video_off: self.video_off,
            screen_sharing: self.is_screen_sharing(),
        }
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.muted = !enabled;
        self.apply_audio();
    }

    pub fn set_video_enabled(&mut self, enabled: bool) {
        self.video_off = !enabled;
        self.apply_video();
    }

    /// Publishes `screen` in place of the camera. The camera stream is
    /// retained untouched so it can be restored later.
    pub fn begin_screen_share(&mut self, screen: Arc<MediaStream>) {
        if let Some(previous) = self.screen.replace(screen.clone()) {
            self.stop_stream(&previous);
        }
        self.published = screen;
        self.apply_video();
    }

    /// Reverts publication to the retained camera stream.
    ///
    /// With `ended_externally` the screen tracks are already ending on the
    /// platform side; they are recorded as stopped without a second `stop()`.
    pub fn end_screen_share(&mut self, ended_externally: bool) -> bool {
        let Some(screen) = self.screen.take() else {
            return false;
        };
        if ended_externally {
            self.stopped.extend(screen.tracks().iter().map(|t| t.id().to_string()));
        } else {
            self.stop_stream(&screen);
        }
        self.published = self.camera.clone();
        self.apply_video();
        true
    }

    /// Stops a stream this state never published (e.g. a late screen capture).
    pub fn discard(&mut self, stream: &Arc<MediaStream>) {
        self.stop_stream(stream);
    }

    /// Releases every device track. Safe to call more than once.
    pub fn release_all(&mut self) {
        if let Some(screen) = self.screen.take() {
            self.stop_stream(&screen);
        }
        let camera = self.camera.clone();
        self.stop_stream(&camera);
        self.published = camera;
    }

    fn stop_stream(&mut self, stream: &Arc<MediaStream>) {
        for track in stream.tracks() {
            if self.stopped.insert(track.id().to_string()) {
                track.stop();
            }
        }
    }

    fn apply_audio(&self) {
        for track in self.camera.tracks_of(TrackKind::Audio) {
            track.set_enabled(!self.muted);
        }
    }

    fn apply_video(&self) {
        for track in self.published.tracks_of(TrackKind::Video) {
            track.set_enabled(!self.video_off);
        }
    }
}
