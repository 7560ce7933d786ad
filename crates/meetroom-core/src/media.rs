use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::errors::MeetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// A single local or remote media track.
///
/// Implemented by the platform media layer. `stop()` releases the
/// underlying device; callers inside this crate go through
/// [`LocalSessionState`](crate::local::LocalSessionState) so a track is
/// stopped at most once.
pub trait MediaTrack: Send + Sync {
    fn id(&self) -> &str;
    fn kind(&self) -> TrackKind;
    fn set_enabled(&self, enabled: bool);
    fn is_enabled(&self) -> bool;
    fn stop(&self);
}

/// A bundle of tracks produced by a device or delivered by a call.
///
/// Identity is pointer identity of the `Arc<MediaStream>`: two streams
/// are "the same instance" only if [`MediaStream::same`] says so.
pub struct MediaStream {
    id: String,
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(id: impl Into<String>, tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &Arc<dyn MediaTrack>> {
        self.tracks.iter().filter(move |t| t.kind() == kind)
    }

    pub fn first_video_track(&self) -> Option<Arc<dyn MediaTrack>> {
        self.tracks_of(TrackKind::Video).next().cloned()
    }

    pub fn same(a: &Arc<MediaStream>, b: &Arc<MediaStream>) -> bool {
        Arc::ptr_eq(a, b)
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tracks: Vec<(&str, TrackKind)> = self.tracks.iter().map(|t| (t.id(), t.kind())).collect();
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &tracks)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    pub const CAMERA_AND_MIC: MediaConstraints = MediaConstraints {
        audio: true,
        video: true,
    };
}

/// A screen capture handed out by the platform picker.
///
/// `ended` resolves when the platform stops the share on its own
/// (e.g. the user clicks "Stop sharing" in the OS overlay).
pub struct ScreenCapture {
    pub stream: Arc<MediaStream>,
    pub ended: BoxFuture<'static, ()>,
}

impl fmt::Debug for ScreenCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenCapture").field("stream", &self.stream).finish_non_exhaustive()
    }
}

/// Camera, microphone and screen acquisition.
#[async_trait]
pub trait LocalMediaSource: Send + Sync {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<Arc<MediaStream>, MeetError>;

    /// Opens the screen picker. Returns [`MeetError::ScreenCaptureDeclined`]
    /// when the user cancels it.
    async fn acquire_display(&self) -> Result<ScreenCapture, MeetError>;
}
