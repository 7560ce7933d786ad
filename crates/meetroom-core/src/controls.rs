use crate::coordinator::ReplacementReport;
use crate::errors::MeetError;
use crate::local::LocalStatus;
use crate::session::{Command, CommandLink};

/// Controls for local media (microphone, camera, screen share).
///
/// Every call is applied by the session task; toggles are broadcast to the
/// room as status changes.
#[derive(Clone)]
pub struct MeetingControls {
    link: CommandLink,
}

impl MeetingControls {
    pub(crate) fn new(link: CommandLink) -> Self {
        Self { link }
    }

    /// Toggle the microphone on/off.
    pub async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), MeetError> {
        self.link.request(|reply| Command::SetAudio { enabled, reply }).await??;
        tracing::info!("microphone enabled: {enabled}");
        Ok(())
    }

    /// Toggle the camera on/off. Applies to whatever is being published,
    /// including a screen share.
    pub async fn set_camera_enabled(&self, enabled: bool) -> Result<(), MeetError> {
        self.link.request(|reply| Command::SetVideo { enabled, reply }).await??;
        tracing::info!("camera enabled: {enabled}");
        Ok(())
    }

    /// Open the screen picker and publish the chosen screen in place of the
    /// camera on every open call.
    ///
    /// Declining the picker yields [`MeetError::ScreenCaptureDeclined`] and
    /// leaves the camera published. Peers whose track could not be swapped
    /// are listed in the report's `failed`.
    pub async fn start_screen_share(&self) -> Result<ReplacementReport, MeetError> {
        self.link.request(|reply| Command::StartScreenShare { reply }).await?
    }

    /// Stop sharing and restore the camera. A no-op when not sharing.
    pub async fn stop_screen_share(&self) -> Result<ReplacementReport, MeetError> {
        self.link.request(|reply| Command::StopScreenShare { reply }).await?
    }

    pub async fn local_status(&self) -> Result<LocalStatus, MeetError> {
        Ok(self.link.snapshot().await?.local)
    }

    /// Check if microphone is currently enabled.
    pub async fn is_microphone_enabled(&self) -> bool {
        self.local_status().await.is_ok_and(|s| !s.muted)
    }

    /// Check if camera is currently enabled.
    pub async fn is_camera_enabled(&self) -> bool {
        self.local_status().await.is_ok_and(|s| !s.video_off)
    }

    pub async fn is_screen_sharing(&self) -> bool {
        self.local_status().await.is_ok_and(|s| s.screen_sharing)
    }
}
