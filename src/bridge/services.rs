//! Host services implemented by the bridge: both turn into event lines.

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::host::{AudioClip, AudioPlayback, ChatAlert, ChatAlertSink};

use super::protocol::{BridgeEvent, OutgoingLine, PlaySound};

/// Sender half of the stdout writer.
pub type LineSender = mpsc::UnboundedSender<OutgoingLine>;

// ---------------------------------------------------------------------------
// ChannelChatAlerts
// ---------------------------------------------------------------------------

/// Forwards chat alerts as `chatAlert` events.
pub struct ChannelChatAlerts {
    lines: LineSender,
}

impl ChannelChatAlerts {
    pub fn new(lines: LineSender) -> Self {
        Self { lines }
    }
}

#[async_trait]
impl ChatAlertSink for ChannelChatAlerts {
    async fn send_alert(&self, alert: ChatAlert) {
        if self
            .lines
            .send(OutgoingLine::Event(BridgeEvent::ChatAlert(alert)))
            .is_err()
        {
            log::warn!("bridge: output closed, chat alert dropped");
        }
    }
}

// ---------------------------------------------------------------------------
// SpoolPlayback
// ---------------------------------------------------------------------------

/// Writes each clip to `<spool_dir>/<uuid>.mp3` and asks the host to play it
/// with a `playSound` event.
///
/// The host owns the file after the event is sent and deletes it once played.
/// If the event cannot be sent the file is removed again.
pub struct SpoolPlayback {
    spool_dir: PathBuf,
    lines: LineSender,
}

impl SpoolPlayback {
    pub fn new(spool_dir: PathBuf, lines: LineSender) -> Self {
        Self { spool_dir, lines }
    }
}

#[async_trait]
impl AudioPlayback for SpoolPlayback {
    async fn play(&self, clip: AudioClip) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.spool_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.spool_dir.display()))?;

        let path = self.spool_dir.join(format!("{}.mp3", Uuid::new_v4()));
        tokio::fs::write(&path, &clip.data)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("bridge: audio written to {}", path.display());

        let event = PlaySound {
            filepath: path.display().to_string(),
            volume: clip.volume,
            audio_output_device: clip.output_device,
            overlay_instance: clip.overlay_instance,
            wait_for_sound: clip.wait_for_completion,
        };
        if self
            .lines
            .send(OutgoingLine::Event(BridgeEvent::PlaySound(event)))
            .is_err()
        {
            // Nobody will play or delete the clip.
            if let Err(e) = tokio::fs::remove_file(&path).await {
                log::warn!("bridge: could not remove {}: {e}", path.display());
            }
            anyhow::bail!("Bridge output closed before audio could be played");
        }
        Ok(())
    }
}
