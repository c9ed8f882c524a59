use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use time::{Date, OffsetDateTime, Time};

use crate::domain::platform::Platform;

/// A media file handed over by the composing client. Held in memory only
/// until submit; nothing here touches durable storage.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub content_type: String,
    pub data: Bytes,
}

/// Displayable representation of an attached file, producible without any
/// network round trip and discarded on `clear_media`.
#[derive(Debug, Clone)]
pub struct LocalPreview {
    pub data_uri: String,
}

/// In-progress composition state for one compose session. Mutators each
/// touch exactly one field; conversion to a durable post happens only
/// through `scheduled_at` + the create call at submit time.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    content: String,
    platforms: Vec<Platform>,
    scheduled_date: Option<Date>,
    scheduled_time: Option<Time>,
    media: Option<MediaFile>,
}

impl PostDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Adds the platform if absent, removes it if present. Selection order
    /// is preserved; no other field changes.
    pub fn toggle_platform(&mut self, platform: Platform) {
        match self.platforms.iter().position(|p| *p == platform) {
            Some(index) => {
                self.platforms.remove(index);
            }
            None => self.platforms.push(platform),
        }
    }

    pub fn set_schedule(&mut self, date: Date, time: Time) {
        self.scheduled_date = Some(date);
        self.scheduled_time = Some(time);
    }

    /// Local-only accept step: stores the file and returns a `data:` URI
    /// preview. Reversible via `clear_media`.
    pub fn attach_media(&mut self, file: MediaFile) -> LocalPreview {
        let data_uri = format!(
            "data:{};base64,{}",
            file.content_type,
            STANDARD.encode(&file.data)
        );
        self.media = Some(file);
        LocalPreview { data_uri }
    }

    pub fn clear_media(&mut self) {
        self.media = None;
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn media(&self) -> Option<&MediaFile> {
        self.media.as_ref()
    }

    pub fn has_schedule(&self) -> bool {
        self.scheduled_date.is_some() && self.scheduled_time.is_some()
    }

    /// Combines the scheduled date and time into a single UTC instant.
    /// None until both halves are set.
    pub fn scheduled_at(&self) -> Option<OffsetDateTime> {
        let date = self.scheduled_date?;
        let time = self.scheduled_time?;
        Some(date.with_time(time).assume_utc())
    }
}
