//! Social channels. Neither has a delivery API wired up, so both always decline.

use async_trait::async_trait;

use crate::channels::Sender;
use crate::error::ChannelError;

/// Instagram direct messages. Not implemented; every send reports failure.
pub struct InstagramSender;

impl InstagramSender {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InstagramSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sender for InstagramSender {
    fn name(&self) -> &str {
        "instagram"
    }

    async fn send(&self, handle: &str, _subject: &str, _body: &str) -> bool {
        tracing::warn!(
            "{}, not sent to {handle}",
            ChannelError::Unsupported(self.name().into())
        );
        false
    }
}

/// SoundCloud messages. Rows on this channel are rejected before sending.
pub struct SoundCloudSender;

impl SoundCloudSender {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SoundCloudSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sender for SoundCloudSender {
    fn name(&self) -> &str {
        "soundcloud"
    }

    async fn send(&self, handle: &str, _subject: &str, _body: &str) -> bool {
        tracing::warn!(
            "{}, not sent to {handle}",
            ChannelError::Unsupported(self.name().into())
        );
        false
    }
}
