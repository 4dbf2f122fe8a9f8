//! Channel senders for outbound messages.

pub mod email;
pub mod social;

pub use email::EmailSender;
pub use social::{InstagramSender, SoundCloudSender};

use std::collections::HashMap;

use async_trait::async_trait;

use crate::contact::Channel;

/// Delivers one message to one handle.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Channel name for logging.
    fn name(&self) -> &str;

    /// Send a message. Returns `true` only on confirmed delivery; failures are logged.
    async fn send(&self, handle: &str, subject: &str, body: &str) -> bool;
}

/// Maps each channel to the sender that serves it.
#[derive(Default)]
pub struct Senders {
    senders: HashMap<Channel, Box<dyn Sender>>,
}

impl Senders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the sender for a channel.
    pub fn add(&mut self, channel: Channel, sender: Box<dyn Sender>) {
        self.senders.insert(channel, sender);
    }

    pub fn with(mut self, channel: Channel, sender: Box<dyn Sender>) -> Self {
        self.add(channel, sender);
        self
    }

    pub fn get(&self, channel: &Channel) -> Option<&dyn Sender> {
        self.senders.get(channel).map(|s| s.as_ref())
    }

    /// Send through the channel's sender; `false` if no sender is registered.
    pub async fn dispatch(&self, channel: &Channel, handle: &str, subject: &str, body: &str) -> bool {
        match self.get(channel) {
            Some(sender) => sender.send(handle, subject, body).await,
            None => {
                tracing::warn!("No sender configured for channel {channel}");
                false
            }
        }
    }

    pub fn count(&self) -> usize {
        self.senders.len()
    }
}
