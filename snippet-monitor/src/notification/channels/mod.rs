//! Notification channels.
//!
//! Only the Telegram Bot API is supported. Delivery is best effort: a
//! channel reports failure through its `Result` and is never retried.

mod telegram;

pub use telegram::{TelegramChannel, TelegramConfig};

use async_trait::async_trait;

use super::message::NotificationMessage;
use crate::Result;

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Check if the channel is enabled.
    fn is_enabled(&self) -> bool;

    /// Send a notification through this channel.
    async fn send(&self, message: &NotificationMessage) -> Result<()>;

    /// Test the channel configuration.
    async fn test(&self) -> Result<()> {
        self.send(&NotificationMessage::test_message()).await
    }
}
