//! Notification system module.
//!
//! Announces zones that became Snippets-enabled since the last scheduled run.
//! Delivery is fire-and-forget through a single configured channel.

pub mod channels;
pub mod dispatcher;
pub mod message;

pub use channels::{NotificationChannel, TelegramChannel, TelegramConfig};
pub use dispatcher::{DetachedSend, NotificationDispatcher};
pub use message::NotificationMessage;
