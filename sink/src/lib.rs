//! Role/Notification Sink: the downstream effects of a verification.
//!
//! Granting a role is the only effect the engine counts; direct messages and
//! channel announcements are best-effort. None of these ever roll back a
//! stored verification.

pub mod discord;
pub mod error;
pub mod notification;
pub mod port;

pub use discord::{DiscordConfig, DiscordSink};
pub use error::SinkError;
pub use notification::Notification;
pub use port::RoleSink;
