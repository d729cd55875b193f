//! Outbound alert channels implementing the `Notifier` port.

pub mod email;
pub mod fanout;
pub mod noop;
pub mod telegram;
