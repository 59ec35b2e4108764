//! Cross-messenger abstractions (Telegram today).

pub mod port;
pub mod split;
pub mod types;
