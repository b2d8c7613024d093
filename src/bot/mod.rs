pub mod commands;
pub mod telegram;

pub use commands::{Command, CommandError};
pub use telegram::{IncomingMessage, TelegramClient};
