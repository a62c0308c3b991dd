//! Report delivery.
//!
//! This crate provides:
//! - the `Reporter` trait used by the report pipeline
//! - Telegram Bot API delivery
//! - splitting of long messages at Telegram's size limit

pub mod error;
pub mod reporter;
pub mod split;
pub mod telegram;

pub use error::DeliveryError;
pub use reporter::Reporter;
pub use split::{split_message, utf16_len};
pub use telegram::{TelegramConfig, TelegramReporter, MAX_MESSAGE_UTF16, TELEGRAM_API_BASE};
