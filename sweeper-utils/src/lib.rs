/// Purge executor: candidate selection and bulk or sequential deletion.
pub mod cleanup;
/// "Type confirm to proceed" prompts for destructive commands.
pub mod confirm;
/// Embed builders shared by commands and the scheduler.
pub mod embed;
pub mod error;
/// Lazy, paged channel history scanning.
pub mod history;
/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';
/// Pure parser helpers.
pub mod parse;
/// Permission helper utilities.
pub mod permissions;
/// The chat platform seam and its twilight implementation.
pub mod platform;
/// In-memory platform for tests in this and dependent crates.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
/// Shared time helpers.
pub mod time;

pub use error::ModerationError;
pub use platform::{MessagePlatform, MessageRecord};
