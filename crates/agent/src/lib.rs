//! The chat pipeline of campusbot.
//!
//! A user message travels through three steps:
//!
//! 1. **Assemble** the prompt: system block (preamble, notes, catalog
//!    brief), the recent history window, then the new user turn
//! 2. **Complete** it upstream and normalize the reply
//! 3. **Record** the user/assistant pair in the session store, on success only
//!
//! [`ChatRelay`] sequences the steps; [`PromptAssembler`] and
//! [`CompletionGateway`] are usable on their own.

pub mod completion;
pub mod prompt;
pub mod relay;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use completion::{CompletionGateway, DEFAULT_TEMPERATURE, FALLBACK_REPLY};
pub use prompt::PromptAssembler;
pub use relay::{ChatRelay, RelayError};
