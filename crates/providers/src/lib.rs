//! Upstream provider implementations for campusbot.
//!
//! All providers implement the `campusbot_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
