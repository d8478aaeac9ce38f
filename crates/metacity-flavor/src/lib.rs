//! AI flavor text for the MetaCity simulation.
//!
//! Building descriptions, newspaper headlines and tutorial hints are
//! generated by an LLM from requests derived from a game snapshot. The
//! text is cosmetic: it is shown to the player and never fed back into the
//! reducer.
//!
//! # Architecture
//!
//! ```text
//! request --> PromptEngine --> LlmBackend --> parse --> FlavorBoard
//! ```

pub mod board;
pub mod client;
pub mod config;
pub mod error;
pub mod llm;
pub mod news;
pub mod parse;
pub mod prompt;

pub use board::FlavorBoard;
pub use client::{DESCRIPTION_FAILED, FlavorClient};
pub use config::{BackendType, LlmBackendConfig};
pub use error::FlavorError;
pub use llm::{LlmBackend, create_backend};
pub use prompt::{PromptEngine, RenderedPrompt};
