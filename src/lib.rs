//! Double-copy clipboard translation.
//!
//! Copy the same text twice in quick succession and it is sent to an
//! OpenAI-compatible chat completions endpoint (a local LM Studio server or a
//! remote API); the cleaned translation goes back to the presentation layer.

pub mod client;
pub mod config;
pub mod error;
pub mod gesture;
pub mod language;
pub mod logger;
pub mod pipeline;
pub mod platform;
pub mod prompt;
pub mod sanitize;
pub mod wrap;

pub use client::{ChatBackend, TranslationClient};
pub use config::{Config, ConnectionMode, Endpoint};
pub use error::{ErrorKind, TranslateError};
pub use gesture::GestureDetector;
pub use language::{LanguageConfig, LanguageDetector, LanguageDirection};
pub use pipeline::{
    ChannelPresenter, ClipboardSource, Delivery, ErrorResult, Orchestrator, Outcome, Pipeline,
    Presenter, RunId, TranslationResult,
};
pub use prompt::{ChatMessage, PromptBuilder, Role};
