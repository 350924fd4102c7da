//! Per-user conversational relay for the NutriPlan cooking assistant.
//!
//! The crate provides:
//! - A `CompletionProvider` abstraction with a Gemini client and a scripted stub.
//! - A `SessionRegistry` holding one in-memory `Transcript` per user.
//! - A `ConversationRelay` that records turns and forwards the full transcript.
//! - An axum `RelayServer` exposing the relay over HTTP (feature `server`).

mod config;
mod error;
mod llm;
mod memory;
mod message;
mod registry;
mod relay;
#[cfg(feature = "server")]
mod server;
mod telemetry;

pub use config::{AppConfig, LoggingConfig, ModelConfig, ServerConfig};
pub use error::{RelayError, Result};
pub use llm::{CompletionProvider, CompletionRequest, GeminiClient, RecordedRequest, StubProvider};
pub use memory::Transcript;
pub use message::{Role, Turn};
pub use registry::{SessionRegistry, SharedTranscript};
pub use relay::{validate_input, ConversationRelay};
#[cfg(feature = "server")]
pub use server::{shutdown_signal, RelayServer};
pub use telemetry::{env_filter, init_tracing};
