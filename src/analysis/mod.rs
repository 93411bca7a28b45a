//! Remote audio analysis
//!
//! `RemoteAnalysisClient` drives one uploaded file through
//! upload → wait for `ACTIVE` → generate → delete, and always hands back a
//! three-field result, even when a step fails.

mod client;
mod config;
mod gemini;
pub mod messages;
mod outcome;
mod parse;
mod prompt;
mod provider;

pub use client::RemoteAnalysisClient;
pub use config::AnalysisSettings;
pub use gemini::GeminiClient;
pub use outcome::{AnalysisFailure, AnalysisOutcome, AnalysisReport, FailureKind, NOT_AVAILABLE};
pub use parse::{parse_response, scan_color, strip_code_fence, COLOR_VOCABULARY};
pub use prompt::HOTLINE_PROMPT;
pub use provider::{FileState, GenerateRequest, InferenceError, InferenceProvider, RemoteFile};
