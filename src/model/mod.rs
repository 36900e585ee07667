// Model plumbing
//
// Downloading pretrained weights from the HuggingFace Hub and running
// seq2seq generation with Candle.

pub mod download;
pub mod t5;

pub use download::ModelDownloader;
pub use t5::T5Generator;

use anyhow::Result;

/// Text generation seam. The server only depends on this trait so tests can
/// substitute a stub for the real model.
pub trait Generate: Send + Sync {
    /// Generate a continuation for `prompt`, capped at `max_tokens` new tokens.
    fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String>;
}
