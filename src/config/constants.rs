// Project-wide constants
//
// Centralised here so file names and other magic values have one source of
// truth. Import via `use crate::config::constants::*;`.

/// Default pretrained model, overridable with the `HF_MODEL` env var.
pub const DEFAULT_MODEL_ID: &str = "google/flan-t5-small";

/// Corpus file produced by `medchat prepare` and consumed by `medchat train`.
pub const DATA_FILE: &str = "final_medchat_data.jsonl";

/// Directory the fine-tuned model and tokenizer are written to.
pub const MODEL_OUTPUT_DIR: &str = "medchat_model";

/// Default bind address for the chat server (localhost only).
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8000";

/// Seed for the corpus shuffle. Fixed so two runs over the same input
/// collection produce the same output ordering.
pub const SHUFFLE_SEED: u64 = 42;

/// Padding/truncation length for tokenized inputs during training.
pub const MAX_INPUT_TOKENS: usize = 128;

/// Padding/truncation length for tokenized targets during training.
pub const MAX_TARGET_TOKENS: usize = 128;

/// Output cap for a single chat generation.
pub const MAX_REPLY_TOKENS: usize = 256;

/// System prompt seeded into every new session.
pub const SYSTEM_PROMPT: &str = "You are MediChat, a medical assistant. \
Ask structured follow-up questions (return JSON with \"question\" and \"options\") \
until you can propose a diagnosis.";

/// Base URL of the HuggingFace datasets-server rows API.
pub const DATASETS_SERVER_URL: &str = "https://datasets-server.huggingface.co";

/// Rows fetched per datasets-server page (the API maximum).
pub const ROWS_PAGE_SIZE: usize = 100;

/// Default maximum number of live sessions before eviction kicks in.
pub const DEFAULT_MAX_SESSIONS: usize = 100;

/// Default idle timeout after which a session may be evicted.
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: u64 = 30;
