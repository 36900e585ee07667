// Fine-tuning
//
// Reads the corpus JSONL, tokenizes inputs and targets to fixed length, and
// runs a teacher-forced cross-entropy loop over the pretrained T5 weights.
// Success is the configured number of epochs completing without an error;
// there is no eval split and no early stopping.

mod trainer;

pub use trainer::{Seq2SeqTrainer, TrainingArguments};

use anyhow::{Context, Result};

use crate::config::Config;
use crate::corpus;
use crate::model::ModelDownloader;

/// Entry point for `medchat train`.
pub fn run(config: &Config) -> Result<()> {
    let examples = corpus::read_jsonl(&config.data_file).with_context(|| {
        format!(
            "Failed to load corpus {} (run `medchat prepare` first)",
            config.data_file.display()
        )
    })?;
    tracing::info!(examples = examples.len(), "Corpus loaded");

    let model_dir = ModelDownloader::new(config.hf_token.clone()).fetch(&config.model_id)?;

    let args = TrainingArguments {
        output_dir: config.model_dir.clone(),
        ..TrainingArguments::default()
    };

    tracing::info!("Starting training");
    let mut trainer = Seq2SeqTrainer::new(&model_dir, args)?;
    trainer.train(&examples)?;
    trainer.save()?;
    tracing::info!(output_dir = %config.model_dir.display(), "Model saved");

    Ok(())
}
