// Model downloader
// Uses the HuggingFace Hub for download management and caching

use anyhow::{Context, Result};
use hf_hub::{api::sync::ApiBuilder, Repo, RepoType};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

/// Files a T5-style checkpoint needs for loading.
const MODEL_FILES: &[&str] = &["config.json", "tokenizer.json", "model.safetensors"];

/// Downloads pretrained model files into the HF cache.
pub struct ModelDownloader {
    token: Option<String>,
}

impl ModelDownloader {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Fetch the model's files and return the cache directory holding them.
    /// Files already cached are not re-downloaded.
    pub fn fetch(&self, model_id: &str) -> Result<PathBuf> {
        let api = ApiBuilder::new()
            .with_token(self.token.clone())
            .build()
            .context("Failed to initialize HuggingFace Hub API")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        tracing::info!(model_id, "Downloading model files");

        let pb = ProgressBar::new(MODEL_FILES.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        let mut model_dir = None;
        for &file in MODEL_FILES {
            pb.set_message(format!("Downloading {file}"));
            let path = repo
                .get(file)
                .with_context(|| format!("Failed to download {file} for {model_id}"))?;
            tracing::debug!(file, path = %path.display(), "Downloaded");
            model_dir = path.parent().map(|p| p.to_path_buf());
            pb.inc(1);
        }
        pb.finish_with_message("Download complete");

        model_dir.context("No files downloaded - check network connection")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downloader_builds_without_token() {
        // Construction must not touch the network
        let _ = ModelDownloader::new(None);
        let _ = ModelDownloader::new(Some("hf_test".to_string()));
    }

    #[test]
    #[ignore] // Requires network - run with: cargo test -- --ignored
    fn test_fetch_small_model() {
        let downloader = ModelDownloader::new(None);
        match downloader.fetch("google/flan-t5-small") {
            Ok(dir) => {
                assert!(dir.join("config.json").exists());
                assert!(dir.join("tokenizer.json").exists());
            }
            Err(e) => println!("Download failed (expected if offline): {e}"),
        }
    }
}
