// Corpus builder
//
// Pulls in two hosted HuggingFace datasets, scrapes the hardcoded CDC topic
// pages, and writes everything out as one shuffled JSONL file for training.

pub mod hosted;
pub mod scrape;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::constants::{DATASETS_SERVER_URL, SHUFFLE_SEED};
use crate::config::Config;

/// One normalized training example. Both fields are always present; the
/// normalizers floor missing source fields to the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub input: String,
    pub target: String,
}

impl TrainingExample {
    pub fn new(input: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            target: target.into(),
        }
    }
}

/// Build the full corpus and write it to the configured data file.
///
/// Failure policy: any network or parse failure aborts the whole run. No
/// partial output is written, no retries.
pub async fn build(config: &Config) -> Result<()> {
    let client = reqwest::Client::new();
    let token = config.hf_token.as_deref();

    tracing::info!("Fetching hosted datasets");
    let o1 = hosted::fetch_dataset(&client, DATASETS_SERVER_URL, &hosted::MEDICAL_O1_SFT, token)
        .await
        .context("Failed to fetch medical-o1-reasoning-SFT")?;
    let medquad = hosted::fetch_dataset(&client, DATASETS_SERVER_URL, &hosted::MEDQUAD, token)
        .await
        .context("Failed to fetch MedQuAD")?;

    tracing::info!("Scraping CDC topic pages");
    let cdc = scrape::scrape_cdc(&client).await?;

    tracing::info!(
        o1 = o1.len(),
        medquad = medquad.len(),
        cdc = cdc.len(),
        "Merging sources"
    );

    let mut examples = [o1, medquad, cdc].concat();
    shuffle(&mut examples);

    let bytes = write_jsonl(&config.data_file, &examples)?;
    tracing::info!(
        examples = examples.len(),
        size_mb = format!("{:.1}", bytes as f64 / (1024.0 * 1024.0)),
        path = %config.data_file.display(),
        "Corpus written"
    );

    Ok(())
}

/// Shuffle the merged corpus with a fixed seed so the ordering is
/// reproducible across runs.
pub fn shuffle(examples: &mut [TrainingExample]) {
    let mut rng = StdRng::seed_from_u64(SHUFFLE_SEED);
    examples.shuffle(&mut rng);
}

/// Write examples as newline-delimited JSON, one object per line, UTF-8.
/// Returns the number of bytes written.
pub fn write_jsonl(path: &Path, examples: &[TrainingExample]) -> Result<u64> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create corpus file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for example in examples {
        serde_json::to_writer(&mut writer, example).context("Failed to serialize example")?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    let size = std::fs::metadata(path)?.len();
    Ok(size)
}

/// Read a JSONL corpus file back into memory.
pub fn read_jsonl(path: &Path) -> Result<Vec<TrainingExample>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file {}", path.display()))?;

    contents
        .lines()
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Malformed corpus line {}", i + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_examples(n: usize) -> Vec<TrainingExample> {
        (0..n)
            .map(|i| TrainingExample::new(format!("question {i}"), format!("answer {i}")))
            .collect()
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let mut a = sample_examples(50);
        let mut b = sample_examples(50);
        shuffle(&mut a);
        shuffle(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_actually_permutes() {
        let mut a = sample_examples(50);
        shuffle(&mut a);
        assert_ne!(a, sample_examples(50));
    }

    #[test]
    fn test_jsonl_roundtrip_preserves_count_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");

        let examples = sample_examples(10);
        let bytes = write_jsonl(&path, &examples).unwrap();
        assert!(bytes > 0);

        let read_back = read_jsonl(&path).unwrap();
        assert_eq!(read_back, examples);

        // One JSON object per line, no header/footer
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 10);
    }

    #[test]
    fn test_jsonl_allows_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");

        let examples = vec![TrainingExample::new("", "")];
        write_jsonl(&path, &examples).unwrap();
        let read_back = read_jsonl(&path).unwrap();
        assert_eq!(read_back[0].input, "");
        assert_eq!(read_back[0].target, "");
    }
}
