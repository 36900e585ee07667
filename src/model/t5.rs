// T5 generation with Candle
//
// Loads a FLAN-T5 checkpoint (config + tokenizer + safetensors) and runs
// greedy encoder-decoder generation behind the `Generate` trait.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::t5;
use tokenizers::Tokenizer;

use super::Generate;

/// A loaded T5 model ready for inference.
///
/// The model is behind a mutex because Candle's decode path mutates the KV
/// cache; callers share the generator through an `Arc` and generation calls
/// serialize on the lock.
pub struct T5Generator {
    model: Mutex<t5::T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    config: t5::Config,
    device: Device,
}

impl T5Generator {
    /// Load a checkpoint from a directory holding `config.json`,
    /// `tokenizer.json` and `model.safetensors`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = Device::Cpu;

        let tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| anyhow!("Failed to load tokenizer: {e}"))?;

        let config_str = std::fs::read_to_string(model_dir.join("config.json"))
            .context("Failed to read config.json")?;
        let config: t5::Config =
            serde_json::from_str(&config_str).context("Failed to parse config.json")?;

        let weights_path = model_dir.join("model.safetensors");
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .context("Failed to load model weights")?
        };
        let model = t5::T5ForConditionalGeneration::load(vb, &config)
            .context("Failed to build T5 model")?;

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            config,
            device,
        })
    }

    fn decoder_start_token(&self) -> u32 {
        self.config
            .decoder_start_token_id
            .unwrap_or(self.config.pad_token_id) as u32
    }
}

impl Generate for T5Generator {
    /// Greedy (non-sampling) decode, capped at `max_tokens` new tokens.
    fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| anyhow!("Failed to tokenize prompt: {e}"))?;
        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;

        let mut model = self
            .model
            .lock()
            .map_err(|_| anyhow!("Model lock poisoned"))?;
        model.clear_kv_cache();

        let encoder_output = model.encode(&input_ids)?;

        // Temperature None makes the processor argmax, i.e. deterministic
        let mut logits_processor = LogitsProcessor::new(0, None, None);
        let mut output_ids = vec![self.decoder_start_token()];

        for index in 0..max_tokens {
            let decoder_ids = if index == 0 || !self.config.use_cache {
                Tensor::new(output_ids.as_slice(), &self.device)?.unsqueeze(0)?
            } else {
                let last = &output_ids[output_ids.len() - 1..];
                Tensor::new(last, &self.device)?.unsqueeze(0)?
            };

            let logits = model.decode(&decoder_ids, &encoder_output)?.squeeze(0)?;
            let next = logits_processor.sample(&logits)?;
            if next as usize == self.config.eos_token_id {
                break;
            }
            output_ids.push(next);
        }

        let text = self
            .tokenizer
            .decode(&output_ids[1..], true)
            .map_err(|e| anyhow!("Failed to decode output: {e}"))?;
        Ok(text.trim().to_string())
    }
}
