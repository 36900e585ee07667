// Seq2seq trainer built on Candle
//
// Teacher-forced fine-tuning of a T5 checkpoint: inputs and targets are
// tokenized to a fixed length, the decoder is driven one position at a time
// over the target sequence, and AdamW steps the weights with gradient
// accumulation. Checkpoints are written periodically as safetensors.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{ops::log_softmax, AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use candle_transformers::models::t5;
use tokenizers::Tokenizer;

use crate::config::constants::{MAX_INPUT_TOKENS, MAX_TARGET_TOKENS};
use crate::corpus::TrainingExample;

/// Declarative training configuration, mirrored from the usual seq2seq
/// fine-tuning defaults for this model family.
#[derive(Debug, Clone)]
pub struct TrainingArguments {
    pub output_dir: PathBuf,
    pub per_device_train_batch_size: usize,
    pub gradient_accumulation_steps: usize,
    pub num_train_epochs: usize,
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub logging_steps: usize,
    pub save_steps: usize,
    /// Train in f16 where the device supports it (ignored on CPU).
    pub mixed_precision: bool,
}

impl Default for TrainingArguments {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("medchat_model"),
            per_device_train_batch_size: 4,
            gradient_accumulation_steps: 2,
            num_train_epochs: 3,
            learning_rate: 5e-5,
            weight_decay: 0.01,
            logging_steps: 100,
            save_steps: 500,
            mixed_precision: true,
        }
    }
}

pub struct Seq2SeqTrainer {
    model: t5::T5ForConditionalGeneration,
    varmap: VarMap,
    tokenizer: Tokenizer,
    config: t5::Config,
    args: TrainingArguments,
    device: Device,
    /// Source checkpoint dir; tokenizer/config are copied from here on save
    model_dir: PathBuf,
}

impl Seq2SeqTrainer {
    /// Load the pretrained checkpoint into trainable variables.
    pub fn new(model_dir: &Path, args: TrainingArguments) -> Result<Self> {
        let device = Device::Cpu;
        let dtype = if args.mixed_precision && device.is_cuda() {
            DType::F16
        } else {
            DType::F32
        };

        let tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| anyhow!("Failed to load tokenizer: {e}"))?;

        let config_str = std::fs::read_to_string(model_dir.join("config.json"))
            .context("Failed to read config.json")?;
        let mut config: t5::Config =
            serde_json::from_str(&config_str).context("Failed to parse config.json")?;
        // The loss path decodes full prefixes; the KV cache would only get in
        // the way of the gradient graph.
        config.use_cache = false;

        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, dtype, &device);
        let model = t5::T5ForConditionalGeneration::load(vb, &config)
            .context("Failed to build T5 model")?;
        varmap
            .load(model_dir.join("model.safetensors"))
            .context("Failed to load pretrained weights")?;

        Ok(Self {
            model,
            varmap,
            tokenizer,
            config,
            args,
            device,
            model_dir: model_dir.to_path_buf(),
        })
    }

    /// Run the configured number of epochs over the corpus.
    pub fn train(&mut self, examples: &[TrainingExample]) -> Result<()> {
        let params = ParamsAdamW {
            lr: self.args.learning_rate,
            weight_decay: self.args.weight_decay,
            ..Default::default()
        };
        let mut optimizer = AdamW::new(self.varmap.all_vars(), params)?;

        let mut global_step = 0usize;
        let mut pending: Vec<Tensor> = Vec::new();

        for epoch in 0..self.args.num_train_epochs {
            for batch in examples.chunks(self.args.per_device_train_batch_size) {
                let Some(loss) = self.batch_loss(batch)? else {
                    continue;
                };
                pending.push(loss);

                if pending.len() == self.args.gradient_accumulation_steps {
                    global_step += 1;
                    self.optimizer_step(&mut optimizer, &mut pending, epoch, global_step)?;
                }
            }
        }

        // Flush a trailing partial accumulation window
        if !pending.is_empty() {
            global_step += 1;
            self.optimizer_step(&mut optimizer, &mut pending, self.args.num_train_epochs, global_step)?;
        }

        tracing::info!(global_step, "Training finished");
        Ok(())
    }

    fn optimizer_step(
        &self,
        optimizer: &mut AdamW,
        pending: &mut Vec<Tensor>,
        epoch: usize,
        global_step: usize,
    ) -> Result<()> {
        let loss = mean_of(pending)?;
        optimizer.backward_step(&loss)?;
        pending.clear();

        if global_step % self.args.logging_steps == 0 {
            tracing::info!(epoch, global_step, loss = loss.to_scalar::<f32>()?, "Step");
        }
        if global_step % self.args.save_steps == 0 {
            self.checkpoint(global_step)?;
        }
        Ok(())
    }

    /// Mean masked cross-entropy over one batch, or `None` when every target
    /// in the batch is empty.
    fn batch_loss(&mut self, batch: &[TrainingExample]) -> Result<Option<Tensor>> {
        let pad = self.config.pad_token_id as u32;
        let batch_size = batch.len();

        let mut input_flat = Vec::with_capacity(batch_size * MAX_INPUT_TOKENS);
        let mut targets = Vec::with_capacity(batch_size);
        for example in batch {
            input_flat.extend(self.encode_padded(&example.input, MAX_INPUT_TOKENS, pad)?);
            targets.push(self.encode_padded(&example.target, MAX_TARGET_TOKENS, pad)?);
        }

        let steps = effective_steps(&targets, pad);
        if steps == 0 {
            return Ok(None);
        }

        let input_ids = Tensor::from_vec(input_flat, (batch_size, MAX_INPUT_TOKENS), &self.device)?;
        let encoder_output = self.model.encode(&input_ids)?;

        let start = self
            .config
            .decoder_start_token_id
            .unwrap_or(self.config.pad_token_id) as u32;

        let mut total_loss: Option<Tensor> = None;
        let mut token_count = 0usize;

        for t in 0..steps {
            // Decoder sees start + target[..t]; the logits predict target[t]
            let mut decoder_flat = Vec::with_capacity(batch_size * (t + 1));
            let mut step_targets = Vec::with_capacity(batch_size);
            let mut mask = Vec::with_capacity(batch_size);
            for row in &targets {
                decoder_flat.push(start);
                decoder_flat.extend(&row[..t]);
                step_targets.push(row[t]);
                mask.push(if row[t] == pad { 0f32 } else { 1f32 });
            }
            let live = mask.iter().filter(|&&m| m > 0.0).count();
            if live == 0 {
                break;
            }

            let decoder_ids =
                Tensor::from_vec(decoder_flat, (batch_size, t + 1), &self.device)?;
            let logits = self.model.decode(&decoder_ids, &encoder_output)?;

            let log_probs = log_softmax(&logits, D::Minus1)?;
            let picked = log_probs
                .gather(&Tensor::from_vec(step_targets, (batch_size, 1), &self.device)?, 1)?
                .squeeze(1)?;
            let mask_t = Tensor::from_vec(mask, (batch_size,), &self.device)?;
            let step_loss = (picked.neg()? * &mask_t)?.sum_all()?;

            total_loss = Some(match total_loss {
                Some(acc) => (acc + step_loss)?,
                None => step_loss,
            });
            token_count += live;
        }

        match total_loss {
            Some(loss) => Ok(Some(loss.affine(1.0 / token_count as f64, 0.0)?)),
            None => Ok(None),
        }
    }

    fn encode_padded(&self, text: &str, max_len: usize, pad: u32) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Failed to tokenize: {e}"))?;
        Ok(pad_or_truncate(encoding.get_ids(), max_len, pad))
    }

    fn checkpoint(&self, global_step: usize) -> Result<()> {
        std::fs::create_dir_all(&self.args.output_dir)?;
        let path = self
            .args
            .output_dir
            .join(format!("checkpoint-{global_step}.safetensors"));
        self.varmap
            .save(&path)
            .with_context(|| format!("Failed to write checkpoint {}", path.display()))?;
        tracing::info!(global_step, path = %path.display(), "Checkpoint saved");
        Ok(())
    }

    /// Persist the fine-tuned weights plus tokenizer/config alongside them.
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.args.output_dir)?;
        self.varmap
            .save(self.args.output_dir.join("model.safetensors"))
            .context("Failed to save model weights")?;
        for file in ["tokenizer.json", "config.json"] {
            std::fs::copy(self.model_dir.join(file), self.args.output_dir.join(file))
                .with_context(|| format!("Failed to copy {file}"))?;
        }
        Ok(())
    }
}

/// Pad with `pad` or truncate so the sequence is exactly `max_len` long.
fn pad_or_truncate(ids: &[u32], max_len: usize, pad: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(max_len);
    out.extend(ids.iter().copied().take(max_len));
    out.resize(max_len, pad);
    out
}

/// Number of decoder steps worth running for a batch: the longest non-pad
/// prefix among the target rows.
fn effective_steps(targets: &[Vec<u32>], pad: u32) -> usize {
    targets
        .iter()
        .map(|row| row.iter().position(|&t| t == pad).unwrap_or(row.len()))
        .max()
        .unwrap_or(0)
}

fn mean_of(losses: &[Tensor]) -> Result<Tensor> {
    let mut acc = losses[0].clone();
    for loss in &losses[1..] {
        acc = (acc + loss)?;
    }
    Ok(acc.affine(1.0 / losses.len() as f64, 0.0)?)
}
