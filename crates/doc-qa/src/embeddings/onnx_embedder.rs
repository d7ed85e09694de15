//! ONNX-based embedding generation
//!
//! Runs a sentence-transformers export (all-MiniLM-L6-v2 by default)
//! in-process and produces mean-pooled, L2-normalized embeddings.

use async_trait::async_trait;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;

const HF_BASE_URL: &str = "https://huggingface.co/sentence-transformers";

/// ONNX-based text embedder
pub struct OnnxEmbedder {
    inner: Arc<OnnxModel>,
}

/// Loaded model state shared with blocking inference tasks
struct OnnxModel {
    /// ONNX Runtime session
    session: Mutex<Session>,
    /// HuggingFace tokenizer
    tokenizer: Tokenizer,
    /// Embedding dimensions
    dimensions: usize,
    /// Maximum sequence length in tokens
    max_length: usize,
    /// Texts per inference call
    batch_size: usize,
}

impl OnnxEmbedder {
    /// Load the model, downloading it into the cache directory on first use
    pub async fn new(config: &EmbeddingConfig) -> Result<Self> {
        tracing::info!("Initializing ONNX embedder with model: {}", config.model);

        let model_dir = config.cache_dir.join(&config.model);
        tokio::fs::create_dir_all(&model_dir)
            .await
            .map_err(|e| Error::Config(format!("Failed to create cache directory: {}", e)))?;

        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            download(&model_file_url(&config.model, "onnx/model.onnx"), &model_path).await?;
        }
        if !tokenizer_path.exists() {
            download(&model_file_url(&config.model, "tokenizer.json"), &tokenizer_path).await?;
        }

        let threads = std::thread::available_parallelism()
            .map(|n| n.get().min(4))
            .unwrap_or(1);

        let session = Session::builder()
            .map_err(|e| Error::embedding(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::embedding(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(threads)
            .map_err(|e| Error::embedding(format!("Failed to set threads: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| Error::embedding(format!("Failed to load model: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::embedding(format!("Failed to load tokenizer: {}", e)))?;

        tracing::info!("ONNX embedder ready ({} dimensions)", config.dimensions);

        Ok(Self {
            inner: Arc::new(OnnxModel {
                session: Mutex::new(session),
                tokenizer,
                dimensions: config.dimensions,
                max_length: config.max_length.max(1),
                batch_size: config.batch_size.max(1),
            }),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("Empty embedding result"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.inner.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || model.embed_all(&texts))
            .await
            .map_err(|e| Error::internal(format!("Task join error: {}", e)))?
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

impl OnnxModel {
    fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            all_embeddings.extend(self.embed_batch(batch)?);
        }
        Ok(all_embeddings)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.iter().map(String::as_str).collect::<Vec<_>>(), true)
            .map_err(|e| Error::embedding(format!("Tokenization failed: {}", e)))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(self.max_length)
            .max(1);

        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();

            for j in 0..ids.len().min(seq_len) {
                input_ids[i * seq_len + j] = ids[j] as i64;
                attention_mask[i * seq_len + j] = mask[j] as i64;
                token_type_ids[i * seq_len + j] = types[j] as i64;
            }
        }

        let shape = vec![batch_size, seq_len];
        let input_ids_tensor = Tensor::from_array((shape.clone(), input_ids.into_boxed_slice()))
            .map_err(|e| Error::embedding(format!("Input tensor creation failed: {}", e)))?;
        let attention_mask_tensor =
            Tensor::from_array((shape.clone(), attention_mask.clone().into_boxed_slice()))
                .map_err(|e| Error::embedding(format!("Attention mask tensor creation failed: {}", e)))?;
        let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))
            .map_err(|e| Error::embedding(format!("Token type tensor creation failed: {}", e)))?;

        let inputs = vec![
            ("input_ids", input_ids_tensor.into_dyn()),
            ("attention_mask", attention_mask_tensor.into_dyn()),
            ("token_type_ids", token_type_ids_tensor.into_dyn()),
        ];

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| Error::embedding(format!("Inference failed: {}", e)))?;

        let output_iter: Vec<_> = outputs.iter().collect();
        let output = output_iter
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| output_iter.first())
            .map(|(_, v)| v)
            .ok_or_else(|| Error::embedding("No output tensor"))?;

        let (tensor_shape, hidden) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::embedding(format!("Failed to extract tensor: {}", e)))?;

        let hidden_size = tensor_shape
            .get(2)
            .map(|&d| d as usize)
            .ok_or_else(|| Error::embedding("Model output is not [batch, tokens, hidden]"))?;
        if hidden_size != self.dimensions {
            return Err(Error::embedding(format!(
                "Model produces {} dimensions, configured for {}",
                hidden_size, self.dimensions
            )));
        }

        Ok(mean_pool(hidden, &attention_mask, batch_size, seq_len, hidden_size))
    }
}

/// Attention-masked mean over tokens, then L2 normalization
fn mean_pool(
    hidden: &[f32],
    attention_mask: &[i64],
    batch_size: usize,
    seq_len: usize,
    hidden_size: usize,
) -> Vec<Vec<f32>> {
    let mut embeddings = Vec::with_capacity(batch_size);

    for i in 0..batch_size {
        let mut sum = vec![0.0f32; hidden_size];
        let mut count = 0.0f32;

        for j in 0..seq_len {
            let mask_val = attention_mask[i * seq_len + j] as f32;
            if mask_val > 0.0 {
                let offset = (i * seq_len + j) * hidden_size;
                if let Some(token) = hidden.get(offset..offset + hidden_size) {
                    for (acc, v) in sum.iter_mut().zip(token) {
                        *acc += v * mask_val;
                    }
                }
                count += mask_val;
            }
        }

        if count > 0.0 {
            sum.iter_mut().for_each(|v| *v /= count);
        }

        let norm: f32 = sum.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            sum.iter_mut().for_each(|v| *v /= norm);
        }

        embeddings.push(sum);
    }

    embeddings
}

fn model_file_url(model_name: &str, file: &str) -> String {
    format!("{}/{}/resolve/main/{}", HF_BASE_URL, model_name, file)
}

/// Download `url` to `path`
async fn download(url: &str, path: &Path) -> Result<()> {
    tracing::info!("Downloading {}", url);

    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::embedding(format!("Failed to download {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::embedding(format!(
            "Download of {} failed: HTTP {}",
            url,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::embedding(format!("Failed to read {}: {}", url, e)))?;

    // Write under a temporary name so an interrupted download is never cached
    let partial = path.with_extension("partial");
    tokio::fs::write(&partial, &bytes).await?;
    tokio::fs::rename(&partial, path).await?;

    tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
