//! ONNX trait classifier — local inference for the personality model
//!
//! Uses the `ort` crate for ONNX Runtime and `tokenizers` for tokenization.
//! Input is truncated and padded to a fixed token length; the model emits one
//! logit per OCEAN trait.

use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokenizers::{PaddingStrategy, TruncationParams};

use crate::classifier::{ScoringError, TraitClassifier};
use crate::config::ModelConfig;

/// ONNX classifier configuration
#[derive(Debug, Clone)]
pub struct OnnxClassifierConfig {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub max_length: usize,
    pub token_type_ids: bool,
}

impl From<&ModelConfig> for OnnxClassifierConfig {
    fn from(config: &ModelConfig) -> Self {
        let (model_path, tokenizer_path) = resolve_model_paths(&config.model_dir, &config.name);
        Self {
            model_path,
            tokenizer_path,
            max_length: config.max_length,
            token_type_ids: config.token_type_ids,
        }
    }
}

/// Sequence classifier backed by an exported ONNX model.
pub struct OnnxTraitClassifier {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<tokenizers::Tokenizer>,
    token_type_ids: bool,
}

impl std::fmt::Debug for OnnxTraitClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxTraitClassifier")
            .field("token_type_ids", &self.token_type_ids)
            .finish_non_exhaustive()
    }
}

impl OnnxTraitClassifier {
    /// Load the model and tokenizer named in `config`.
    ///
    /// Returns `ScoringError::ModelNotFound` if either file is missing.
    pub fn new(config: OnnxClassifierConfig) -> Result<Self, ScoringError> {
        if !config.model_path.exists() {
            return Err(ScoringError::ModelNotFound {
                path: config.model_path.display().to_string(),
            });
        }
        if !config.tokenizer_path.exists() {
            return Err(ScoringError::ModelNotFound {
                path: config.tokenizer_path.display().to_string(),
            });
        }

        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(&config.model_path))
            .map_err(|e| ScoringError::OnnxInference(e.to_string()))?;

        let mut tokenizer = tokenizers::Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| ScoringError::Tokenizer(e.to_string()))?;
        configure_fixed_length(&mut tokenizer, config.max_length)?;

        tracing::info!(
            model = %config.model_path.display(),
            max_length = config.max_length,
            "Personality model loaded"
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            token_type_ids: config.token_type_ids,
        })
    }
}

/// Truncate and pad every encoding to exactly `max_length` tokens, keeping the
/// pad token the tokenizer file declares.
fn configure_fixed_length(
    tokenizer: &mut tokenizers::Tokenizer,
    max_length: usize,
) -> Result<(), ScoringError> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| ScoringError::Tokenizer(e.to_string()))?;

    let mut padding = tokenizer.get_padding().cloned().unwrap_or_default();
    padding.strategy = PaddingStrategy::Fixed(max_length);
    tokenizer.with_padding(Some(padding));
    Ok(())
}

#[async_trait]
impl TraitClassifier for OnnxTraitClassifier {
    async fn logits(&self, text: &str) -> Result<Vec<f32>, ScoringError> {
        // CPU-bound; keep it off the async workers.
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let token_type_ids = self.token_type_ids;
        let text = text.to_string();

        tokio::task::spawn_blocking(move || {
            let mut session_guard = session
                .lock()
                .map_err(|e| ScoringError::OnnxInference(format!("session lock poisoned: {e}")))?;
            classify_sync(&mut session_guard, &tokenizer, &text, token_type_ids)
        })
        .await
        .map_err(|e| ScoringError::OnnxInference(format!("spawn_blocking join error: {e}")))?
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

/// Run one forward pass synchronously and return the logits row.
fn classify_sync(
    session: &mut Session,
    tokenizer: &tokenizers::Tokenizer,
    text: &str,
    with_token_type_ids: bool,
) -> Result<Vec<f32>, ScoringError> {
    let encoding = tokenizer
        .encode(text, true)
        .map_err(|e| ScoringError::Tokenizer(e.to_string()))?;

    let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
    let attention_mask: Vec<i64> = encoding
        .get_attention_mask()
        .iter()
        .map(|&m| m as i64)
        .collect();

    let shape = vec![1i64, input_ids.len() as i64];

    let input_ids_tensor = Tensor::from_array((shape.clone(), input_ids))
        .map_err(|e| ScoringError::OnnxInference(e.to_string()))?;
    let attention_mask_tensor = Tensor::from_array((shape.clone(), attention_mask))
        .map_err(|e| ScoringError::OnnxInference(e.to_string()))?;

    let outputs = if with_token_type_ids {
        let token_type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();
        let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids))
            .map_err(|e| ScoringError::OnnxInference(e.to_string()))?;
        session.run(ort::inputs! {
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor,
            "token_type_ids" => token_type_ids_tensor,
        })
    } else {
        session.run(ort::inputs! {
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor,
        })
    }
    .map_err(|e| ScoringError::OnnxInference(e.to_string()))?;

    let (out_shape, data) = outputs[0]
        .try_extract_tensor::<f32>()
        .map_err(|e| ScoringError::OnnxInference(e.to_string()))?;

    // Expected shape: [1, num_labels]
    if out_shape.len() != 2 || out_shape[0] != 1 {
        return Err(ScoringError::OnnxInference(format!(
            "Expected [1, num_labels] logits, got {:?}",
            &out_shape[..]
        )));
    }

    Ok(data.to_vec())
}

/// Resolve the default model directory.
pub fn default_model_dir() -> PathBuf {
    let data_home = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".local/share")
        });
    data_home.join("mind-mosaic/models")
}

/// Resolve model and tokenizer paths for a model name.
///
/// If `model_dir` is empty, uses the default location.
pub fn resolve_model_paths(model_dir: &str, name: &str) -> (PathBuf, PathBuf) {
    let dir = if model_dir.is_empty() {
        default_model_dir()
    } else {
        PathBuf::from(model_dir)
    };
    (
        dir.join(format!("{name}.onnx")),
        dir.join(format!("{name}-tokenizer.json")),
    )
}
