//! Personality scoring — classifier abstraction and the scoring entry point
//!
//! A `TraitClassifier` produces five raw logits for a text; `score` turns them
//! into a `TraitScoreMap` via soft-max.

use async_trait::async_trait;
use thiserror::Error;

use crate::traits::TraitScoreMap;

/// Abstraction over sequence-classification models.
#[async_trait]
pub trait TraitClassifier: Send + Sync {
    /// Raw output logits for `text`, one per trait in `OceanTrait::ALL` order.
    async fn logits(&self, text: &str) -> Result<Vec<f32>, ScoringError>;

    /// Classifier name for logging.
    fn name(&self) -> &str;
}

/// Scoring errors
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Model file not found at {path}")]
    ModelNotFound { path: String },

    #[error("ONNX inference error: {0}")]
    OnnxInference(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Expected {expected} logits, got {actual}")]
    LogitCount { expected: usize, actual: usize },

    #[error("Classifier produced non-finite logits")]
    NonFiniteLogits,
}

/// Score the newline-joined responses of a session.
pub async fn score(
    classifier: &dyn TraitClassifier,
    text: &str,
) -> Result<TraitScoreMap, ScoringError> {
    let logits = classifier.logits(text).await?;
    let map = TraitScoreMap::from_logits(&logits)?;
    tracing::debug!(
        classifier = classifier.name(),
        chars = text.len(),
        dominant = ?map.dominant(),
        "Scored responses"
    );
    Ok(map)
}
