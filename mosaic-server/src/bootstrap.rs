//! Process-start bootstrap — API credential and personality model
//!
//! Both are required: any failure here is fatal and the server exits before
//! binding its listener.

use std::sync::Arc;

use mosaic_core::{
    ChatCompletionClient, CompletionConfig, CompletionError, MosaicConfig, MosaicServices,
    OnnxClassifierConfig, OnnxTraitClassifier, ScoringError,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("API credential unavailable: {0}")]
    Credential(#[source] CompletionError),

    #[error("Personality model failed to load: {0}")]
    Model(#[source] ScoringError),
}

/// Build the completion client from `[completion]`, reading the key from the
/// configured environment variable.
pub fn create_completion_client(config: &MosaicConfig) -> Result<ChatCompletionClient, BootstrapError> {
    let completion_config =
        CompletionConfig::from_env(&config.completion).map_err(BootstrapError::Credential)?;
    ChatCompletionClient::new(completion_config).map_err(BootstrapError::Credential)
}

/// Load the ONNX classifier described by `[model]`.
pub fn create_classifier(config: &MosaicConfig) -> Result<OnnxTraitClassifier, BootstrapError> {
    OnnxTraitClassifier::new(OnnxClassifierConfig::from(&config.model)).map_err(BootstrapError::Model)
}

pub fn create_services(config: &MosaicConfig) -> Result<MosaicServices, BootstrapError> {
    let completions = create_completion_client(config)?;
    let classifier = create_classifier(config)?;
    Ok(MosaicServices::new(Arc::new(classifier), Arc::new(completions)))
}
