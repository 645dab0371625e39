pub mod actions;
pub mod classifier;
pub mod completions;
pub mod config;
pub mod error;
pub mod onnx_classifier;
pub mod prompts;
pub mod questions;
pub mod report;
pub mod services;
pub mod session;
pub mod traits;
pub mod views;

pub use actions::QuizAction;
pub use classifier::{ScoringError, TraitClassifier};
pub use completions::{
    ChatCompletionClient, CompletionBackend, CompletionConfig, CompletionError, CompletionRequest,
};
pub use config::MosaicConfig;
pub use error::MosaicError;
pub use onnx_classifier::{OnnxClassifierConfig, OnnxTraitClassifier};
pub use prompts::{Platform, Tone};
pub use questions::{Question, QUESTION_BANK};
pub use services::MosaicServices;
pub use session::{Page, Phase, QuizSession, SessionError, SessionStore};
pub use traits::{OceanTrait, TraitScoreMap};
pub use views::{Screen, View};
