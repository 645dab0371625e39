use thiserror::Error;

use crate::classifier::ScoringError;
use crate::completions::CompletionError;
use crate::report::ReportError;
use crate::session::SessionError;

#[derive(Error, Debug)]
pub enum MosaicError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}
