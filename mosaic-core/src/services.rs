//! Process-wide services shared by every session: the classifier and the
//! completion backend, both read-only after bootstrap.

use std::sync::Arc;

use crate::classifier::{self, TraitClassifier};
use crate::completions::CompletionBackend;
use crate::error::MosaicError;
use crate::prompts::{self, Platform, Tone};
use crate::report;
use crate::session::QuizSession;
use crate::traits::TraitScoreMap;

#[derive(Clone)]
pub struct MosaicServices {
    pub classifier: Arc<dyn TraitClassifier>,
    pub completions: Arc<dyn CompletionBackend>,
}

impl std::fmt::Debug for MosaicServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MosaicServices")
            .field("classifier", &self.classifier.name())
            .field("completion_model", &self.completions.model())
            .finish()
    }
}

impl MosaicServices {
    pub fn new(
        classifier: Arc<dyn TraitClassifier>,
        completions: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            classifier,
            completions,
        }
    }

    /// Score a completed session. Recomputed on every call.
    pub async fn score_session(&self, session: &QuizSession) -> Result<TraitScoreMap, MosaicError> {
        let text = session.scoring_text()?;
        Ok(classifier::score(self.classifier.as_ref(), &text).await?)
    }

    pub async fn quote(&self) -> Result<String, MosaicError> {
        Ok(prompts::generate_quote(self.completions.as_ref()).await?)
    }

    pub async fn social_post(
        &self,
        session: &QuizSession,
        platform: Platform,
        tone: Tone,
    ) -> Result<String, MosaicError> {
        let traits = self.score_session(session).await?;
        Ok(prompts::generate_post(self.completions.as_ref(), platform, tone, &traits).await?)
    }

    /// Fresh scores and a fresh quote rendered to PDF. The quote is generated
    /// independently of the welcome-screen quote.
    pub async fn report_pdf(&self, session: &QuizSession) -> Result<Vec<u8>, MosaicError> {
        let traits = self.score_session(session).await?;
        let quote = self.quote().await?;
        let pdf = report::render_report(&traits, &quote)?;
        tracing::info!(session_id = %session.id, bytes = pdf.len(), "Report rendered");
        Ok(pdf)
    }
}
