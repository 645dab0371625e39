//! Prompt templates for the motivational quote and social-media posts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::completions::{CompletionBackend, CompletionError, CompletionRequest};
use crate::traits::TraitScoreMap;

pub const QUOTE_PROMPT: &str = "Create an inspirational quote about self-improvement with 2 emojis";
pub const QUOTE_TEMPERATURE: f32 = 0.7;

/// Requested, not enforced: the API may return longer text.
pub const POST_MAX_CHARS: usize = 280;

/// Target platform for a generated post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    LinkedIn,
    Instagram,
    Facebook,
    WhatsApp,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::LinkedIn,
        Platform::Instagram,
        Platform::Facebook,
        Platform::WhatsApp,
        Platform::Twitter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Instagram => "Instagram",
            Platform::Facebook => "Facebook",
            Platform::WhatsApp => "WhatsApp",
            Platform::Twitter => "Twitter",
        }
    }

    pub fn style(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "professional networking style",
            Platform::Instagram => "visual storytelling with emojis",
            Platform::Facebook => "community-oriented friendly tone",
            Platform::WhatsApp => "casual conversational style",
            Platform::Twitter => "concise with trending hashtags",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation style; affects both prompt wording and sampling temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[serde(alias = "😄 Funny")]
    Funny,
    #[serde(alias = "🎯 Serious")]
    Serious,
}

impl Tone {
    pub const ALL: [Tone; 2] = [Tone::Funny, Tone::Serious];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Funny => "funny",
            Tone::Serious => "serious",
        }
    }

    /// Radio-button label shown by the composer view.
    pub fn label(&self) -> &'static str {
        match self {
            Tone::Funny => "😄 Funny",
            Tone::Serious => "🎯 Serious",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Tone::Funny => "Include humor and 3+ emojis. Make it lighthearted but not offensive",
            Tone::Serious => "Professional tone with inspirational message. Use 1-2 relevant emojis",
        }
    }

    pub fn temperature(&self) -> f32 {
        match self {
            Tone::Funny => 0.9,
            Tone::Serious => 0.5,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn quote_request() -> CompletionRequest {
    CompletionRequest::new(QUOTE_PROMPT, QUOTE_TEMPERATURE)
}

pub fn post_request(platform: Platform, tone: Tone, traits: &TraitScoreMap) -> CompletionRequest {
    let prompt = format!(
        "Create a {tone} {platform} post about personal growth using these traits:\n\
         {traits}\n\
         Format: {style}\n\
         Tone: {instruction}\n\
         Max length: {POST_MAX_CHARS} characters",
        style = platform.style(),
        instruction = tone.instruction(),
    );
    CompletionRequest::new(prompt, tone.temperature())
}

/// Ask the backend for one motivational quote.
pub async fn generate_quote(backend: &dyn CompletionBackend) -> Result<String, CompletionError> {
    let quote = backend.complete(&quote_request()).await?;
    tracing::debug!(model = backend.model(), chars = quote.chars().count(), "Generated quote");
    Ok(quote)
}

/// Ask the backend for a post draft for `platform` in `tone`.
pub async fn generate_post(
    backend: &dyn CompletionBackend,
    platform: Platform,
    tone: Tone,
    traits: &TraitScoreMap,
) -> Result<String, CompletionError> {
    let post = backend.complete(&post_request(platform, tone, traits)).await?;
    let chars = post.chars().count();
    if chars > POST_MAX_CHARS {
        tracing::warn!(%platform, %tone, chars, "Generated post exceeds requested length");
    }
    Ok(post)
}
