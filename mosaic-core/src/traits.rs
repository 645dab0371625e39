//! Big Five (OCEAN) trait labels and the soft-max score map.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classifier::ScoringError;

/// The five personality dimensions, in the classifier's output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OceanTrait {
    Agreeableness,
    Openness,
    Conscientiousness,
    Extraversion,
    Neuroticism,
}

impl OceanTrait {
    /// Positional mapping of the model's five output logits.
    pub const ALL: [OceanTrait; 5] = [
        OceanTrait::Agreeableness,
        OceanTrait::Openness,
        OceanTrait::Conscientiousness,
        OceanTrait::Extraversion,
        OceanTrait::Neuroticism,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OceanTrait::Agreeableness => "agreeableness",
            OceanTrait::Openness => "openness",
            OceanTrait::Conscientiousness => "conscientiousness",
            OceanTrait::Extraversion => "extraversion",
            OceanTrait::Neuroticism => "neuroticism",
        }
    }

    /// Upper-case label used on metrics and in the PDF report.
    pub fn display_label(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for OceanTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraitScore {
    #[serde(rename = "trait")]
    pub label: OceanTrait,
    pub score: f64,
}

/// Soft-max scores for all five traits. The scores sum to 1.0, so they are
/// relative weights rather than independent probabilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TraitScoreMap {
    scores: Vec<TraitScore>,
}

impl TraitScoreMap {
    /// Apply soft-max to raw classifier logits.
    pub fn from_logits(logits: &[f32]) -> Result<Self, ScoringError> {
        if logits.len() != OceanTrait::ALL.len() {
            return Err(ScoringError::LogitCount {
                expected: OceanTrait::ALL.len(),
                actual: logits.len(),
            });
        }
        if logits.iter().any(|l| !l.is_finite()) {
            return Err(ScoringError::NonFiniteLogits);
        }

        let probs = softmax(logits);
        let scores = OceanTrait::ALL
            .iter()
            .zip(probs.iter())
            .map(|(&label, &score)| TraitScore { label, score })
            .collect();
        Ok(Self { scores })
    }

    pub fn iter(&self) -> impl Iterator<Item = &TraitScore> {
        self.scores.iter()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn get(&self, label: OceanTrait) -> Option<f64> {
        self.scores.iter().find(|s| s.label == label).map(|s| s.score)
    }

    pub fn total(&self) -> f64 {
        self.scores.iter().map(|s| s.score).sum()
    }

    /// Trait with the highest score.
    pub fn dominant(&self) -> Option<OceanTrait> {
        self.scores
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .map(|s| s.label)
    }
}

/// Renders as `{'agreeableness': 0.2013, 'openness': ...}` for prompt embedding.
impl fmt::Display for TraitScoreMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, s) in self.scores.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}': {:.4}", s.label, s.score)?;
        }
        f.write_str("}")
    }
}

/// Numerically stable soft-max.
pub fn softmax(logits: &[f32]) -> Array1<f64> {
    let v: Array1<f64> = logits.iter().map(|&x| f64::from(x)).collect();
    let max = v.fold(f64::NEG_INFINITY, |acc, &x| acc.max(x));
    let exp = v.mapv(|x| (x - max).exp());
    let sum = exp.sum();
    exp / sum
}
