//! Question bank and per-session question selection.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::traits::OceanTrait;

/// Number of questions asked per session.
pub const QUESTIONS_PER_SESSION: usize = 5;

/// A quiz prompt tagged with the trait it is meant to measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Question {
    pub text: &'static str,
    #[serde(rename = "trait")]
    pub trait_label: OceanTrait,
}

const fn q(text: &'static str, trait_label: OceanTrait) -> Question {
    Question { text, trait_label }
}

pub const QUESTION_BANK: [Question; 10] = [
    q("If your personality was a pizza topping, what would you be? 🍕", OceanTrait::Openness),
    q("Describe your ideal morning vs reality ☀️", OceanTrait::Conscientiousness),
    q("How would you survive a zombie apocalypse? 🧟", OceanTrait::Neuroticism),
    q("What's your spirit animal in meetings? 🦄", OceanTrait::Agreeableness),
    q("Plan a perfect day for your arch-rival 😈", OceanTrait::Extraversion),
    q("If stress was weather, what's your forecast? ⛈️", OceanTrait::Neuroticism),
    q("What would your Netflix history say about you? 🎬", OceanTrait::Openness),
    q("Describe your phone as a Shakespearean sonnet 📱", OceanTrait::Conscientiousness),
    q("React to 'We need to talk' 💬", OceanTrait::Agreeableness),
    q("Your superhero name in awkward situations? 🦸", OceanTrait::Extraversion),
];

/// Draw five distinct questions from the bank, uniformly at random.
pub fn select_questions() -> Vec<Question> {
    select_questions_with(&mut rand::thread_rng())
}

pub fn select_questions_with<R: Rng + ?Sized>(rng: &mut R) -> Vec<Question> {
    QUESTION_BANK
        .choose_multiple(rng, QUESTIONS_PER_SESSION)
        .copied()
        .collect()
}
