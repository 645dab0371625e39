use serde::{Deserialize, Serialize};

use crate::prompts::{Platform, Tone};
use crate::session::Page;

/// Discrete user events that drive a session's state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum QuizAction {
    Start,
    Answer {
        #[serde(default)]
        response: String,
    },
    Navigate {
        page: Page,
    },
    GeneratePost {
        platform: Platform,
        tone: Tone,
    },
}
