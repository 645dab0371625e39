//! View model — what the client should draw for a session's current phase.
//!
//! `render` dispatches exhaustively over `Phase` and `Page`. Result pages always
//! rescore the accumulated responses; nothing is cached between renders.

use serde::Serialize;
use uuid::Uuid;

use crate::error::MosaicError;
use crate::prompts::{Platform, Tone};
use crate::questions::QUESTIONS_PER_SESSION;
use crate::report::{REPORT_FILE_NAME, REPORT_MIME};
use crate::services::MosaicServices;
use crate::session::{Page, Phase, QuizSession, SessionError};
use crate::traits::{OceanTrait, TraitScoreMap};

pub const APP_TITLE: &str = "🧠 Mind Mosaic chatbot";

pub const SUCCESS_TIPS: [&str; 10] = [
    "🌅 Morning reflection: Start each day with 5 minutes of self-reflection",
    "🤝 Weekly connection: Have one meaningful conversation with someone new",
    "🎯 SMART goals: Set weekly Specific-Measurable-Achievable-Relevant-Timebound goals",
    "🧠 Neuroplasticity practice: Learn one new skill each month",
    "📚 Cross-training: Read outside your field 30 minutes daily",
    "💬 Active listening: Practice repeating back what others say before responding",
    "🔄 Feedback loop: Request constructive feedback weekly",
    "⚖️ Balance audit: Weekly review of work-life harmony",
    "😊 Emotional agility: Label emotions precisely throughout the day",
    "🚀 Growth challenges: Monthly comfort-zone expansion activity",
];

#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub page: Page,
    pub help: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBar {
    #[serde(rename = "trait")]
    pub label: OceanTrait,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    Welcome {
        title: &'static str,
        quote: String,
        start_label: &'static str,
    },
    Question {
        index: usize,
        total: usize,
        progress: f32,
        prompt: &'static str,
        input_label: &'static str,
        next_label: &'static str,
    },
    Home {
        hint: &'static str,
    },
    PersonalityReport {
        header: &'static str,
        metrics: Vec<Metric>,
        chart_header: &'static str,
        chart: Vec<ChartBar>,
    },
    SocialMediaPost {
        header: &'static str,
        platforms: Vec<Platform>,
        tones: Vec<&'static str>,
        post: Option<String>,
    },
    SuccessTips {
        header: &'static str,
        tips: Vec<&'static str>,
    },
    DownloadReport {
        header: &'static str,
        button_label: &'static str,
        file_name: &'static str,
        mime: &'static str,
        href: String,
    },
}

/// A full screen: sidebar plus the main view.
#[derive(Debug, Clone, Serialize)]
pub struct Screen {
    pub app_title: &'static str,
    pub session_id: Uuid,
    pub page: Page,
    pub sidebar: Vec<NavItem>,
    #[serde(flatten)]
    pub view: View,
}

pub async fn render(session: &QuizSession, services: &MosaicServices) -> Result<Screen, MosaicError> {
    let view = match session.phase() {
        Phase::NotStarted => View::Welcome {
            title: "🌟 Welcome to Mind Mosaic chatbot 🌟",
            quote: services.quote().await?,
            start_label: "🚀 Start Personality Analysis!",
        },
        Phase::Asking(index) => question_view(session, index)?,
        Phase::Displaying(page) => {
            let traits = services.score_session(session).await?;
            page_view(session, page, &traits)
        }
    };

    Ok(Screen {
        app_title: APP_TITLE,
        session_id: session.id,
        page: session.page(),
        sidebar: sidebar(session),
        view,
    })
}

fn sidebar(session: &QuizSession) -> Vec<NavItem> {
    if !session.is_started() {
        return Vec::new();
    }
    Page::NAVIGATION
        .iter()
        .map(|&page| NavItem {
            page,
            help: page.help(),
            selected: page == session.page(),
        })
        .collect()
}

fn question_view(session: &QuizSession, index: usize) -> Result<View, SessionError> {
    let question = session
        .current_question()
        .ok_or(SessionError::InvalidSelection {
            expected: QUESTIONS_PER_SESSION,
            actual: session.selected_questions().len(),
        })?;
    Ok(View::Question {
        index,
        total: QUESTIONS_PER_SESSION,
        progress: index as f32 / QUESTIONS_PER_SESSION as f32,
        prompt: question.text,
        input_label: "Your response:",
        next_label: "Next ➡️",
    })
}

fn page_view(session: &QuizSession, page: Page, traits: &TraitScoreMap) -> View {
    match page {
        Page::Home => View::Home {
            hint: "Pick a view from the 🧭 Navigation sidebar",
        },
        Page::PersonalityReport => View::PersonalityReport {
            header: "📊 Personality Breakdown",
            metrics: metrics(traits),
            chart_header: "🎭 Emotional Landscape",
            chart: traits
                .iter()
                .map(|s| ChartBar {
                    label: s.label,
                    score: s.score,
                })
                .collect(),
        },
        Page::SocialMediaPost => View::SocialMediaPost {
            header: "🎨 Create Social Post",
            platforms: Platform::ALL.to_vec(),
            tones: Tone::ALL.iter().map(|t| t.label()).collect(),
            post: session.post().map(str::to_string),
        },
        Page::SuccessTips => View::SuccessTips {
            header: "💎 Personality Success Tips",
            tips: SUCCESS_TIPS.to_vec(),
        },
        Page::DownloadReport => View::DownloadReport {
            header: "📄 Complete Report",
            button_label: "⬇️ Download PDF Report",
            file_name: REPORT_FILE_NAME,
            mime: REPORT_MIME,
            href: format!("/sessions/{}/report", session.id),
        },
    }
}

/// One metric per trait: upper-case label, score to two decimals.
pub fn metrics(traits: &TraitScoreMap) -> Vec<Metric> {
    traits
        .iter()
        .map(|s| Metric {
            label: s.label.display_label(),
            value: format!("{:.2}", s.score),
        })
        .collect()
}
