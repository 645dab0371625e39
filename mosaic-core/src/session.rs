//! Quiz session state machine and the in-memory session store.
//!
//! `NotStarted → Asking(0..5) → Displaying(page)`. A session's response list
//! is the single source of truth for the current question index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::questions::{select_questions, Question, QUESTIONS_PER_SESSION};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session {0} not found")]
    NotFound(Uuid),

    #[error("Quiz has not started")]
    NotStarted,

    #[error("Quiz already started")]
    AlreadyStarted,

    #[error("All questions have been answered")]
    QuestionsComplete,

    #[error("Results are available once all questions are answered")]
    ResultsNotReady,

    #[error("Session changed by a concurrent request")]
    StaleUpdate,

    #[error("A quiz needs {expected} questions, got {actual}")]
    InvalidSelection { expected: usize, actual: usize },
}

/// Sidebar pages. `Home` is the selection before any page is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Page {
    #[default]
    #[serde(rename = "🏠 Home", alias = "home")]
    Home,
    #[serde(rename = "📋 Personality Report", alias = "personality_report")]
    PersonalityReport,
    #[serde(rename = "📱 Social Media Post", alias = "social_media_post")]
    SocialMediaPost,
    #[serde(rename = "💡 Success Tips", alias = "success_tips")]
    SuccessTips,
    #[serde(rename = "📥 Download Report", alias = "download_report")]
    DownloadReport,
}

impl Page {
    /// The four navigable pages, in sidebar order.
    pub const NAVIGATION: [Page; 4] = [
        Page::PersonalityReport,
        Page::SocialMediaPost,
        Page::SuccessTips,
        Page::DownloadReport,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Page::Home => "🏠 Home",
            Page::PersonalityReport => "📋 Personality Report",
            Page::SocialMediaPost => "📱 Social Media Post",
            Page::SuccessTips => "💡 Success Tips",
            Page::DownloadReport => "📥 Download Report",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            Page::Home => "Choose a view from the sidebar",
            Page::PersonalityReport => "View detailed personality analysis",
            Page::SocialMediaPost => "Generate platform-specific posts",
            Page::SuccessTips => "Get personalized improvement tips",
            Page::DownloadReport => "Download complete PDF report",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Asking(usize),
    Displaying(Page),
}

/// One user's quiz session.
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    started: bool,
    responses: Vec<String>,
    selected_questions: Vec<Question>,
    page: Page,
    post: Option<String>,
    revision: u64,
}

impl QuizSession {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            last_active_at: now,
            started: false,
            responses: Vec::new(),
            selected_questions: Vec::new(),
            page: Page::default(),
            post: None,
            revision: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        if !self.started {
            Phase::NotStarted
        } else if self.responses.len() < QUESTIONS_PER_SESSION {
            Phase::Asking(self.responses.len())
        } else {
            Phase::Displaying(self.page)
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn current_question_index(&self) -> usize {
        self.responses.len()
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.phase() {
            Phase::Asking(i) => self.selected_questions.get(i),
            _ => None,
        }
    }

    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    pub fn selected_questions(&self) -> &[Question] {
        &self.selected_questions
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn post(&self) -> Option<&str> {
        self.post.as_deref()
    }

    /// Text handed to the scorer: all responses joined by newlines.
    pub fn scoring_text(&self) -> Result<String, SessionError> {
        match self.phase() {
            Phase::Displaying(_) => Ok(self.responses.join("\n")),
            Phase::NotStarted => Err(SessionError::NotStarted),
            Phase::Asking(_) => Err(SessionError::ResultsNotReady),
        }
    }

    /// Start the quiz with a fresh random question selection.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.start_with(select_questions())
    }

    pub fn start_with(&mut self, questions: Vec<Question>) -> Result<(), SessionError> {
        if self.started {
            return Err(SessionError::AlreadyStarted);
        }
        if questions.len() != QUESTIONS_PER_SESSION {
            return Err(SessionError::InvalidSelection {
                expected: QUESTIONS_PER_SESSION,
                actual: questions.len(),
            });
        }
        self.selected_questions = questions;
        self.started = true;
        self.touch();
        Ok(())
    }

    /// Record the answer to the current question and advance.
    pub fn answer(&mut self, response: impl Into<String>) -> Result<Phase, SessionError> {
        match self.phase() {
            Phase::NotStarted => Err(SessionError::NotStarted),
            Phase::Displaying(_) => Err(SessionError::QuestionsComplete),
            Phase::Asking(_) => {
                self.responses.push(response.into());
                self.touch();
                Ok(self.phase())
            }
        }
    }

    /// Select a sidebar page. Allowed any time after the quiz has started; the
    /// page is shown once all questions are answered.
    pub fn navigate(&mut self, page: Page) -> Result<Phase, SessionError> {
        if !self.started {
            return Err(SessionError::NotStarted);
        }
        self.page = page;
        self.touch();
        Ok(self.phase())
    }

    pub fn set_post(&mut self, post: String) {
        self.post = Some(post);
        self.touch();
    }

    fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory store of live sessions, keyed by id. Nothing is persisted.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, QuizSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> QuizSession {
        let session = QuizSession::new();
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        tracing::info!(session_id = %session.id, "Session created");
        session
    }

    /// Snapshot of a session.
    pub async fn get(&self, id: Uuid) -> Result<QuizSession, SessionError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    /// Replace a live session with an updated copy taken by `get`. Fails if
    /// the session ended or another commit landed since the copy was taken.
    pub async fn commit(&self, mut session: QuizSession) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(&session.id)
            .ok_or(SessionError::NotFound(session.id))?;
        if slot.revision != session.revision {
            return Err(SessionError::StaleUpdate);
        }
        session.revision += 1;
        *slot = session;
        Ok(())
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| tracing::info!(session_id = %id, "Session ended"))
            .ok_or(SessionError::NotFound(id))
    }

    /// Drop sessions with no activity for longer than `max_idle`.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let idle = now
                .signed_duration_since(session.last_active_at)
                .to_std()
                .unwrap_or_default();
            let keep = idle <= max_idle;
            if !keep {
                tracing::info!(session_id = %id, idle_secs = idle.as_secs(), "Session expired");
            }
            keep
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
