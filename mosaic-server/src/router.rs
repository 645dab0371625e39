use mosaic_core::views::{self, Screen};
use mosaic_core::{MosaicError, MosaicServices, QuizAction, SessionStore};
use uuid::Uuid;

/// Apply one action to a session and render the resulting screen.
///
/// The action runs on a copy that is written back only once its screen has
/// rendered, so a failed action leaves the stored session untouched.
pub async fn handle_action(
    action: QuizAction,
    session_id: Uuid,
    store: &SessionStore,
    services: &MosaicServices,
) -> Result<Screen, MosaicError> {
    tracing::info!(session_id = %session_id, action = ?action, "Handling action");

    let mut session = store.get(session_id).await?;
    match action {
        QuizAction::Start => session.start()?,
        QuizAction::Answer { response } => {
            let phase = session.answer(response)?;
            tracing::debug!(session_id = %session_id, phase = ?phase, "Answer recorded");
        }
        QuizAction::Navigate { page } => {
            session.navigate(page)?;
        }
        QuizAction::GeneratePost { platform, tone } => {
            let post = services.social_post(&session, platform, tone).await?;
            session.set_post(post);
        }
    }

    let screen = views::render(&session, services).await?;
    store.commit(session).await?;
    Ok(screen)
}

/// Render the current screen without changing the session.
pub async fn current_screen(
    session_id: Uuid,
    store: &SessionStore,
    services: &MosaicServices,
) -> Result<Screen, MosaicError> {
    let session = store.get(session_id).await?;
    views::render(&session, services).await
}

/// Build a fresh PDF report for a completed session.
pub async fn report(
    session_id: Uuid,
    store: &SessionStore,
    services: &MosaicServices,
) -> Result<Vec<u8>, MosaicError> {
    let session = store.get(session_id).await?;
    services.report_pdf(&session).await
}
