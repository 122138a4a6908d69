//! One full round for an expression: history lookup, persona call, persistence, presentation.

use crate::api::{AiResponseView, CalculateResponse};
use crate::gemini_bridge::CommentaryProvider;
use crate::models::{InsertAiResponse, InsertCalculation};
use crate::persona::{environment_for_mood, gif_for_emotion, HistoryEntry};
use crate::storage::Storage;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JudgeError {
    #[error("Expression is required")]
    MissingExpression,
}

/// Runs one expression past the persona and stores the outcome.
///
/// The stored calculation's `result` is the persona's answer, not the true value.
/// `history_window` past calculations are handed to the provider newest first, as the
/// store returns them. Only an empty expression is rejected; it is stored as sent.
pub async fn judge_expression(
    storage: &dyn Storage,
    provider: &dyn CommentaryProvider,
    expression: Option<&str>,
    history_window: usize,
) -> Result<CalculateResponse, JudgeError> {
    let expression = expression
        .filter(|e| !e.is_empty())
        .ok_or(JudgeError::MissingExpression)?;

    let history: Vec<HistoryEntry> = storage
        .get_recent_calculations(history_window)
        .await
        .into_iter()
        .map(|c| HistoryEntry {
            expression: c.expression,
            result: c.result,
        })
        .collect();

    let reply = provider.generate(expression, &history).await;

    let calculation = storage
        .create_calculation(InsertCalculation {
            expression: expression.to_string(),
            result: reply.ai_result.clone(),
        })
        .await;

    let stored = storage
        .create_ai_response(InsertAiResponse {
            calculation_id: Some(calculation.id.clone()),
            response: reply.response.clone(),
            emotion: reply.emotion.to_string(),
            ai_result: reply.ai_result.clone(),
        })
        .await;

    tracing::info!(
        "[SNARKULATOR] \"{}\" judged {} (answer: {}).",
        calculation.expression,
        stored.emotion,
        stored.ai_result
    );

    Ok(CalculateResponse {
        calculation,
        ai_response: AiResponseView {
            gif: gif_for_emotion(&stored.emotion).to_string(),
            environment: environment_for_mood(&reply.mood),
            stored,
            mood: reply.mood,
            activity: reply.activity,
        },
    })
}
