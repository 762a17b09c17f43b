use crate::{
    question::Question,
    scoring::{self, Score, TableTally},
    settings::Settings,
};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A completed round. Built once when the last question is answered and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: String,
    pub date: DateTime<Utc>,
    pub settings: Settings,
    pub questions: Vec<Question>,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Whole seconds from first display to last answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl GameSession {
    pub fn score(&self) -> Score {
        scoring::score(&self.questions)
    }

    /// Share of correct answers in `0.0..=1.0`; 0 for an empty session
    pub fn success_ratio(&self) -> f64 {
        if self.questions.is_empty() {
            0.0
        } else {
            self.correct_answers as f64 / self.questions.len() as f64
        }
    }

    /// Per-table results sorted by table, for the results breakdown
    pub fn table_breakdown(&self) -> Vec<TableTally> {
        scoring::tally_by_table(&self.questions)
            .into_iter()
            .sorted_by_key(|t| t.table)
            .collect()
    }

    /// Mean seconds per question; unanswered questions count as 0
    pub fn average_answer_time(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        let total: u64 = self
            .questions
            .iter()
            .map(|q| q.time_to_answer.unwrap_or(0))
            .sum();
        total as f64 / self.questions.len() as f64
    }

    pub fn missed_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| !q.was_correct())
    }
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("session payload is empty")]
    Empty,
    #[error("malformed session payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encode a session for hand-off to the results screen
pub fn encode_session(session: &GameSession) -> Result<String, PayloadError> {
    Ok(serde_json::to_string(session)?)
}

/// Decode a payload produced by [`encode_session`]
pub fn decode_session(payload: &str) -> Result<GameSession, PayloadError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(PayloadError::Empty);
    }
    Ok(serde_json::from_str(payload)?)
}
