use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Highest multiplier asked; multipliers are drawn from `1..=MAX_MULTIPLIER`
pub const MAX_MULTIPLIER: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerError {
    #[error("question {0} has already been answered")]
    AlreadyAnswered(String),
}

/// One multiplication question and, once answered, the user's response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub multiplicand: u32,
    pub multiplier: u32,
    pub answer: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    /// Whole seconds between display and submission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_answer: Option<u64>,
}

impl Question {
    pub fn new(id: String, multiplicand: u32, multiplier: u32) -> Self {
        Self {
            id,
            multiplicand,
            multiplier,
            answer: multiplicand * multiplier,
            user_answer: None,
            is_correct: None,
            time_to_answer: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.user_answer.is_some()
    }

    pub fn was_correct(&self) -> bool {
        self.is_correct == Some(true)
    }

    /// Record the user's response. A question takes exactly one response.
    pub fn respond(&mut self, user_answer: i64, elapsed: Duration) -> Result<bool, AnswerError> {
        if self.is_answered() {
            return Err(AnswerError::AlreadyAnswered(self.id.clone()));
        }
        let correct = user_answer == i64::from(self.answer);
        self.user_answer = Some(user_answer);
        self.is_correct = Some(correct);
        self.time_to_answer = Some(round_secs(elapsed));
        Ok(correct)
    }

    /// Prompt text as shown on the play screen
    pub fn prompt(&self) -> String {
        format!("{} × {} = ?", self.multiplicand, self.multiplier)
    }
}

fn round_secs(elapsed: Duration) -> u64 {
    (elapsed.as_millis() as f64 / 1000.0).round() as u64
}

/// Parse raw answer input. Empty or non-numeric input yields `None` and
/// the submission is simply not accepted.
pub fn parse_answer(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

/// Whether `c` may be typed into the answer field given what is already there
pub fn accepts_answer_char(current: &str, c: char) -> bool {
    c.is_ascii_digit() || (c == '-' && current.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn new_precomputes_answer() {
        let q = Question::new("q-0".into(), 7, 8);
        assert_eq!(q.answer, 56);
        assert!(!q.is_answered());
        assert_eq!(q.is_correct, None);
        assert_eq!(q.time_to_answer, None);
    }

    #[test]
    fn respond_records_once() {
        let mut q = Question::new("q-0".into(), 3, 4);
        assert_eq!(q.respond(12, Duration::from_millis(2400)), Ok(true));
        assert_eq!(q.user_answer, Some(12));
        assert_eq!(q.time_to_answer, Some(2));

        assert_matches!(
            q.respond(13, Duration::from_secs(1)),
            Err(AnswerError::AlreadyAnswered(id)) if id == "q-0"
        );
        assert_eq!(q.user_answer, Some(12));
        assert!(q.was_correct());
    }

    #[test]
    fn respond_wrong_answer() {
        let mut q = Question::new("q-1".into(), 6, 7);
        assert_eq!(q.respond(41, Duration::from_millis(1500)), Ok(false));
        assert_eq!(q.is_correct, Some(false));
        assert_eq!(q.time_to_answer, Some(2));
    }

    #[test]
    fn parse_answer_rejects_blank_and_garbage() {
        assert_eq!(parse_answer(""), None);
        assert_eq!(parse_answer("   "), None);
        assert_eq!(parse_answer("4a"), None);
        assert_eq!(parse_answer(" 42 "), Some(42));
        assert_eq!(parse_answer("-3"), Some(-3));
    }

    #[test]
    fn answer_field_accepts_digits_and_leading_minus() {
        assert!(accepts_answer_char("", '4'));
        assert!(accepts_answer_char("", '-'));
        assert!(!accepts_answer_char("1", '-'));
        assert!(!accepts_answer_char("1", 'x'));
    }

    #[test]
    fn unanswered_fields_are_omitted_from_json() {
        let q = Question::new("q-2".into(), 2, 5);
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(
            json,
            r#"{"id":"q-2","multiplicand":2,"multiplier":5,"answer":10}"#
        );
    }
}
