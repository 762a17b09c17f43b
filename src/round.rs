use crate::{
    generator::QuestionGenerator,
    question::{parse_answer, AnswerError, Question},
    session::GameSession,
    settings::Settings,
};
use chrono::Utc;
use rand::Rng;
use std::time::{Duration, Instant};
use thiserror::Error;

pub const CORRECT_PAUSE: Duration = Duration::from_millis(1500);
pub const INCORRECT_PAUSE: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("answer must be a whole number")]
    InvalidAnswer,
    #[error("every question has already been answered")]
    Finished,
    #[error(transparent)]
    Answer(#[from] AnswerError),
}

/// What happened on a submission, for the feedback overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub expected: u32,
    pub streak: usize,
}

/// An in-progress session: the questions being played, the current
/// position, and timing.
#[derive(Debug, Clone)]
pub struct Round {
    settings: Settings,
    questions: Vec<Question>,
    current: usize,
    streak: usize,
    started_at: Instant,
    question_shown_at: Instant,
}

impl Round {
    pub fn new<R: Rng + ?Sized>(settings: Settings, rng: &mut R, now: Instant) -> Self {
        let questions = QuestionGenerator::new(&settings).generate(rng);
        Self::with_questions(settings, questions, now)
    }

    pub fn with_questions(settings: Settings, questions: Vec<Question>, now: Instant) -> Self {
        Self {
            settings,
            questions,
            current: 0,
            streak: 0,
            started_at: now,
            question_shown_at: now,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Question awaiting an answer
    pub fn current_question(&self) -> Option<&Question> {
        self.questions
            .get(self.current)
            .filter(|q| !q.is_answered())
    }

    /// Question at the cursor whether answered or not
    pub fn displayed_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn streak(&self) -> usize {
        self.streak
    }

    /// Fraction of the round reached, counting the displayed question
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            0.0
        } else {
            ((self.current + 1).min(self.questions.len())) as f64 / self.questions.len() as f64
        }
    }

    fn answered(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.is_answered())
    }

    pub fn correct_so_far(&self) -> usize {
        self.answered().filter(|q| q.was_correct()).count()
    }

    pub fn incorrect_so_far(&self) -> usize {
        self.answered().filter(|q| !q.was_correct()).count()
    }

    /// Rounded percentage over answered questions
    pub fn percentage_so_far(&self) -> u8 {
        let answered = self.answered().count();
        if answered == 0 {
            return 0;
        }
        (self.correct_so_far() as f64 * 100.0 / answered as f64).round() as u8
    }

    pub fn streak_message(&self) -> String {
        match self.streak {
            0 => "Stay focused! 🎯".to_string(),
            1 | 2 => "Keep it up! 💪".to_string(),
            n => format!("🔥 {n} correct answers in a row! You're on fire!"),
        }
    }

    /// Submit raw input for the current question. Blank or non-numeric
    /// input is rejected without touching the question.
    pub fn submit(&mut self, input: &str, now: Instant) -> Result<AnswerOutcome, RoundError> {
        let value = parse_answer(input).ok_or(RoundError::InvalidAnswer)?;
        let shown_at = self.question_shown_at;
        let question = self
            .questions
            .get_mut(self.current)
            .ok_or(RoundError::Finished)?;

        let correct = question.respond(value, now.saturating_duration_since(shown_at))?;
        let expected = question.answer;
        self.streak = if correct { self.streak + 1 } else { 0 };

        Ok(AnswerOutcome {
            correct,
            expected,
            streak: self.streak,
        })
    }

    /// Move to the next question once the feedback pause is over. Returns
    /// false when the answered question was the last one.
    pub fn advance(&mut self, now: Instant) -> bool {
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.question_shown_at = now;
            true
        } else {
            false
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.questions.is_empty() && self.questions.iter().all(Question::is_answered)
    }

    /// Close the round into an immutable session
    pub fn finish(self, now: Instant) -> GameSession {
        let completed_at = Utc::now();
        let score = crate::scoring::score(&self.questions);
        let duration = (now.saturating_duration_since(self.started_at).as_millis() as f64
            / 1000.0)
            .round() as u64;

        GameSession {
            id: format!("session-{}", completed_at.timestamp_millis()),
            date: completed_at,
            settings: self.settings,
            questions: self.questions,
            correct_answers: score.correct,
            incorrect_answers: score.incorrect,
            completed_at: Some(completed_at),
            duration: Some(duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::{rngs::StdRng, SeedableRng};

    fn fixed_round(now: Instant) -> Round {
        let settings = Settings::new(3, [2, 3]).unwrap();
        let questions = vec![
            Question::new("q-0".into(), 2, 4),
            Question::new("q-1".into(), 3, 3),
            Question::new("q-2".into(), 2, 5),
        ];
        Round::with_questions(settings, questions, now)
    }

    #[test]
    fn new_round_generates_from_settings() {
        let settings = Settings::new(7, [4]).unwrap();
        let round = Round::new(settings, &mut StdRng::seed_from_u64(1), Instant::now());
        assert_eq!(round.len(), 7);
        assert!(round.questions().iter().all(|q| q.multiplicand == 4));
    }

    #[test]
    fn blank_and_garbage_input_is_rejected() {
        let now = Instant::now();
        let mut round = fixed_round(now);
        assert_matches!(round.submit("", now), Err(RoundError::InvalidAnswer));
        assert_matches!(round.submit("abc", now), Err(RoundError::InvalidAnswer));
        assert!(round.current_question().is_some());
    }

    #[test]
    fn full_round_flow() {
        let start = Instant::now();
        let mut round = fixed_round(start);

        let outcome = round.submit("8", start + Duration::from_secs(3)).unwrap();
        assert_eq!(
            outcome,
            AnswerOutcome {
                correct: true,
                expected: 8,
                streak: 1
            }
        );
        assert_eq!(round.questions()[0].time_to_answer, Some(3));
        assert!(round.current_question().is_none());
        assert_matches!(
            round.submit("8", start),
            Err(RoundError::Answer(AnswerError::AlreadyAnswered(_)))
        );

        assert!(round.advance(start + Duration::from_secs(5)));
        let outcome = round.submit("10", start + Duration::from_secs(6)).unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.expected, 9);
        assert_eq!(outcome.streak, 0);
        assert_eq!(round.questions()[1].time_to_answer, Some(1));

        assert!(round.advance(start + Duration::from_secs(8)));
        round.submit("10", start + Duration::from_secs(10)).unwrap();
        assert!(!round.advance(start + Duration::from_secs(12)));
        assert!(round.is_complete());

        assert_eq!(round.correct_so_far(), 2);
        assert_eq!(round.incorrect_so_far(), 1);
        assert_eq!(round.percentage_so_far(), 67);

        let session = round.finish(start + Duration::from_secs(12));
        assert_eq!(session.correct_answers, 2);
        assert_eq!(session.incorrect_answers, 1);
        assert_eq!(session.duration, Some(12));
        assert!(session.id.starts_with("session-"));
        assert_eq!(session.completed_at, Some(session.date));
    }

    #[test]
    fn progress_counts_displayed_question() {
        let now = Instant::now();
        let mut round = fixed_round(now);
        assert!((round.progress() - 1.0 / 3.0).abs() < 1e-9);
        round.submit("8", now).unwrap();
        round.advance(now);
        assert!((round.progress() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn streak_messages() {
        let now = Instant::now();
        let mut round = fixed_round(now);
        assert_eq!(round.streak_message(), "Stay focused! 🎯");
        round.submit("8", now).unwrap();
        assert_eq!(round.streak_message(), "Keep it up! 💪");
        round.advance(now);
        round.submit("9", now).unwrap();
        round.advance(now);
        round.submit("10", now).unwrap();
        assert_eq!(round.streak(), 3);
        assert!(round.streak_message().contains("3 correct answers in a row"));
    }
}
