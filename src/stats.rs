use crate::{
    scoring::{strongest_table, tally_by_table, weakest_table},
    session::GameSession,
    util::mean,
};
use serde::{Deserialize, Serialize};

/// Sessions carried in [`SessionStats::recent_sessions`]
pub const RECENT_SESSIONS: usize = 10;

/// Aggregate statistics over the whole session history. A derived snapshot:
/// the history stays authoritative.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_sessions: usize,
    pub total_questions: usize,
    pub total_correct_answers: usize,
    pub total_incorrect_answers: usize,
    /// Percentage of correct answers across every question, unrounded
    pub average_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weakest_table: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strongest_table: Option<u32>,
    /// Newest first
    pub recent_sessions: Vec<GameSession>,
}

/// Aggregate a newest-first session history
pub fn aggregate(sessions: &[GameSession]) -> SessionStats {
    if sessions.is_empty() {
        return SessionStats::default();
    }

    let total_questions: usize = sessions.iter().map(|s| s.questions.len()).sum();
    let total_correct_answers: usize = sessions.iter().map(|s| s.correct_answers).sum();
    let total_incorrect_answers: usize = sessions.iter().map(|s| s.incorrect_answers).sum();
    let average_score = if total_questions > 0 {
        total_correct_answers as f64 / total_questions as f64 * 100.0
    } else {
        0.0
    };

    let tallies = tally_by_table(sessions.iter().flat_map(|s| s.questions.iter()));

    SessionStats {
        total_sessions: sessions.len(),
        total_questions,
        total_correct_answers,
        total_incorrect_answers,
        average_score,
        weakest_table: weakest_table(&tallies),
        strongest_table: strongest_table(&tallies),
        recent_sessions: sessions.iter().take(RECENT_SESSIONS).cloned().collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Trend {
    Up,
    Stable,
    Down,
}

impl Trend {
    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "📈",
            Trend::Stable => "➡️",
            Trend::Down => "📉",
        }
    }
}

/// Parameters of the recent-versus-previous comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Sessions in each comparison window
    pub window: usize,
    /// Sessions each window needs before a direction is reported
    pub min_sessions: usize,
    /// Difference in success ratio (0..1) that counts as movement
    pub threshold: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window: 5,
            min_sessions: 3,
            threshold: 0.10,
        }
    }
}

/// Compare the newest `window` sessions with the `window` before them
pub fn trend(recent_sessions: &[GameSession], config: &TrendConfig) -> Trend {
    let window = config.window.max(1);
    let recent: Vec<f64> = recent_sessions
        .iter()
        .take(window)
        .map(GameSession::success_ratio)
        .collect();
    let previous: Vec<f64> = recent_sessions
        .iter()
        .skip(window)
        .take(window)
        .map(GameSession::success_ratio)
        .collect();

    if recent.len() < config.min_sessions || previous.len() < config.min_sessions {
        return Trend::Stable;
    }

    match (mean(&recent), mean(&previous)) {
        (Some(r), Some(p)) if r > p + config.threshold => Trend::Up,
        (Some(r), Some(p)) if r < p - config.threshold => Trend::Down,
        _ => Trend::Stable,
    }
}

impl SessionStats {
    pub fn trend(&self, config: &TrendConfig) -> Trend {
        trend(&self.recent_sessions, config)
    }

    pub fn average_questions_per_session(&self) -> f64 {
        if self.total_sessions == 0 {
            0.0
        } else {
            self.total_questions as f64 / self.total_sessions as f64
        }
    }

    pub fn achievements(&self, trend: Trend) -> Vec<Achievement> {
        achievements(self, trend)
    }
}

/// A badge on the statistics screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Achievement {
    pub category: &'static str,
    pub emoji: &'static str,
    pub title: &'static str,
}

fn achievements(stats: &SessionStats, trend: Trend) -> Vec<Achievement> {
    let (emoji, title) = match stats.total_sessions {
        n if n >= 10 => ("🏆", "Regular player"),
        n if n >= 5 => ("🥇", "Good student"),
        _ => ("🌟", "Beginner"),
    };
    let sessions = Achievement {
        category: "Sessions",
        emoji,
        title,
    };

    let (emoji, title) = match stats.average_score {
        s if s >= 90.0 => ("🎯", "Expert"),
        s if s >= 70.0 => ("🎪", "Good level"),
        _ => ("💪", "Improving"),
    };
    let accuracy = Achievement {
        category: "Accuracy",
        emoji,
        title,
    };

    let (emoji, title) = match stats.total_correct_answers {
        n if n >= 100 => ("💯", "Centurion"),
        n if n >= 50 => ("🌟", "Half-century"),
        _ => ("🎈", "Beginner"),
    };
    let answers = Achievement {
        category: "Correct answers",
        emoji,
        title,
    };

    let (emoji, title) = match trend {
        Trend::Up => ("🚀", "Improving"),
        Trend::Stable => ("⚖️", "Steady"),
        Trend::Down => ("📈", "Needs work"),
    };
    let progress = Achievement {
        category: "Progress",
        emoji,
        title,
    };

    vec![sessions, accuracy, answers, progress]
}
