use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

/// Encouragement category keyed by score percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tier {
    Excellent,
    Good,
    CanDoBetter,
    KeepTrying,
}

const EXCELLENT: &[(&str, &str)] = &[
    ("Fantastic! You're a maths champion!", "🏆"),
    ("Outstanding! You know your tables perfectly!", "⭐"),
    ("Bravo! What a talent for multiplication!", "🎉"),
    ("Superb! You're really gifted!", "🌟"),
];

const GOOD: &[(&str, &str)] = &[
    ("Very well played! Keep it up!", "👍"),
    ("Good work! You're making great progress!", "😊"),
    ("That's a solid job! Well done!", "🎯"),
    ("Great! You're on the right track!", "🚀"),
];

const CAN_DO_BETTER: &[(&str, &str)] = &[
    ("Not bad! With a little more practice you'll get there!", "💪"),
    ("That's already good! Keep practicing!", "📚"),
    ("You're getting there! One more push and it'll be perfect!", "🎯"),
    ("Hang in there! You improve every time!", "⬆️"),
];

const KEEP_TRYING: &[(&str, &str)] = &[
    ("No worries! Rome wasn't built in a day!", "🏗️"),
    ("Keep going! Every mistake makes you stronger!", "💪"),
    ("Don't give up! You'll get there!", "🌱"),
    ("Patience! Champions practice a lot!", "🥇"),
];

impl Tier {
    /// Tier for a 0-100 score; bounds are inclusive
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            p if p >= 90 => Tier::Excellent,
            p if p >= 70 => Tier::Good,
            p if p >= 50 => Tier::CanDoBetter,
            _ => Tier::KeepTrying,
        }
    }

    /// Candidate (message, emoji) pairs for this tier
    pub fn pool(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Tier::Excellent => EXCELLENT,
            Tier::Good => GOOD,
            Tier::CanDoBetter => CAN_DO_BETTER,
            Tier::KeepTrying => KEEP_TRYING,
        }
    }

    /// Badge shown under the score on the results screen
    pub fn badge(&self) -> &'static str {
        match self {
            Tier::Excellent => "🏆 Champion",
            Tier::Good => "⭐ Very good",
            Tier::CanDoBetter => "💪 Not bad",
            Tier::KeepTrying => "🌱 Keep going",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encouragement {
    pub tier: Tier,
    pub message: String,
    pub emoji: &'static str,
}

pub fn weak_table_hint(table: u32) -> String {
    format!(" Spend a little more time on the {table} times table!")
}

/// Pick an encouragement for `percentage`. A known weak table is pointed
/// out for every tier except [`Tier::Excellent`].
pub fn select_message<R: Rng + ?Sized>(
    percentage: u8,
    weakest_table: Option<u32>,
    rng: &mut R,
) -> Encouragement {
    let tier = Tier::from_percentage(percentage);
    let &(message, emoji) = tier.pool().choose(rng).unwrap_or(&tier.pool()[0]);

    let mut message = message.to_string();
    match weakest_table {
        Some(table) if tier != Tier::Excellent => message.push_str(&weak_table_hint(table)),
        _ => {}
    }

    Encouragement {
        tier,
        message,
        emoji,
    }
}
