use crate::{
    question::{Question, MAX_MULTIPLIER},
    settings::Settings,
};
use chrono::Utc;
use rand::{seq::SliceRandom, Rng};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Handles question generation for a round
pub struct QuestionGenerator<'a> {
    settings: &'a Settings,
}

impl<'a> QuestionGenerator<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Generate `number_of_questions` questions, then shuffle them so runs of
    /// the same table are not clustered in generation order.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Question> {
        let tables = self.settings.selected_tables();
        let stamp = Utc::now().timestamp_millis();

        let mut questions: Vec<Question> = (0..self.settings.number_of_questions())
            .map(|i| {
                // Settings guarantees a non-empty selection
                let multiplicand = tables[rng.gen_range(0..tables.len())];
                let multiplier = rng.gen_range(1..=MAX_MULTIPLIER);
                let id = format!("q-{i}-{stamp}-{}", random_suffix(rng));
                Question::new(id, multiplicand, multiplier)
            })
            .collect();

        questions.shuffle(rng);
        questions
    }
}

/// Convenience wrapper over [`QuestionGenerator::generate`]
pub fn generate<R: Rng + ?Sized>(settings: &Settings, rng: &mut R) -> Vec<Question> {
    QuestionGenerator::new(settings).generate(rng)
}

fn random_suffix<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
