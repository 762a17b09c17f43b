use crate::question::Question;
use serde::{Deserialize, Serialize};

/// Correct/total counts for one table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableTally {
    pub table: u32,
    pub correct: usize,
    pub total: usize,
}

impl TableTally {
    pub fn rate(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct as f64 / self.total as f64)
        }
    }

    pub fn percentage(&self) -> u8 {
        self.rate()
            .map(|r| (r * 100.0).round() as u8)
            .unwrap_or_default()
    }
}

/// Group questions by multiplicand, keeping the order in which tables first appear
pub fn tally_by_table<'a, I>(questions: I) -> Vec<TableTally>
where
    I: IntoIterator<Item = &'a Question>,
{
    let mut tallies: Vec<TableTally> = Vec::new();
    for q in questions {
        let idx = match tallies.iter().position(|t| t.table == q.multiplicand) {
            Some(idx) => idx,
            None => {
                tallies.push(TableTally {
                    table: q.multiplicand,
                    correct: 0,
                    total: 0,
                });
                tallies.len() - 1
            }
        };
        tallies[idx].total += 1;
        if q.was_correct() {
            tallies[idx].correct += 1;
        }
    }
    tallies
}

/// Table with the strictly lowest rate below 1.0; earlier tables win ties
pub fn weakest_table(tallies: &[TableTally]) -> Option<u32> {
    let mut weakest = None;
    let mut lowest = 1.0;
    for tally in tallies {
        if let Some(rate) = tally.rate() {
            if rate < lowest {
                lowest = rate;
                weakest = Some(tally.table);
            }
        }
    }
    weakest
}

/// Table with the strictly highest rate above 0.0; earlier tables win ties
pub fn strongest_table(tallies: &[TableTally]) -> Option<u32> {
    let mut strongest = None;
    let mut highest = 0.0;
    for tally in tallies {
        if let Some(rate) = tally.rate() {
            if rate > highest {
                highest = rate;
                strongest = Some(tally.table);
            }
        }
    }
    strongest
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub correct: usize,
    pub incorrect: usize,
    /// 0-100, rounded
    pub percentage: u8,
    pub weakest_table: Option<u32>,
}

/// Score a set of questions
pub fn score(questions: &[Question]) -> Score {
    let total = questions.len();
    if total == 0 {
        return Score::default();
    }

    let correct = questions.iter().filter(|q| q.was_correct()).count();
    let percentage = (correct as f64 * 100.0 / total as f64).round() as u8;

    Score {
        correct,
        incorrect: total - correct,
        percentage,
        weakest_table: weakest_table(&tally_by_table(questions)),
    }
}
