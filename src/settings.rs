use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tables offered on the configuration screen
pub const AVAILABLE_TABLES: [u32; 10] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

/// Question counts offered on the configuration screen
pub const QUESTION_OPTIONS: [usize; 6] = [5, 10, 15, 20, 25, 30];

pub const DEFAULT_NUMBER_OF_QUESTIONS: usize = 10;

/// Largest table that may be selected
pub const MAX_TABLE: u32 = 10;

/// Upper bound on questions per round
pub const MAX_QUESTIONS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("at least one table must be selected")]
    EmptyTableSelection,
    #[error("a session needs at least one question")]
    NoQuestions,
    #[error("a session has at most {max} questions, got {0}", max = MAX_QUESTIONS)]
    TooManyQuestions(usize),
    #[error("table {0} is outside 1..={max}", max = MAX_TABLE)]
    InvalidTable(u32),
}

/// Quiz settings. The table selection is never empty and the question
/// count is never zero: every constructor and edit goes through validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SettingsRecord", into = "SettingsRecord")]
pub struct Settings {
    number_of_questions: usize,
    selected_tables: Vec<u32>,
}

/// Wire shape of [`Settings`], shared with the web version of the game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsRecord {
    number_of_questions: usize,
    selected_tables: Vec<u32>,
}

impl TryFrom<SettingsRecord> for Settings {
    type Error = SettingsError;

    fn try_from(record: SettingsRecord) -> Result<Self, Self::Error> {
        Settings::new(record.number_of_questions, record.selected_tables)
    }
}

impl From<Settings> for SettingsRecord {
    fn from(settings: Settings) -> Self {
        Self {
            number_of_questions: settings.number_of_questions,
            selected_tables: settings.selected_tables,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            number_of_questions: DEFAULT_NUMBER_OF_QUESTIONS,
            selected_tables: AVAILABLE_TABLES.to_vec(),
        }
    }
}

impl Settings {
    pub fn new<I>(number_of_questions: usize, tables: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = u32>,
    {
        check_question_count(number_of_questions)?;

        let mut selected_tables = Vec::new();
        for table in tables {
            check_table(table)?;
            selected_tables.push(table);
        }
        selected_tables.sort_unstable();
        selected_tables.dedup();

        if selected_tables.is_empty() {
            return Err(SettingsError::EmptyTableSelection);
        }

        Ok(Self {
            number_of_questions,
            selected_tables,
        })
    }

    pub fn number_of_questions(&self) -> usize {
        self.number_of_questions
    }

    /// Selected tables, ascending and never empty
    pub fn selected_tables(&self) -> &[u32] {
        &self.selected_tables
    }

    pub fn is_selected(&self, table: u32) -> bool {
        self.selected_tables.binary_search(&table).is_ok()
    }

    pub fn set_number_of_questions(&mut self, count: usize) -> Result<(), SettingsError> {
        check_question_count(count)?;
        self.number_of_questions = count;
        Ok(())
    }

    /// Select or deselect a table. Deselecting the last table is refused and
    /// leaves the selection untouched.
    pub fn toggle_table(&mut self, table: u32) -> Result<(), SettingsError> {
        check_table(table)?;
        match self.selected_tables.binary_search(&table) {
            Ok(idx) => {
                if self.selected_tables.len() == 1 {
                    return Err(SettingsError::EmptyTableSelection);
                }
                self.selected_tables.remove(idx);
            }
            Err(idx) => self.selected_tables.insert(idx, table),
        }
        Ok(())
    }

    /// Step to the next (or previous) entry of [`QUESTION_OPTIONS`]. Counts
    /// that are not in the list snap to the nearest option in that direction.
    pub fn cycle_question_count(&mut self, forward: bool) {
        let current = self.number_of_questions;
        let next = if forward {
            QUESTION_OPTIONS
                .iter()
                .copied()
                .find(|&n| n > current)
                .unwrap_or(QUESTION_OPTIONS[0])
        } else {
            QUESTION_OPTIONS
                .iter()
                .rev()
                .copied()
                .find(|&n| n < current)
                .unwrap_or(QUESTION_OPTIONS[QUESTION_OPTIONS.len() - 1])
        };
        self.number_of_questions = next;
    }
}

fn check_question_count(count: usize) -> Result<(), SettingsError> {
    match count {
        0 => Err(SettingsError::NoQuestions),
        n if n > MAX_QUESTIONS => Err(SettingsError::TooManyQuestions(n)),
        _ => Ok(()),
    }
}

fn check_table(table: u32) -> Result<(), SettingsError> {
    if (1..=MAX_TABLE).contains(&table) {
        Ok(())
    } else {
        Err(SettingsError::InvalidTable(table))
    }
}
