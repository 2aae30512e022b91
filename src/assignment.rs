use std::collections::{BTreeMap, HashSet};

use bit_set::BitSet;

use crate::arc_consistency::is_compatible;
use crate::grid_config::{Crossword, Variable, VariableId, WordId};

/// A struct recording a single variable assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub variable_id: VariableId,
    pub word_id: WordId,
}

/// A partial mapping from variables to chosen words, built up and torn down by the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
    used_words: BitSet,
    assigned_count: usize,
}

impl Assignment {
    /// An empty assignment for the given puzzle.
    pub fn new(crossword: &Crossword) -> Assignment {
        Assignment {
            words: vec![None; crossword.variable_count()],
            used_words: BitSet::with_capacity(crossword.words().len()),
            assigned_count: 0,
        }
    }

    /// Does every variable have a word?
    pub fn is_complete(&self) -> bool {
        self.assigned_count == self.words.len()
    }

    pub fn len(&self) -> usize {
        self.assigned_count
    }

    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    pub fn get(&self, variable: VariableId) -> Option<WordId> {
        self.words.get(variable).copied().flatten()
    }

    pub fn is_assigned(&self, variable: VariableId) -> bool {
        self.get(variable).is_some()
    }

    /// Is this word already used by some variable?
    pub fn uses_word(&self, word_id: WordId) -> bool {
        self.used_words.contains(word_id)
    }

    /// Record a choice, replacing any previous word for the variable. No checks are made here;
    /// see `Solver::assign` for the validated version.
    pub fn insert(&mut self, variable: VariableId, word_id: WordId) -> Option<WordId> {
        let previous = self.remove(variable);
        self.words[variable] = Some(word_id);
        self.used_words.insert(word_id);
        self.assigned_count += 1;
        previous
    }

    /// Undo the choice for a variable, if there is one.
    pub fn remove(&mut self, variable: VariableId) -> Option<WordId> {
        let previous = self.words[variable].take()?;
        // `insert` is unchecked, so another variable may still hold the same word.
        if !self.words.contains(&Some(previous)) {
            self.used_words.remove(previous);
        }
        self.assigned_count -= 1;
        Some(previous)
    }

    pub fn choices(&self) -> impl Iterator<Item = Choice> + '_ {
        self.words.iter().enumerate().filter_map(|(variable_id, word_id)| {
            word_id.map(|word_id| Choice { variable_id, word_id })
        })
    }

    pub fn unassigned(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter(|(_, word_id)| word_id.is_none())
            .map(|(variable_id, _)| variable_id)
    }

    /// Would assigning `word_id` to the (currently unassigned) `variable` keep this assignment
    /// consistent? The word must be unused, the right length, and agree with every assigned
    /// variable it crosses.
    pub fn is_consistent_with(
        &self,
        crossword: &Crossword,
        variable: VariableId,
        word_id: WordId,
    ) -> bool {
        if self.uses_word(word_id) && self.get(variable) != Some(word_id) {
            return false;
        }
        if crossword.word(word_id).len() != crossword.variable(variable).length {
            return false;
        }

        crossword.neighbors(variable).all(|other| match self.get(other) {
            Some(other_word_id) => is_compatible(crossword, variable, word_id, other, other_word_id),
            None => true,
        })
    }

    /// Check every assigned pair from scratch: distinct words, correct lengths, agreeing overlaps.
    pub fn is_consistent(&self, crossword: &Crossword) -> bool {
        let choices: Vec<Choice> = self.choices().collect();

        let distinct: HashSet<WordId> = choices.iter().map(|choice| choice.word_id).collect();
        if distinct.len() != choices.len() {
            return false;
        }

        if choices.iter().any(|choice| {
            crossword.word(choice.word_id).len() != crossword.variable(choice.variable_id).length
        }) {
            return false;
        }

        choices.iter().all(|x| {
            choices.iter().all(|y| {
                x.variable_id == y.variable_id
                    || is_compatible(crossword, x.variable_id, x.word_id, y.variable_id, y.word_id)
            })
        })
    }

    /// The assigned words keyed by slot, for display and comparison.
    pub fn to_words(&self, crossword: &Crossword) -> BTreeMap<Variable, String> {
        self.choices()
            .map(|choice| {
                (
                    *crossword.variable(choice.variable_id),
                    crossword.word(choice.word_id).string.clone(),
                )
            })
            .collect()
    }
}
