use bit_set::BitSet;

use crate::grid_config::{Crossword, VariableId, WordId};

/// The candidate words still considered possible for each variable, stored as a set of word ids
/// per variable. Entries are only ever removed during a solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    options: Vec<BitSet>,
}

impl Domains {
    /// Start every variable off with the whole dictionary.
    pub fn new(crossword: &Crossword) -> Domains {
        let word_count = crossword.words().len();
        let full: BitSet = (0..word_count).collect();

        Domains {
            options: (0..crossword.variable_count()).map(|_| full.clone()).collect(),
        }
    }

    pub fn len(&self, variable: VariableId) -> usize {
        self.options[variable].len()
    }

    pub fn is_empty(&self, variable: VariableId) -> bool {
        self.options[variable].is_empty()
    }

    /// Is any variable's domain empty?
    pub fn any_empty(&self) -> bool {
        self.options.iter().any(|options| options.is_empty())
    }

    pub fn contains(&self, variable: VariableId, word_id: WordId) -> bool {
        self.options
            .get(variable)
            .map_or(false, |options| options.contains(word_id))
    }

    /// Iterate over a variable's remaining options in ascending word id order.
    pub fn options(&self, variable: VariableId) -> impl Iterator<Item = WordId> + '_ {
        self.options[variable].iter()
    }

    /// Remove a single option, returning whether it was present.
    pub fn remove(&mut self, variable: VariableId, word_id: WordId) -> bool {
        self.options[variable].remove(word_id)
    }

    /// Keep only the options for which `keep` returns true, returning how many were removed.
    pub fn retain<F>(&mut self, variable: VariableId, mut keep: F) -> usize
    where
        F: FnMut(WordId) -> bool,
    {
        let doomed: Vec<WordId> = self.options[variable]
            .iter()
            .filter(|&word_id| !keep(word_id))
            .collect();
        for &word_id in &doomed {
            self.options[variable].remove(word_id);
        }
        doomed.len()
    }

    /// Narrow a variable's domain down to a single word.
    pub fn restrict(&mut self, variable: VariableId, word_id: WordId) {
        let options = &mut self.options[variable];
        options.clear();
        options.insert(word_id);
    }

    pub fn total_options(&self) -> usize {
        self.options.iter().map(|options| options.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use crate::domains::Domains;
    use crate::grid_config::Crossword;

    #[test]
    fn test_domains_start_with_full_dictionary() {
        let crossword = Crossword::new("___\n___", ["CAT", "DOG", "AT"]).unwrap();
        let domains = Domains::new(&crossword);

        for variable in 0..crossword.variable_count() {
            assert_eq!(domains.len(variable), 3);
            assert_eq!(domains.options(variable).collect::<Vec<_>>(), vec![0, 1, 2]);
        }
        assert!(!domains.any_empty());
    }

    #[test]
    fn test_retain_and_restrict() {
        let crossword = Crossword::new("___", ["CAT", "DOG", "AT"]).unwrap();
        let mut domains = Domains::new(&crossword);

        assert_eq!(domains.retain(0, |word_id| word_id != 1), 1);
        assert!(!domains.contains(0, 1));
        assert_eq!(domains.len(0), 2);

        domains.restrict(0, 2);
        assert_eq!(domains.options(0).collect::<Vec<_>>(), vec![2]);

        assert!(domains.remove(0, 2));
        assert!(!domains.remove(0, 2));
        assert!(domains.is_empty(0));
        assert!(domains.any_empty());
    }
}
