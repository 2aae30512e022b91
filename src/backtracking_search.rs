//! This module implements puzzle solving as a backtracking search over the domains left behind by
//! node and arc consistency. Variables are chosen by minimum remaining values, with ties going to
//! the variable crossing the most others, and each variable's options are tried in
//! least-constraining-value order. Optionally, arc consistency can be maintained after every
//! choice.

use std::cmp::Reverse;
use std::collections::HashMap;

use instant::{Duration, Instant};
use thiserror::Error;

use crate::arc_consistency::{enforce_arc_consistency, Arc};
use crate::assignment::Assignment;
use crate::domains::Domains;
use crate::error::{CrosswordError, CrosswordResult};
use crate::grid_config::{Crossword, VariableId, WordId};
use crate::node_consistency::enforce_node_consistency;
use crate::CHECK_INVARIANTS;

/// What, if anything, to infer after each tentative choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Inference {
    /// Domains stay exactly as the initial arc consistency pass left them.
    #[default]
    None,

    /// Copy the domains at each level, narrow the chosen variable to its word, and re-run AC-3
    /// from its unassigned neighbors. Branches that empty a domain are skipped.
    MaintainArcConsistency,
}

/// Settings for a solve.
#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    pub inference: Inference,

    /// Give up with `FillFailure::Timeout` once this much time has passed.
    pub time_budget: Option<Duration>,
}

/// A struct tracking statistics about the solving process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    pub initial_options: usize,
    pub remaining_options: usize,
    pub duration: Duration,
}

/// A struct representing the results of a successful solve.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FillFailure {
    /// Consistency checks emptied some variable's domain before any search happened.
    #[error("some slot has no possible words")]
    Unsatisfiable,

    /// The search tried everything without finding a complete assignment.
    #[error("no solution")]
    HardFailure,

    /// The time budget ran out mid-search.
    #[error("ran out of time")]
    Timeout,
}

/// Choose the unassigned variable with the fewest remaining options, preferring the one with the
/// most neighbors (and then the lowest id) on ties.
pub fn select_unassigned_variable(
    crossword: &Crossword,
    domains: &Domains,
    assignment: &Assignment,
) -> Option<VariableId> {
    assignment
        .unassigned()
        .min_by_key(|&variable| (domains.len(variable), Reverse(crossword.degree(variable))))
}

/// How many options each letter accounts for in the cell one unassigned neighbor shares with the
/// variable being ordered.
struct CrossingCounts {
    cell: usize,
    option_count: usize,
    counts_by_char: HashMap<char, usize>,
}

/// Return the options for `variable` sorted by how many options they would rule out among its
/// unassigned neighbors, fewest first. Ties keep their word id order.
pub fn order_domain_values(
    crossword: &Crossword,
    domains: &Domains,
    assignment: &Assignment,
    variable: VariableId,
) -> Vec<WordId> {
    let crossings: Vec<CrossingCounts> = crossword
        .neighbors(variable)
        .filter(|&neighbor| !assignment.is_assigned(neighbor))
        .filter_map(|neighbor| {
            let (cell, neighbor_cell) = crossword.overlap(variable, neighbor)?;
            let mut counts_by_char: HashMap<char, usize> = HashMap::new();
            let mut option_count = 0;

            for word_id in domains.options(neighbor) {
                option_count += 1;
                if let Some(&c) = crossword.word(word_id).chars.get(neighbor_cell) {
                    *counts_by_char.entry(c).or_insert(0) += 1;
                }
            }

            Some(CrossingCounts { cell, option_count, counts_by_char })
        })
        .collect();

    let mut values: Vec<WordId> = domains.options(variable).collect();
    values.sort_by_cached_key(|&word_id| {
        let word = crossword.word(word_id);

        crossings
            .iter()
            .map(|crossing| {
                let compatible = word
                    .chars
                    .get(crossing.cell)
                    .and_then(|c| crossing.counts_by_char.get(c))
                    .copied()
                    .unwrap_or(0);
                crossing.option_count - compatible
            })
            .sum::<usize>()
    });

    values
}

/// The recursive part of the search. Kept apart from `Solver` so that the domains can be borrowed
/// while the statistics are updated.
struct Search<'a> {
    crossword: &'a Crossword,
    inference: Inference,
    deadline: Option<Instant>,
    statistics: &'a mut Statistics,
}

impl Search<'_> {
    /// Try to extend `assignment` to a complete one. Returns `Ok(true)` with `assignment`
    /// completed, or `Ok(false)` with `assignment` exactly as it was passed in.
    fn backtrack(
        &mut self,
        domains: &Domains,
        assignment: &mut Assignment,
    ) -> Result<bool, FillFailure> {
        if assignment.is_complete() {
            return Ok(true);
        }

        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(FillFailure::Timeout);
        }

        self.statistics.states += 1;

        let Some(variable) = select_unassigned_variable(self.crossword, domains, assignment) else {
            return Ok(true);
        };

        for word_id in order_domain_values(self.crossword, domains, assignment, variable) {
            if !assignment.is_consistent_with(self.crossword, variable, word_id) {
                continue;
            }

            assignment.insert(variable, word_id);
            log::trace!(
                "Trying {} for {} ({} of {} assigned)",
                self.crossword.word(word_id).string,
                self.crossword.variable(variable),
                assignment.len(),
                self.crossword.variable_count()
            );

            if CHECK_INVARIANTS && !assignment.is_consistent(self.crossword) {
                panic!("Inconsistent assignment after choosing {word_id} for {variable}");
            }

            let found = match self.inference {
                Inference::None => self.backtrack(domains, assignment)?,
                Inference::MaintainArcConsistency => {
                    match self.infer(domains, assignment, variable, word_id) {
                        Some(inferred) => self.backtrack(&inferred, assignment)?,
                        None => false,
                    }
                }
            };

            if found {
                return Ok(true);
            }

            assignment.remove(variable);
            self.statistics.backtracks += 1;
        }

        Ok(false)
    }

    /// Build the domains implied by choosing `word_id` for `variable`, or `None` if that choice
    /// leaves some variable without options.
    fn infer(
        &self,
        domains: &Domains,
        assignment: &Assignment,
        variable: VariableId,
        word_id: WordId,
    ) -> Option<Domains> {
        let mut inferred = domains.clone();
        inferred.restrict(variable, word_id);

        let arcs: Vec<Arc> = self
            .crossword
            .neighbors(variable)
            .filter(|&neighbor| !assignment.is_assigned(neighbor))
            .map(|neighbor| (neighbor, variable))
            .collect();

        enforce_arc_consistency(self.crossword, &mut inferred, Some(arcs)).then_some(inferred)
    }
}

/// Owns the domain store for one puzzle and runs the consistency passes and the search over it.
pub struct Solver<'a> {
    crossword: &'a Crossword,
    config: SolverConfig,
    domains: Domains,
    statistics: Statistics,
}

impl<'a> Solver<'a> {
    pub fn new(crossword: &'a Crossword) -> Solver<'a> {
        Solver::with_config(crossword, SolverConfig::default())
    }

    pub fn with_config(crossword: &'a Crossword, config: SolverConfig) -> Solver<'a> {
        Solver {
            crossword,
            config,
            domains: Domains::new(crossword),
            statistics: Statistics::default(),
        }
    }

    pub fn crossword(&self) -> &'a Crossword {
        self.crossword
    }

    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Put every variable's domain back to the whole dictionary.
    pub fn reset(&mut self) {
        self.domains = Domains::new(self.crossword);
        self.statistics = Statistics::default();
    }

    pub fn enforce_node_consistency(&mut self) {
        enforce_node_consistency(self.crossword, &mut self.domains);
    }

    /// Run AC-3 over the current domains; see `arc_consistency::enforce_arc_consistency`.
    pub fn enforce_arc_consistency(&mut self, initial_arcs: Option<Vec<Arc>>) -> bool {
        enforce_arc_consistency(self.crossword, &mut self.domains, initial_arcs)
    }

    /// Assign `word_id` to `variable`, refusing anything that isn't in the variable's current
    /// domain.
    pub fn assign(
        &self,
        assignment: &mut Assignment,
        variable: VariableId,
        word_id: WordId,
    ) -> CrosswordResult {
        if !self.domains.contains(variable, word_id) {
            let word = self
                .crossword
                .words()
                .get(word_id)
                .map_or_else(|| format!("#{word_id}"), |word| word.string.clone());
            return Err(CrosswordError::InvalidAction { variable, word });
        }

        assignment.insert(variable, word_id);
        Ok(())
    }

    /// Extend `assignment` to a complete assignment using the current domains. The domains aren't
    /// reset first. A seed that already repeats a word or clashes at a crossing has no
    /// extension, so it fails with `HardFailure` without searching.
    pub fn backtrack(&mut self, assignment: Assignment) -> Result<Assignment, FillFailure> {
        if !assignment.is_consistent(self.crossword) {
            log::debug!("Seed assignment is inconsistent; nothing to extend");
            return Err(FillFailure::HardFailure);
        }

        let deadline = self.config.time_budget.map(|budget| Instant::now() + budget);
        self.search(assignment, deadline)
    }

    /// Solve from scratch: reset the domains, make them node- and arc-consistent, then search.
    pub fn solve(&mut self) -> Option<Assignment> {
        self.run().ok().map(|success| success.assignment)
    }

    /// Like `solve`, but reporting statistics and why a solve failed.
    pub fn run(&mut self) -> Result<FillSuccess, FillFailure> {
        let start = Instant::now();
        let deadline = self.config.time_budget.map(|budget| start + budget);

        self.reset();
        self.statistics.initial_options = self.domains.total_options();

        self.enforce_node_consistency();
        let consistent = self.enforce_arc_consistency(None);
        self.statistics.remaining_options = self.domains.total_options();

        let result = if consistent {
            log::debug!(
                "Consistency passes left {} of {} options",
                self.statistics.remaining_options,
                self.statistics.initial_options
            );
            self.search(Assignment::new(self.crossword), deadline)
        } else {
            Err(FillFailure::Unsatisfiable)
        };

        self.statistics.duration = start.elapsed();

        match result {
            Ok(assignment) => {
                log::info!(
                    "Found a solution in {:?} ({} states, {} backtracks)",
                    self.statistics.duration,
                    self.statistics.states,
                    self.statistics.backtracks
                );
                Ok(FillSuccess {
                    statistics: self.statistics.clone(),
                    assignment,
                })
            }
            Err(failure) => {
                log::info!("No solution after {:?}: {failure}", self.statistics.duration);
                Err(failure)
            }
        }
    }

    fn search(
        &mut self,
        mut assignment: Assignment,
        deadline: Option<Instant>,
    ) -> Result<Assignment, FillFailure> {
        let mut search = Search {
            crossword: self.crossword,
            inference: self.config.inference,
            deadline,
            statistics: &mut self.statistics,
        };

        if search.backtrack(&self.domains, &mut assignment)? {
            Ok(assignment)
        } else {
            Err(FillFailure::HardFailure)
        }
    }
}

/// Search for a complete assignment for the given puzzle.
pub fn find_fill(crossword: &Crossword, config: &SolverConfig) -> Result<FillSuccess, FillFailure> {
    Solver::with_config(crossword, config.clone()).run()
}

#[cfg(test)]
mod tests {
    use instant::Duration;

    use crate::assignment::Assignment;
    use crate::backtracking_search::{
        find_fill, order_domain_values, select_unassigned_variable, FillFailure, Inference,
        Solver, SolverConfig,
    };
    use crate::domains::Domains;
    use crate::error::CrosswordError;
    use crate::grid_config::Direction::{Across, Down};
    use crate::grid_config::{Crossword, Variable};
    use crate::node_consistency::enforce_node_consistency;

    /// ____
    /// _##_
    /// ____
    fn ring() -> Crossword {
        Crossword::new(
            "____\n_##_\n____",
            ["ABCD", "EFGH", "AXXD", "AQE", "DRH", "ZZZ"],
        )
        .unwrap()
    }

    /// The assigned words, in variable id order.
    fn solved_words(crossword: &Crossword, assignment: &Assignment) -> Vec<String> {
        assignment
            .choices()
            .map(|choice| crossword.word(choice.word_id).string.clone())
            .collect()
    }

    #[test]
    fn test_single_slot() {
        let crossword = Crossword::new("___", ["CAT", "DOG"]).unwrap();

        let assignment = Solver::new(&crossword).solve().expect("Failed to find a fill");

        let words = solved_words(&crossword, &assignment);
        assert_eq!(words.len(), 1);
        assert!(words[0] == "CAT" || words[0] == "DOG");
    }

    #[test]
    fn test_mismatched_crossing_has_no_solution() {
        let crossword = Crossword::from_variables(
            3,
            3,
            [Variable::new(2, 0, 3, Across), Variable::new(0, 0, 3, Down)],
            ["CAT", "ACT"],
        )
        .unwrap();

        assert!(Solver::new(&crossword).solve().is_none());
        assert_eq!(
            find_fill(&crossword, &SolverConfig::default()).unwrap_err(),
            FillFailure::Unsatisfiable
        );
    }

    #[test]
    fn test_missing_length_fails_without_search() {
        let crossword = Crossword::new("___\n_##", ["CAT", "DOG"]).unwrap();
        let mut solver = Solver::new(&crossword);

        assert_eq!(solver.run().unwrap_err(), FillFailure::Unsatisfiable);
        assert_eq!(solver.statistics().states, 0);
    }

    #[test]
    fn test_unconnected_slots_get_distinct_words() {
        let crossword = Crossword::from_variables(
            3,
            3,
            [Variable::new(0, 0, 3, Across), Variable::new(2, 0, 3, Across)],
            ["CAT", "DOG"],
        )
        .unwrap();

        let assignment = Solver::new(&crossword).solve().expect("Failed to find a fill");

        let mut words = solved_words(&crossword, &assignment);
        words.sort();
        assert_eq!(words, vec!["CAT", "DOG"]);
    }

    #[test]
    fn test_words_cannot_repeat() {
        let crossword = Crossword::from_variables(
            3,
            3,
            [Variable::new(0, 0, 3, Across), Variable::new(2, 0, 3, Across)],
            ["CAT"],
        )
        .unwrap();

        assert_eq!(
            find_fill(&crossword, &SolverConfig::default()).unwrap_err(),
            FillFailure::HardFailure
        );
    }

    #[test]
    fn test_ring_solution() {
        let crossword = ring();

        let result = find_fill(&crossword, &SolverConfig::default()).expect("Failed to find a fill");

        assert!(result.assignment.is_complete());
        assert!(result.assignment.is_consistent(&crossword));
        assert_eq!(
            solved_words(&crossword, &result.assignment),
            // Ordered by slot: the two across slots, then the two down slots.
            vec!["ABCD", "EFGH", "AQE", "DRH"]
        );
        assert!(result.statistics.remaining_options < result.statistics.initial_options);
    }

    #[test]
    fn test_inference_finds_same_solution() {
        let crossword = ring();
        let config = SolverConfig {
            inference: Inference::MaintainArcConsistency,
            ..SolverConfig::default()
        };

        let with_inference = find_fill(&crossword, &config).expect("Failed to find a fill");
        let without_inference =
            find_fill(&crossword, &SolverConfig::default()).expect("Failed to find a fill");

        assert_eq!(with_inference.assignment, without_inference.assignment);
    }

    #[test]
    fn test_zero_time_budget_times_out() {
        let crossword = ring();
        let config = SolverConfig {
            time_budget: Some(Duration::ZERO),
            ..SolverConfig::default()
        };

        assert_eq!(find_fill(&crossword, &config).unwrap_err(), FillFailure::Timeout);
    }

    #[test]
    fn test_solve_resets_domains() {
        let crossword = ring();
        let mut solver = Solver::new(&crossword);

        let first = solver.solve();
        let second = solver.solve();

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_backtrack_extends_seeded_assignment() {
        let crossword = ring();
        let mut solver = Solver::new(&crossword);
        solver.enforce_node_consistency();
        assert!(solver.enforce_arc_consistency(None));

        let mut assignment = Assignment::new(&crossword);
        solver.assign(&mut assignment, 0, crossword.word_id("AXXD").unwrap()).unwrap();

        let result = solver.backtrack(assignment).expect("Failed to find a fill");
        assert_eq!(solved_words(&crossword, &result), vec!["AXXD", "EFGH", "AQE", "DRH"]);
    }

    #[test]
    fn test_complete_assignment_is_returned_as_is() {
        let crossword = Crossword::new("___", ["CAT", "DOG"]).unwrap();
        let mut solver = Solver::new(&crossword);
        solver.enforce_node_consistency();

        let mut assignment = Assignment::new(&crossword);
        solver.assign(&mut assignment, 0, crossword.word_id("DOG").unwrap()).unwrap();

        assert_eq!(solver.backtrack(assignment.clone()), Ok(assignment));
        assert_eq!(solver.statistics().states, 0);
    }

    #[test]
    fn test_backtrack_refuses_repeated_seed_word() {
        let crossword = Crossword::from_variables(
            5,
            3,
            [
                Variable::new(0, 0, 3, Across),
                Variable::new(2, 0, 3, Across),
                Variable::new(4, 0, 3, Across),
            ],
            ["CAT", "DOG"],
        )
        .unwrap();
        let mut solver = Solver::new(&crossword);
        solver.enforce_node_consistency();
        let cat = crossword.word_id("CAT").unwrap();

        let mut assignment = Assignment::new(&crossword);
        solver.assign(&mut assignment, 0, cat).unwrap();
        solver.assign(&mut assignment, 1, cat).unwrap();

        assert_eq!(solver.backtrack(assignment), Err(FillFailure::HardFailure));
        assert_eq!(solver.statistics().states, 0);
    }

    #[test]
    fn test_backtrack_refuses_clashing_seed() {
        let crossword = ring();
        let mut solver = Solver::new(&crossword);
        solver.enforce_node_consistency();

        // The bottom row's last letter is the right column's last: H against E.
        let mut assignment = Assignment::new(&crossword);
        solver.assign(&mut assignment, 1, crossword.word_id("EFGH").unwrap()).unwrap();
        solver.assign(&mut assignment, 3, crossword.word_id("AQE").unwrap()).unwrap();

        assert_eq!(solver.backtrack(assignment), Err(FillFailure::HardFailure));
    }

    #[test]
    fn test_backtrack_reports_timeout() {
        let crossword = ring();
        let config = SolverConfig {
            time_budget: Some(Duration::ZERO),
            ..SolverConfig::default()
        };
        let mut solver = Solver::with_config(&crossword, config);
        solver.enforce_node_consistency();

        assert_eq!(
            solver.backtrack(Assignment::new(&crossword)),
            Err(FillFailure::Timeout)
        );
    }

    #[test]
    fn test_assign_rejects_words_outside_domain() {
        let crossword = ring();
        let mut solver = Solver::new(&crossword);
        solver.enforce_node_consistency();
        let mut assignment = Assignment::new(&crossword);

        let result = solver.assign(&mut assignment, 0, crossword.word_id("ZZZ").unwrap());

        assert!(matches!(
            result,
            Err(CrosswordError::InvalidAction { variable: 0, ref word }) if word == "ZZZ"
        ));
        assert!(assignment.is_empty());

        assert!(matches!(
            solver.assign(&mut assignment, 99, 0),
            Err(CrosswordError::InvalidAction { variable: 99, .. })
        ));
    }

    #[test]
    fn test_select_prefers_fewest_options_then_degree() {
        // The across slot crosses both down slots but is listed last.
        let crossword = Crossword::from_variables(
            3,
            3,
            [
                Variable::new(0, 0, 3, Down),
                Variable::new(0, 2, 3, Down),
                Variable::new(0, 0, 3, Across),
            ],
            ["CAT", "COW", "TOE"],
        )
        .unwrap();
        let mut domains = Domains::new(&crossword);
        enforce_node_consistency(&crossword, &mut domains);
        let mut assignment = Assignment::new(&crossword);

        assert_eq!(select_unassigned_variable(&crossword, &domains, &assignment), Some(2));

        domains.remove(1, 0);
        assert_eq!(select_unassigned_variable(&crossword, &domains, &assignment), Some(1));

        assignment.insert(1, 1);
        assert_eq!(select_unassigned_variable(&crossword, &domains, &assignment), Some(2));

        assignment.insert(0, 0);
        assignment.insert(2, 2);
        assert_eq!(select_unassigned_variable(&crossword, &domains, &assignment), None);
    }

    #[test]
    fn test_order_prefers_least_constraining_values() {
        let crossword = Crossword::from_variables(
            3,
            3,
            [Variable::new(0, 0, 3, Across), Variable::new(0, 0, 3, Down)],
            ["BAT", "CAT", "COW", "CUB"],
        )
        .unwrap();
        let mut domains = Domains::new(&crossword);
        enforce_node_consistency(&crossword, &mut domains);
        let mut assignment = Assignment::new(&crossword);

        // Only one of the down slot's options starts with B, but three start with C.
        assert_eq!(order_domain_values(&crossword, &domains, &assignment, 0), vec![1, 2, 3, 0]);

        // Assigned neighbors don't count.
        assignment.insert(1, 2);
        assert_eq!(order_domain_values(&crossword, &domains, &assignment, 0), vec![0, 1, 2, 3]);
    }
}
