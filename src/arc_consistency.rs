//! AC-3: prune every domain until each remaining option has a compatible partner in every other
//! variable's domain, or until some domain runs dry.

use std::collections::{HashSet, VecDeque};

use bit_set::BitSet;

use crate::domains::Domains;
use crate::grid_config::{Crossword, VariableId, WordId};

/// An ordered pair `(x, y)`: "every option for `x` must have support in `y`".
pub type Arc = (VariableId, VariableId);

/// Worklist of arcs still to be revised. An arc that's already waiting is never enqueued twice.
#[derive(Debug)]
struct ArcQueue {
    queue: VecDeque<Arc>,
    pending: BitSet,
    variable_count: usize,
}

impl ArcQueue {
    fn with_initial_arcs<Items>(variable_count: usize, items: Items) -> ArcQueue
    where
        Items: IntoIterator<Item = Arc>,
    {
        let mut queue = ArcQueue {
            queue: VecDeque::new(),
            pending: BitSet::with_capacity(variable_count * variable_count),
            variable_count,
        };
        for arc in items {
            queue.enqueue(arc);
        }
        queue
    }

    fn pop_front(&mut self) -> Option<Arc> {
        let arc = self.queue.pop_front()?;
        self.pending.remove(self.key(arc));
        Some(arc)
    }

    fn enqueue(&mut self, arc: Arc) {
        let (x, y) = arc;
        if x != y && self.pending.insert(self.key(arc)) {
            self.queue.push_back(arc);
        }
    }

    fn key(&self, (x, y): Arc) -> usize {
        x * self.variable_count + y
    }
}

/// Can `x` hold `x_word` while `y` holds `y_word`? Variables that don't cross are always
/// compatible.
pub fn is_compatible(
    crossword: &Crossword,
    x: VariableId,
    x_word: WordId,
    y: VariableId,
    y_word: WordId,
) -> bool {
    match crossword.overlap(x, y) {
        None => true,
        Some((x_cell, y_cell)) => {
            match (crossword.word(x_word).chars.get(x_cell), crossword.word(y_word).chars.get(y_cell)) {
                (Some(x_char), Some(y_char)) => x_char == y_char,
                _ => false,
            }
        }
    }
}

/// Make `x` arc consistent with `y` by removing every option for `x` that has no compatible
/// option left in `y`. Returns whether anything was removed.
pub fn revise(crossword: &Crossword, domains: &mut Domains, x: VariableId, y: VariableId) -> bool {
    let removed = match crossword.overlap(x, y) {
        // Without a shared cell, any option for `y` supports every option for `x`, so the only
        // way to lose support is for `y` to have no options at all.
        None => {
            if domains.is_empty(y) {
                domains.retain(x, |_| false)
            } else {
                0
            }
        }

        Some((x_cell, y_cell)) => {
            // Which letters can `y` still put in the shared cell?
            let supported_chars: HashSet<char> = domains
                .options(y)
                .filter_map(|word_id| crossword.word(word_id).chars.get(y_cell).copied())
                .collect();

            domains.retain(x, |word_id| {
                crossword
                    .word(word_id)
                    .chars
                    .get(x_cell)
                    .map_or(false, |c| supported_chars.contains(c))
            })
        }
    };

    removed > 0
}

/// Run AC-3 over `domains`. If `initial_arcs` is `None` the worklist starts with every ordered
/// pair of distinct variables. Returns false if any domain ends up (or already was) empty.
pub fn enforce_arc_consistency(
    crossword: &Crossword,
    domains: &mut Domains,
    initial_arcs: Option<Vec<Arc>>,
) -> bool {
    if domains.any_empty() {
        log::debug!("Arc consistency started with an empty domain");
        return false;
    }

    let variable_count = crossword.variable_count();
    let mut queue = match initial_arcs {
        Some(arcs) => ArcQueue::with_initial_arcs(variable_count, arcs),
        None => ArcQueue::with_initial_arcs(
            variable_count,
            (0..variable_count)
                .flat_map(|x| (0..variable_count).filter(move |&y| y != x).map(move |y| (x, y))),
        ),
    };

    let options_before = domains.total_options();
    let mut revisions = 0;

    while let Some((x, y)) = queue.pop_front() {
        if !revise(crossword, domains, x, y) {
            continue;
        }
        revisions += 1;

        if domains.is_empty(x) {
            log::debug!(
                "Arc consistency emptied the domain of {} after {revisions} revisions",
                crossword.variable(x)
            );
            return false;
        }

        // Shrinking `x` may leave options in its other neighbors without support.
        for z in crossword.neighbors(x) {
            if z != y {
                queue.enqueue((z, x));
            }
        }
    }

    log::debug!(
        "Arc consistency removed {} options in {revisions} revisions",
        options_before - domains.total_options()
    );
    true
}
