use crate::domains::Domains;
use crate::grid_config::Crossword;

/// Make every variable node-consistent by removing any word whose length doesn't match the
/// variable's length. Returns the number of options removed.
pub fn enforce_node_consistency(crossword: &Crossword, domains: &mut Domains) -> usize {
    let mut removed = 0;

    for (variable_id, variable) in crossword.variables().iter().enumerate() {
        removed += domains.retain(variable_id, |word_id| {
            crossword.word(word_id).len() == variable.length
        });
    }

    log::debug!("Node consistency removed {removed} options");
    removed
}
