//! The static description of a puzzle: which slots exist, which words may fill them, and where
//! the slots cross. Nothing here changes once a `Crossword` has been built.

use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Debug, Display, Formatter};
use std::fs;
use std::path::Path;

use bit_set::BitSet;
use smallvec::SmallVec;

use crate::error::{CrosswordError, CrosswordResult};
use crate::{MAX_SLOT_COUNT, MAX_SLOT_LENGTH};

/// An identifier for a given variable, based on its index in the Crossword's `variables` field.
pub type VariableId = usize;

/// An identifier for a given word, based on its index in the Crossword's `words` field.
pub type WordId = usize;

/// Zero-indexed (row, col) coords for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// The position of a shared cell within the first and the second variable's words.
pub type Overlap = (usize, usize);

/// The character marking an open cell in a structure template. Anything else is a block.
pub const OPEN_CELL: char = '_';

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// A slot in the grid: a maximal run of open cells with a fixed start, length and orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    pub row: usize,
    pub col: usize,
    pub length: usize,
    pub direction: Direction,
}

impl Variable {
    pub fn new(row: usize, col: usize, length: usize, direction: Direction) -> Variable {
        Variable { row, col, length, direction }
    }

    /// Generate the coords for each cell of this slot.
    pub fn cell_coords(&self) -> SmallVec<[GridCoord; MAX_SLOT_LENGTH]> {
        (0..self.length)
            .map(|cell_idx| match self.direction {
                Direction::Across => (self.row, self.col + cell_idx),
                Direction::Down => (self.row + cell_idx, self.col),
            })
            .collect()
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            Direction::Across => "across",
            Direction::Down => "down",
        };
        write!(f, "({}, {}) {} : {}", self.row, self.col, direction, self.length)
    }
}

/// A dictionary entry, normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub chars: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    fn new(string: String) -> Word {
        let chars = string.chars().collect();
        Word { string, chars }
    }

    /// Length in characters, which is what a slot's length is measured in.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// A struct representing the aspects of a puzzle that are static during solving.
pub struct Crossword {
    pub height: usize,
    pub width: usize,
    structure: Vec<Vec<bool>>,
    variables: SmallVec<[Variable; MAX_SLOT_COUNT]>,
    variable_ids: HashMap<Variable, VariableId>,
    words: Vec<Word>,
    word_ids: HashMap<String, WordId>,

    /// Square matrix indexed by `[x][y]`; `overlaps[y][x]` is always the mirror of `overlaps[x][y]`.
    overlaps: Vec<Vec<Option<Overlap>>>,
    neighbors: Vec<BitSet>,
}

impl Debug for Crossword {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crossword")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("variables", &self.variables)
            .field("words", &format!("({} entries)", self.words.len()))
            .finish()
    }
}

impl Crossword {
    /// Build a puzzle from a structure template, where `_` marks an open cell and any other
    /// character (or a missing one, for short lines) marks a block.
    pub fn new<I, S>(structure: &str, words: I) -> CrosswordResult<Crossword>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let structure = parse_structure(structure)?;
        let height = structure.len();
        let width = structure.first().map_or(0, |row| row.len());
        let variables = find_variables(&structure);
        Crossword::build(height, width, structure, variables, words)
    }

    /// Read a structure template and a newline-separated word list from disk.
    pub fn from_files<P, Q>(structure_path: P, words_path: Q) -> CrosswordResult<Crossword>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let structure = read_file(structure_path.as_ref())?;
        let words = read_file(words_path.as_ref())?;
        Crossword::new(&structure, words.lines())
    }

    /// Build a puzzle from an explicit list of slots. The open cells are exactly the cells those
    /// slots cover.
    pub fn from_variables<V, I, S>(
        height: usize,
        width: usize,
        variables: V,
        words: I,
    ) -> CrosswordResult<Crossword>
    where
        V: IntoIterator<Item = Variable>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let variables: Vec<Variable> = variables.into_iter().collect();
        let mut structure = vec![vec![false; width]; height];

        for variable in &variables {
            if variable.length == 0 {
                return Err(CrosswordError::InvalidGeometry(format!(
                    "slot {variable} has zero length"
                )));
            }
            for (row, col) in variable.cell_coords() {
                if row >= height || col >= width {
                    return Err(CrosswordError::InvalidGeometry(format!(
                        "slot {variable} extends outside the {height}x{width} grid"
                    )));
                }
                structure[row][col] = true;
            }
        }

        Crossword::build(height, width, structure, variables, words)
    }

    fn build<I, S>(
        height: usize,
        width: usize,
        structure: Vec<Vec<bool>>,
        variables: Vec<Variable>,
        words: I,
    ) -> CrosswordResult<Crossword>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut variable_ids: HashMap<Variable, VariableId> = HashMap::with_capacity(variables.len());
        for (id, &variable) in variables.iter().enumerate() {
            if variable_ids.insert(variable, id).is_some() {
                return Err(CrosswordError::InvalidGeometry(format!(
                    "slot {variable} appears more than once"
                )));
            }
        }

        // Sorting and de-duplicating here means distinct word ids always mean distinct strings,
        // and that domains iterate in a stable order.
        let word_strings: BTreeSet<String> = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_uppercase())
            .filter(|word| !word.is_empty())
            .collect();
        let words: Vec<Word> = word_strings.into_iter().map(Word::new).collect();
        let word_ids: HashMap<String, WordId> = words
            .iter()
            .enumerate()
            .map(|(id, word)| (word.string.clone(), id))
            .collect();

        // Build a map from cell location to the variables covering it, which we can then use to
        // calculate overlaps.
        let mut cell_by_loc: HashMap<GridCoord, SmallVec<[(VariableId, usize); 2]>> =
            HashMap::new();
        for (variable_id, variable) in variables.iter().enumerate() {
            for (cell_idx, loc) in variable.cell_coords().into_iter().enumerate() {
                cell_by_loc.entry(loc).or_default().push((variable_id, cell_idx));
            }
        }

        let mut overlaps: Vec<Vec<Option<Overlap>>> = vec![vec![None; variables.len()]; variables.len()];
        let mut neighbors: Vec<BitSet> = (0..variables.len())
            .map(|_| BitSet::with_capacity(variables.len()))
            .collect();

        for entries in cell_by_loc.values() {
            for (pos, &(x, x_cell)) in entries.iter().enumerate() {
                for &(y, y_cell) in &entries[pos + 1..] {
                    if overlaps[x][y].is_some() {
                        return Err(CrosswordError::InvalidGeometry(format!(
                            "slots {} and {} share more than one cell",
                            variables[x], variables[y]
                        )));
                    }
                    overlaps[x][y] = Some((x_cell, y_cell));
                    overlaps[y][x] = Some((y_cell, x_cell));
                    neighbors[x].insert(y);
                    neighbors[y].insert(x);
                }
            }
        }

        log::debug!(
            "Built {height}x{width} crossword with {} variables and {} words",
            variables.len(),
            words.len()
        );

        Ok(Crossword {
            height,
            width,
            structure,
            variables: variables.into_iter().collect(),
            variable_ids,
            words,
            word_ids,
            overlaps,
            neighbors,
        })
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id]
    }

    pub fn variable_id(&self, variable: &Variable) -> Option<VariableId> {
        self.variable_ids.get(variable).copied()
    }

    /// The full dictionary, sorted.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn word(&self, id: WordId) -> &Word {
        &self.words[id]
    }

    /// Look up a word, ignoring case and surrounding whitespace.
    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.word_ids.get(&word.trim().to_uppercase()).copied()
    }

    /// Where `x` and `y` share a cell, if they do: `x`'s word at `.0` must equal `y`'s word at
    /// `.1`.
    pub fn overlap(&self, x: VariableId, y: VariableId) -> Option<Overlap> {
        self.overlaps[x][y]
    }

    /// Every variable sharing a cell with `x`.
    pub fn neighbors(&self, x: VariableId) -> impl Iterator<Item = VariableId> + '_ {
        self.neighbors[x].iter()
    }

    pub fn degree(&self, x: VariableId) -> usize {
        self.neighbors[x].len()
    }

    pub fn is_open(&self, row: usize, col: usize) -> bool {
        self.structure
            .get(row)
            .and_then(|cells| cells.get(col))
            .copied()
            .unwrap_or(false)
    }
}

fn read_file(path: &Path) -> CrosswordResult<String> {
    fs::read_to_string(path).map_err(|source| CrosswordError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Turn a template into a rectangular grid of open/blocked flags, padding short lines with blocks.
fn parse_structure(template: &str) -> CrosswordResult<Vec<Vec<bool>>> {
    let lines: Vec<Vec<char>> = template
        .lines()
        .map(|line| line.trim_end().chars().collect())
        .collect();

    let width = lines.iter().map(|line| line.len()).max().unwrap_or(0);
    if width == 0 {
        return Err(CrosswordError::EmptyStructure);
    }

    Ok(lines
        .iter()
        .map(|line| {
            (0..width)
                .map(|col| line.get(col).map_or(false, |&c| c == OPEN_CELL))
                .collect()
        })
        .collect())
}

/// Find every run of at least two open cells, in the given sequence of cells, as
/// (start index, length) pairs.
fn open_runs<I: IntoIterator<Item = bool>>(cells: I) -> Vec<(usize, usize)> {
    let mut result = vec![];
    let mut run_start: Option<usize> = None;
    let mut len = 0;

    for (idx, open) in cells.into_iter().enumerate() {
        len = idx + 1;
        match (open, run_start) {
            (true, None) => run_start = Some(idx),
            (false, Some(start)) => {
                if idx - start > 1 {
                    result.push((start, idx - start));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        if len - start > 1 {
            result.push((start, len - start));
        }
    }

    result
}

/// Collect across slots row by row, then down slots column by column.
fn find_variables(structure: &[Vec<bool>]) -> Vec<Variable> {
    let height = structure.len();
    let width = structure.first().map_or(0, |row| row.len());
    let mut variables = vec![];

    for (row, cells) in structure.iter().enumerate() {
        for (col, length) in open_runs(cells.iter().copied()) {
            variables.push(Variable::new(row, col, length, Direction::Across));
        }
    }

    for col in 0..width {
        for (row, length) in open_runs((0..height).map(|row| structure[row][col])) {
            variables.push(Variable::new(row, col, length, Direction::Down));
        }
    }

    variables
}
