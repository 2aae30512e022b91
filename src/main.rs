use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

use clap::Parser;
use crossword_csp::backtracking_search::{find_fill, FillFailure, Inference, SolverConfig};
use crossword_csp::grid_config::Crossword;
use crossword_csp::logging::init_logger;
use crossword_csp::render::{render_grid, save_image};
use instant::Duration;

/// crossword_csp: fill a crossword structure with words from a word list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the structure file, with _ marking open cells and anything else marking blocks
    structure: PathBuf,

    /// Path to the word list, one word per line
    words: PathBuf,

    /// Also draw the filled grid to this PNG file
    output: Option<PathBuf>,

    /// Re-establish arc consistency after every choice
    #[arg(long)]
    inference: bool,

    /// Give up after this many seconds
    #[arg(long)]
    time_limit: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

struct Error(String);

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0) // Print error unquoted
    }
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    init_logger(args.debug);

    let crossword = Crossword::from_files(&args.structure, &args.words)
        .map_err(|err| Error(err.to_string()))?;

    let config = SolverConfig {
        inference: if args.inference {
            Inference::MaintainArcConsistency
        } else {
            Inference::None
        },
        time_budget: args.time_limit.map(Duration::from_secs),
    };

    let result = match find_fill(&crossword, &config) {
        Ok(result) => result,
        Err(FillFailure::Timeout) => return Err(Error(FillFailure::Timeout.to_string())),
        Err(_) => {
            println!("No solution.");
            return Ok(());
        }
    };

    log::debug!("{:?}", result.statistics);

    let display_grid = render_grid(&crossword, &result.assignment);
    println!("{display_grid}");

    if let Some(output) = args.output {
        save_image(&crossword, &result.assignment, &output).map_err(|err| Error(err.to_string()))?;
    }

    Ok(())
}
