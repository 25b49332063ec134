use ChemEqDB::Utils::logger::{init_logging, level_from_str};
use ChemEqDB::cli::cli_main::run_interactive_menu;
use simplelog::LevelFilter;
use std::path::Path;

pub fn main() {
    // first argument: terminal log level
    let level = std::env::args()
        .nth(1)
        .map(|s| level_from_str(&s))
        .unwrap_or(LevelFilter::Warn);
    if let Err(e) = init_logging(level, Some(Path::new("chemeqdb.log"))) {
        eprintln!("logging disabled: {}", e);
    }
    run_interactive_menu();
}
