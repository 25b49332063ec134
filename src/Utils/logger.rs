//! Terminal logging, optionally mirrored to a file.
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("cannot create the log file {file}: {source}")]
    File {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("a logger is already installed: {0}")]
    AlreadySet(#[from] log::SetLoggerError),
}

/// Installs the global logger: the terminal at `level` and, when given, a log
/// file that also receives debug messages.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), LoggerError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        let file = File::create(path).map_err(|source| LoggerError::File {
            file: path.display().to_string(),
            source,
        })?;
        loggers.push(WriteLogger::new(
            LevelFilter::Debug.max(level),
            Config::default(),
            file,
        ));
    }
    CombinedLogger::init(loggers)?;
    Ok(())
}

/// `"debug"`, `"info"`, ... case-insensitive; `Info` for anything else
pub fn level_from_str(s: &str) -> LevelFilter {
    s.trim().parse().unwrap_or(LevelFilter::Info)
}
