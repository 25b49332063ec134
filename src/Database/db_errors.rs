//! Errors of the database layer.
//!
//! Parsing errors of a single record ([`RecordParseError`], [`BinaryError`]) know
//! nothing about files; the iterator and the editor wrap them into [`DbError`]
//! together with the file name and the line or field.
use crate::Database::tokenizer::TokenizeError;
use std::io;
use thiserror::Error;

/// a required field of a text record is missing or malformed
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot read field '{field}' of '{species}' at line {line}: {reason}")]
pub struct RecordParseError {
    pub field: String,
    /// 1-based line in the file, 0 when a lone string was decoded
    pub line: usize,
    /// species name read so far, empty if the name itself failed
    pub species: String,
    pub reason: String,
}

impl RecordParseError {
    pub fn new(field: &str, line: usize, species: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            line,
            species: species.to_string(),
            reason: reason.into(),
        }
    }
}

/// failure of the text codec on one record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TextCodecError {
    #[error("line {line}: {source}")]
    Tokenize {
        line: usize,
        #[source]
        source: TokenizeError,
    },
    #[error(transparent)]
    Parse(#[from] RecordParseError),
}

/// failure of the binary codec, always naming the field being decoded
#[derive(Debug, Error)]
pub enum BinaryError {
    #[error("i/o error at field '{field}': {source}")]
    Io {
        field: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid field '{field}': {message}")]
    Invalid { field: String, message: String },
}

impl BinaryError {
    pub fn field(&self) -> &str {
        match self {
            BinaryError::Io { field, .. } | BinaryError::Invalid { field, .. } => field,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{file}: {source}")]
    Io {
        file: String,
        #[source]
        source: io::Error,
    },
    #[error("{file}, line {line}: {source}")]
    Tokenize {
        file: String,
        line: usize,
        #[source]
        source: TokenizeError,
    },
    #[error("{file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: RecordParseError,
    },
    #[error("{file}: cannot decode field '{field}': {message}")]
    Binary {
        file: String,
        field: String,
        message: String,
    },
}

impl DbError {
    pub fn io(file: &str, source: io::Error) -> Self {
        DbError::Io {
            file: file.to_string(),
            source,
        }
    }

    pub fn from_text(file: &str, err: TextCodecError) -> Self {
        match err {
            TextCodecError::Tokenize { line, source } => DbError::Tokenize {
                file: file.to_string(),
                line,
                source,
            },
            TextCodecError::Parse(source) => DbError::Parse {
                file: file.to_string(),
                source,
            },
        }
    }

    pub fn from_binary(file: &str, err: BinaryError) -> Self {
        let field = err.field().to_string();
        let message = match err {
            BinaryError::Io { source, .. } => source.to_string(),
            BinaryError::Invalid { message, .. } => message,
        };
        DbError::Binary {
            file: file.to_string(),
            field,
            message,
        }
    }

    /// file the error happened in
    pub fn file(&self) -> &str {
        match self {
            DbError::Io { file, .. }
            | DbError::Tokenize { file, .. }
            | DbError::Parse { file, .. }
            | DbError::Binary { file, .. } => file,
        }
    }
}
