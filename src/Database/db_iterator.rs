//! # Iteration over a corpus of database files
//!
//! [`DatabaseIterator`] walks an ordered list of files, text or binary (`.db`),
//! and yields one [`Complex`] at a time. The first error stops the iteration:
//! after it `next()` returns `None`.
use crate::Database::Complex::Complex;
use crate::Database::complex_binary::read_complex;
use crate::Database::complex_text::{
    GRID_ROWS, decode_record, is_header_line, is_skipped_line, record_line_count,
};
use crate::Database::db_errors::DbError;
use log::{error, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// true for the binary format, told by the `.db` suffix
pub fn is_binary_database(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("db"))
}

enum Source {
    Text {
        lines: Lines<BufReader<File>>,
        /// number of the last line read, 1-based
        line_no: usize,
    },
    Binary {
        reader: BufReader<File>,
    },
}

pub struct DatabaseIterator {
    files: Vec<PathBuf>,
    /// index of the next file to open
    next_file: usize,
    current: Option<(String, Source)>,
    failed: bool,
    records_in_file: usize,
}

impl DatabaseIterator {
    pub fn new<P: AsRef<Path>>(files: &[P]) -> Self {
        Self {
            files: files.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            next_file: 0,
            current: None,
            failed: false,
            records_in_file: 0,
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// closes the open file and starts again from the first one
    pub fn rewind(&mut self) {
        self.current = None;
        self.next_file = 0;
        self.failed = false;
        self.records_in_file = 0;
    }

    fn open_next(&mut self) -> Result<bool, DbError> {
        let Some(path) = self.files.get(self.next_file) else {
            return Ok(false);
        };
        self.next_file += 1;
        let name = path.display().to_string();
        let file = File::open(path).map_err(|e| DbError::io(&name, e))?;
        let reader = BufReader::new(file);
        let source = if is_binary_database(path) {
            Source::Binary { reader }
        } else {
            Source::Text {
                lines: reader.lines(),
                line_no: 0,
            }
        };
        info!("reading database {}", name);
        self.current = Some((name, source));
        self.records_in_file = 0;
        Ok(true)
    }

    fn read_from_current(&mut self) -> Result<Option<Complex>, DbError> {
        let Some((name, source)) = self.current.as_mut() else {
            return Ok(None);
        };
        match source {
            Source::Binary { reader } => {
                read_complex(reader).map_err(|e| DbError::from_binary(name, e))
            }
            Source::Text { lines, line_no } => read_text_record(name, lines, line_no),
        }
    }

    /// The next record of the corpus, `Ok(None)` after the last file.
    pub fn next_complex(&mut self) -> Result<Option<Complex>, DbError> {
        if self.failed {
            return Ok(None);
        }
        let result = self.advance();
        if let Err(e) = &result {
            error!("database iteration stopped: {}", e);
            self.failed = true;
            self.current = None;
        }
        result
    }

    fn advance(&mut self) -> Result<Option<Complex>, DbError> {
        loop {
            if self.current.is_none() && !self.open_next()? {
                return Ok(None);
            }
            if let Some(c) = self.read_from_current()? {
                self.records_in_file += 1;
                return Ok(Some(c));
            }
            if let Some((name, _)) = self.current.take() {
                info!("{}: {} records", name, self.records_in_file);
            }
        }
    }
}

impl Iterator for DatabaseIterator {
    type Item = Result<Complex, DbError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_complex().transpose()
    }
}

fn read_line(
    file: &str,
    lines: &mut Lines<BufReader<File>>,
    line_no: &mut usize,
) -> Result<Option<String>, DbError> {
    match lines.next() {
        None => Ok(None),
        Some(Ok(line)) => {
            *line_no += 1;
            Ok(Some(line))
        }
        Some(Err(e)) => Err(DbError::io(file, e)),
    }
}

fn read_text_record(
    file: &str,
    lines: &mut Lines<BufReader<File>>,
    line_no: &mut usize,
) -> Result<Option<Complex>, DbError> {
    let first = loop {
        let Some(line) = read_line(file, lines, line_no)? else {
            return Ok(None);
        };
        if *line_no == 1 {
            if is_header_line(&line) {
                continue;
            }
            warn!("{}: no header line, reading line 1 as data", file);
        }
        if !is_skipped_line(&line) {
            break line;
        }
    };
    let start = *line_no;
    let count = record_line_count(&first, start).map_err(|e| DbError::from_text(file, e))?;
    let mut block = vec![first];
    for _ in 1..count {
        match read_line(file, lines, line_no)? {
            Some(line) => block.push(line),
            None => break,
        }
    }
    if count > 1 && block.len() < 1 + GRID_ROWS {
        warn!("{}: lookup record at line {} is cut short", file, start);
    }
    let refs: Vec<&str> = block.iter().map(String::as_str).collect();
    decode_record(&refs, start).map(Some).map_err(|e| {
        error!("{}: cannot read the record at line {}\n{}\n^", file, start, block[0]);
        DbError::from_text(file, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database::complex_binary::write_all;
    use crate::Database::complex_text::{TEXT_HEADER, encode_record};
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn text_file(content: &str) -> NamedTempFile {
        let mut f = Builder::new().suffix(".txt").tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    fn binary_file(records: &[Complex]) -> NamedTempFile {
        let mut f = Builder::new().suffix(".db").tempfile().unwrap();
        write_all(&mut f, records).unwrap();
        f
    }

    fn two_records() -> Vec<Complex> {
        vec![
            Complex::new("A").with_constant(1.0).with_reactant("B", 1.0),
            Complex::new("C").with_constant(2.0).with_reactant("D", 2.0),
        ]
    }

    #[test]
    fn test_empty_text_file_then_binary_file() {
        let empty = text_file("");
        let bin = binary_file(&two_records());
        let mut it = DatabaseIterator::new(&[empty.path(), bin.path()]);
        assert_eq!(it.next_complex().unwrap().unwrap().name, "A");
        assert_eq!(it.next_complex().unwrap().unwrap().name, "C");
        assert!(it.next_complex().unwrap().is_none());
    }

    #[test]
    fn test_text_file_skips_header_comments_and_blank_lines() {
        let content = format!(
            "{}\n/ a comment\n\n{}\n   \n{}\n",
            TEXT_HEADER,
            encode_record(&two_records()[0]),
            encode_record(&two_records()[1])
        );
        let f = text_file(&content);
        let names: Vec<String> = DatabaseIterator::new(&[f.path()])
            .map(|r| r.unwrap().name)
            .collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_text_file_without_header() {
        let f = text_file(&format!("{}\n", encode_record(&two_records()[0])));
        let all: Vec<_> = DatabaseIterator::new(&[f.path()]).collect();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_lookup_record_spans_six_lines() {
        let mut text = format!("{}\nL;1;lookup;600;1;A;1;\n", TEXT_HEADER);
        for _ in 0..GRID_ROWS {
            text.push_str("1;2;3;4;5;6;7;8;9;10;11;12;13;14\n");
        }
        text.push_str(&encode_record(&two_records()[0]));
        let f = text_file(&text);
        let records: Vec<Complex> = DatabaseIterator::new(&[f.path()])
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert!(records[0].is_lookup());
        assert_eq!(records[1].name, "A");
    }

    #[test]
    fn test_parse_error_names_file_and_line() {
        let f = text_file(&format!("{}\nA;1;;;B;1;;;;;;;;;;;;\nX;oops;;;B;1;;;;;;;;;;;;\n", TEXT_HEADER));
        let bin = binary_file(&two_records());
        let mut it = DatabaseIterator::new(&[f.path(), bin.path()]);
        assert!(it.next_complex().unwrap().is_some());
        match it.next_complex() {
            Err(DbError::Parse { file, source }) => {
                assert!(file.ends_with(".txt"));
                assert_eq!(source.line, 3);
                assert_eq!(source.field, "logK");
            }
            other => panic!("unexpected {:?}", other),
        }
        // no resynchronisation after an error
        assert!(it.next_complex().unwrap().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn test_tokenize_error_carries_line() {
        let f = text_file(&format!("{}\n\"A;1\n", TEXT_HEADER));
        match DatabaseIterator::new(&[f.path()]).next() {
            Some(Err(DbError::Tokenize { line, .. })) => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut it = DatabaseIterator::new(&["/definitely/not/here.txt"]);
        match it.next_complex() {
            Err(DbError::Io { file, .. }) => assert_eq!(file, "/definitely/not/here.txt"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_binary_error_names_the_field() {
        let mut f = Builder::new().suffix(".db").tempfile().unwrap();
        f.write_all(&2u16.to_be_bytes()).unwrap();
        f.write_all(&[0xff, 0xfe]).unwrap();
        match DatabaseIterator::new(&[f.path()]).next_complex() {
            Err(DbError::Binary { field, .. }) => assert_eq!(field, "name"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rewind() {
        let bin = binary_file(&two_records());
        let mut it = DatabaseIterator::new(&[bin.path()]);
        assert_eq!(it.by_ref().count(), 2);
        it.rewind();
        assert_eq!(it.count(), 2);
    }

    #[test]
    fn test_binary_suffix() {
        assert!(is_binary_database(Path::new("x/y.db")));
        assert!(is_binary_database(Path::new("Y.DB")));
        assert!(!is_binary_database(Path::new("y.txt")));
        assert!(!is_binary_database(Path::new("db")));
    }
}
