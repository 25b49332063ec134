//! # Editing database files
//!
//! Records are appended in place. Replacing or deleting a record rewrites the
//! whole file: the new content goes to a temporary file in the same directory
//! which is then renamed over the original. Text rewrites keep the header,
//! comment and blank lines where they were. Only one writer per file is
//! expected; callers serialise edits of the same file.
use crate::Database::Complex::Complex;
use crate::Database::complex_binary::{write_all, write_complex};
use crate::Database::complex_text::{
    TEXT_HEADER, decode_record, encode_record, is_header_line, is_skipped_line,
    record_line_count,
};
use crate::Database::db_errors::DbError;
use crate::Database::db_iterator::{DatabaseIterator, is_binary_database};
use crate::Database::species_names::names_equivalent;
use log::info;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

fn file_name(path: &Path) -> String {
    path.display().to_string()
}

/// every record of one file
pub fn read_all(path: &Path) -> Result<Vec<Complex>, DbError> {
    DatabaseIterator::new(&[path]).collect()
}

/// Appends a record, creating the file (with the header line when text) if needed.
pub fn append_complex(path: &Path, c: &Complex) -> Result<(), DbError> {
    let name = file_name(path);
    let io_err = |e| DbError::io(&name, e);
    let existing = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    if is_binary_database(path) {
        write_complex(&mut file, c).map_err(io_err)?;
    } else {
        let mut text = String::new();
        if existing == 0 {
            text.push_str(TEXT_HEADER);
            text.push('\n');
        } else if !fs::read(path).map_err(io_err)?.ends_with(b"\n") {
            text.push('\n');
        }
        text.push_str(&encode_record(c));
        text.push('\n');
        file.write_all(text.as_bytes()).map_err(io_err)?;
    }
    info!("{}: appended {}", name, c.name);
    Ok(())
}

/// writes `content` next to `path` and renames it over `path`
fn rewrite(path: &Path, write: impl FnOnce(&mut BufWriter<&mut NamedTempFile>) -> std::io::Result<()>) -> Result<(), DbError> {
    let name = file_name(path);
    let io_err = |e| DbError::io(&name, e);
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut w = BufWriter::new(&mut tmp);
        write(&mut w).map_err(io_err)?;
        w.flush().map_err(io_err)?;
    }
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Replaces (`Some`) or deletes (`None`) the first record named `target`.
fn edit_first(path: &Path, target: &str, replacement: Option<&Complex>) -> Result<bool, DbError> {
    let name = file_name(path);
    if is_binary_database(path) {
        let mut records = read_all(path)?;
        let Some(pos) = records.iter().position(|c| names_equivalent(&c.name, target)) else {
            return Ok(false);
        };
        match replacement {
            Some(c) => records[pos] = c.clone(),
            None => {
                records.remove(pos);
            }
        }
        rewrite(path, |w| write_all(w, &records))?;
        return Ok(true);
    }

    let content = fs::read_to_string(path).map_err(|e| DbError::io(&name, e))?;
    let lines: Vec<&str> = content.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 5);
    let mut found = false;
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if found || (i == 0 && is_header_line(line)) || is_skipped_line(line) {
            out.push(line.to_string());
            i += 1;
            continue;
        }
        let count = record_line_count(line, i + 1).map_err(|e| DbError::from_text(&name, e))?;
        let end = (i + count).min(lines.len());
        let record = decode_record(&lines[i..end], i + 1).map_err(|e| DbError::from_text(&name, e))?;
        if names_equivalent(&record.name, target) {
            found = true;
            if let Some(c) = replacement {
                out.extend(encode_record(c).lines().map(String::from));
            }
        } else {
            out.extend(lines[i..end].iter().map(|l| l.to_string()));
        }
        i = end;
    }
    if !found {
        return Ok(false);
    }
    rewrite(path, |w| {
        for l in &out {
            writeln!(w, "{}", l)?;
        }
        Ok(())
    })?;
    Ok(true)
}

/// Replaces the first record named `target`; `false` when there is none.
pub fn replace_complex(path: &Path, target: &str, c: &Complex) -> Result<bool, DbError> {
    let done = edit_first(path, target, Some(c))?;
    if done {
        info!("{}: replaced {} by {}", file_name(path), target, c.name);
    }
    Ok(done)
}

/// Deletes the first record named `target`; `false` when there is none.
pub fn delete_complex(path: &Path, target: &str) -> Result<bool, DbError> {
    let done = edit_first(path, target, None)?;
    if done {
        info!("{}: deleted {}", file_name(path), target);
    }
    Ok(done)
}

/// Writes a new database, text with header or binary by the suffix of `path`.
pub fn write_database(path: &Path, records: &[Complex]) -> Result<(), DbError> {
    if is_binary_database(path) {
        return rewrite(path, |w| write_all(w, records));
    }
    rewrite(path, |w| {
        writeln!(w, "{}", TEXT_HEADER)?;
        for c in records {
            writeln!(w, "{}", encode_record(c))?;
        }
        Ok(())
    })
}

/// Converts a database between the text and the binary format, returns the
/// number of records written.
pub fn convert(src: &Path, dst: &Path) -> Result<usize, DbError> {
    let records = read_all(src)?;
    write_database(dst, &records)?;
    info!(
        "converted {} records from {} to {}",
        records.len(),
        file_name(src),
        file_name(dst)
    );
    Ok(records.len())
}
