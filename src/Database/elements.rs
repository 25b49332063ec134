//! # Element / reactant table
//!
//! Tells which reactants a database may use and which element each belongs to.
//! Text files hold one element per line:
//! `element;count;reactant1;display1;...;reactantN;displayN[;description]`, an
//! optional first header line, `/` comments and blank lines. A reactant written
//! as `@name` removes an association declared earlier, also in an earlier file.
//! The binary form (`.elb`) repeats `element, i32 count, count × (reactant, display)`
//! with the string encoding of the binary database.
use crate::Database::complex_binary::{FrameReader, ReadFail, write_i32, write_utf};
use crate::Database::db_errors::{DbError, RecordParseError};
use crate::Database::species_names::{is_electron, is_proton, is_water, normalize_name};
use crate::Database::tokenizer::split_line;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementReactant {
    pub element: String,
    pub reactant: String,
    /// name shown to users, the formula when none was given
    pub display: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementTable {
    entries: Vec<ElementReactant>,
}

/// true for the `.elb` suffix
pub fn is_binary_element_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("elb"))
}

/// `x.db` -> `x.elb`, anything else -> `x.elt`
pub fn element_file_for(db_path: &Path) -> PathBuf {
    let binary = db_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("db"));
    db_path.with_extension(if binary { "elb" } else { "elt" })
}

impl ElementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ElementReactant] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds an association; a reactant starting with `@` removes it instead.
    pub fn insert(&mut self, element: &str, reactant: &str, display: &str) {
        if let Some(removed) = reactant.strip_prefix('@') {
            self.remove(element, removed);
            return;
        }
        if self
            .entries
            .iter()
            .any(|e| e.element == element && e.reactant == reactant)
        {
            return;
        }
        let display = if display.is_empty() { reactant } else { display };
        self.entries.push(ElementReactant {
            element: element.to_string(),
            reactant: reactant.to_string(),
            display: display.to_string(),
        });
    }

    pub fn remove(&mut self, element: &str, reactant: &str) {
        self.entries
            .retain(|e| !(e.element == element && e.reactant == reactant));
    }

    /// appends the associations of `other` in its order
    pub fn merge(&mut self, other: &ElementTable) {
        for e in &other.entries {
            self.insert(&e.element, &e.reactant, &e.display);
        }
    }

    /// distinct reactant formulas
    pub fn known_reactants(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.reactant.clone()).collect()
    }

    /// Water, the electron and the proton are always known.
    pub fn is_known(&self, reactant: &str) -> bool {
        if is_water(reactant) || is_electron(reactant) || is_proton(reactant) {
            return true;
        }
        let key = normalize_name(reactant);
        self.entries.iter().any(|e| normalize_name(&e.reactant) == key)
    }

    pub fn elements_of(&self, reactant: &str) -> Vec<&str> {
        let key = normalize_name(reactant);
        self.entries
            .iter()
            .filter(|e| normalize_name(&e.reactant) == key)
            .map(|e| e.element.as_str())
            .collect()
    }

    ////////////////////////////////TEXT FORMAT////////////////////////////////

    /// Applies the lines of a text element file to this table.
    pub fn apply_text(&mut self, content: &str, file: &str) -> Result<(), DbError> {
        for (i, line) in content.lines().enumerate() {
            let line_no = i + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('/') {
                continue;
            }
            let fields = split_line(line).map_err(|source| DbError::Tokenize {
                file: file.to_string(),
                line: line_no,
                source,
            })?;
            let element = fields[0].as_str();
            let count_text = fields.get(1).map(String::as_str).unwrap_or("");
            let count = match count_text.parse::<usize>() {
                Ok(n) => n,
                Err(_) if line_no == 1 => {
                    // header line
                    continue;
                }
                Err(_) => {
                    return Err(DbError::Parse {
                        file: file.to_string(),
                        source: RecordParseError::new(
                            "count",
                            line_no,
                            element,
                            format!("'{}' is not a reactant count", count_text),
                        ),
                    });
                }
            };
            if fields.len() < 2 + 2 * count {
                warn!(
                    "{}, line {}: element {} declares {} reactants but lists fewer",
                    file, line_no, element, count
                );
            }
            for k in 0..count {
                let reactant = fields.get(2 + 2 * k).map(String::as_str).unwrap_or("");
                let display = fields.get(3 + 2 * k).map(String::as_str).unwrap_or("");
                if !reactant.is_empty() {
                    self.insert(element, reactant, display);
                }
            }
        }
        Ok(())
    }

    pub fn from_text_file(path: &Path) -> Result<Self, DbError> {
        let name = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|e| DbError::io(&name, e))?;
        let mut table = Self::new();
        table.apply_text(&content, &name)?;
        info!("{}: {} element/reactant pairs", name, table.entries.len());
        Ok(table)
    }

    ////////////////////////////////BINARY FORMAT////////////////////////////////

    pub fn from_binary_file(path: &Path) -> Result<Self, DbError> {
        let name = path.display().to_string();
        let file = File::open(path).map_err(|e| DbError::io(&name, e))?;
        let mut reader = BufReader::new(file);
        let mut table = Self::new();
        loop {
            let mut frame = FrameReader::new(&mut reader);
            match read_element(&mut frame) {
                Ok((element, pairs)) => {
                    for (reactant, display) in pairs {
                        table.insert(&element, &reactant, &display);
                    }
                }
                Err(ReadFail::Eof(partial)) => {
                    if partial {
                        warn!("{}: file ends inside an element entry", name);
                    }
                    break;
                }
                Err(ReadFail::Error(e)) => return Err(DbError::from_binary(&name, e)),
            }
        }
        info!("{}: {} element/reactant pairs", name, table.entries.len());
        Ok(table)
    }

    /// Writes the table in the binary form, one entry per element in order of
    /// first appearance.
    pub fn write_binary(&self, path: &Path) -> Result<(), DbError> {
        let name = path.display().to_string();
        let io_err = |e| DbError::io(&name, e);
        let file = File::create(path).map_err(io_err)?;
        let mut w = BufWriter::new(file);
        let mut elements: Vec<&str> = Vec::new();
        for e in &self.entries {
            if !elements.contains(&e.element.as_str()) {
                elements.push(&e.element);
            }
        }
        for element in elements {
            let pairs: Vec<&ElementReactant> =
                self.entries.iter().filter(|e| e.element == element).collect();
            write_utf(&mut w, element).map_err(io_err)?;
            write_i32(&mut w, pairs.len() as i32).map_err(io_err)?;
            for p in pairs {
                write_utf(&mut w, &p.reactant).map_err(io_err)?;
                write_utf(&mut w, &p.display).map_err(io_err)?;
            }
        }
        w.flush().map_err(io_err)
    }

    /// text file or, for `.elb`, binary file
    pub fn load(path: &Path) -> Result<Self, DbError> {
        if is_binary_element_file(path) {
            Self::from_binary_file(path)
        } else {
            Self::from_text_file(path)
        }
    }
}

fn read_element<R: std::io::Read>(
    r: &mut FrameReader<'_, R>,
) -> Result<(String, Vec<(String, String)>), ReadFail> {
    let element = r.utf("element")?;
    let count = r.count("count")?;
    let mut pairs = Vec::with_capacity(count);
    for _ in 0..count {
        let reactant = r.utf("reactant")?;
        let display = r.utf("display")?;
        pairs.push((reactant, display));
    }
    Ok((element, pairs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{Builder, tempdir};

    const SAMPLE: &str = "ELEMENT;N;REACTANT;NAME\n\
        / iron species\n\
        Fe;2;Fe+2;ferrous;Fe+3;\n\
        \n\
        C;2;CO3-2;carbonate;HCO3-;bicarbonate;carbon\n\
        Fe;1;@Fe+3;\n";

    #[test]
    fn test_text_table_with_removal() {
        let mut t = ElementTable::new();
        t.apply_text(SAMPLE, "sample.elt").unwrap();
        assert_eq!(t.entries().len(), 3);
        assert!(t.is_known("Fe+2"));
        assert!(t.is_known("Fe 2+"));
        assert!(!t.is_known("Fe+3"));
        assert!(t.is_known("H2O"));
        assert!(t.is_known("H+"));
        assert_eq!(t.elements_of("HCO3-"), vec!["C"]);
        assert_eq!(t.entries()[0].display, "ferrous");
        let known: Vec<String> = t.known_reactants().into_iter().collect();
        assert_eq!(known, vec!["CO3-2", "Fe+2", "HCO3-"]);
    }

    #[test]
    fn test_removal_across_files() {
        let mut first = ElementTable::new();
        first.apply_text("Fe;2;Fe+2;;Fe+3;\n", "a.elt").unwrap();
        first.apply_text("Fe;1;@Fe+2;\n", "b.elt").unwrap();
        assert_eq!(first.known_reactants().len(), 1);
        assert!(first.is_known("Fe+3"));
    }

    #[test]
    fn test_bad_count_is_reported() {
        let mut t = ElementTable::new();
        match t.apply_text("Fe;2;Fe+2;;\nC;x;CO3-2\n", "bad.elt") {
            Err(DbError::Parse { source, .. }) => {
                assert_eq!(source.line, 2);
                assert_eq!(source.species, "C");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_binary_round_trip() {
        let mut t = ElementTable::new();
        t.apply_text(SAMPLE, "sample.elt").unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.elb");
        t.write_binary(&path).unwrap();
        let back = ElementTable::load(&path).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_load_text_by_extension() {
        let mut f = Builder::new().suffix(".elt").tempfile().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        let t = ElementTable::load(f.path()).unwrap();
        assert_eq!(t.entries().len(), 3);
    }

    #[test]
    fn test_merge_deduplicates() {
        let mut a = ElementTable::new();
        a.insert("Fe", "Fe+2", "");
        let mut b = ElementTable::new();
        b.insert("Fe", "Fe+2", "ferrous");
        b.insert("Ca", "Ca+2", "");
        a.merge(&b);
        assert_eq!(a.entries().len(), 2);
        assert_eq!(a.entries()[0].display, "Fe+2");
    }

    #[test]
    fn test_element_file_for() {
        assert_eq!(element_file_for(Path::new("dir/base.db")), PathBuf::from("dir/base.elb"));
        assert_eq!(element_file_for(Path::new("dir/base.txt")), PathBuf::from("dir/base.elt"));
        assert_eq!(element_file_for(Path::new("base")), PathBuf::from("base.elt"));
    }
}
