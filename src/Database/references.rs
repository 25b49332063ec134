//! Citation keys of the reference field.
use crate::Database::db_errors::DbError;
use crate::Database::tokenizer::split_line;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Splits a reference field into citation keys at `+`, `,` and `;` outside of
/// brackets. Bracketed spans stay inside their key verbatim, so
/// `"1996H (estimate based on La+3)"` is one key.
pub fn split_refs(text: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut depth: usize = 0;
    let mut current = String::new();
    for ch in text.chars() {
        match ch {
            '(' | '[' | '{' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            '+' | ',' | ';' if depth == 0 => {
                let key = current.trim();
                if !key.is_empty() {
                    keys.push(key.to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    let key = current.trim();
    if !key.is_empty() {
        keys.push(key.to_string());
    }
    keys
}

/// A key with its bracketed annotations removed,
/// `"1996H (estimate based on La+3)"` -> `"1996H"`.
pub fn citation_key(token: &str) -> String {
    let mut key = String::new();
    let mut depth: usize = 0;
    for ch in token.chars() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ if depth == 0 => key.push(ch),
            _ => {}
        }
    }
    key.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// store of known citation keys
pub trait ReferenceStore {
    fn is_known(&self, key: &str) -> bool;
}

impl ReferenceStore for HashSet<String> {
    fn is_known(&self, key: &str) -> bool {
        self.contains(key)
    }
}

/// One key per line, the first `;`/`,` separated field; blank and `/` lines are skipped.
pub fn load_reference_keys(path: &Path) -> Result<HashSet<String>, DbError> {
    let name = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| DbError::io(&name, e))?;
    let mut keys = HashSet::new();
    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('/') {
            continue;
        }
        let fields = split_line(line).map_err(|source| DbError::Tokenize {
            file: name.clone(),
            line: i + 1,
            source,
        })?;
        if !fields[0].is_empty() {
            keys.insert(fields[0].clone());
        }
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_split_refs() {
        assert_eq!(split_refs("1976BAE+2001ALB"), vec!["1976BAE", "2001ALB"]);
        assert_eq!(split_refs(" A , B; C "), vec!["A", "B", "C"]);
        assert_eq!(
            split_refs("1996H (estimate based on La+3)"),
            vec!["1996H (estimate based on La+3)"]
        );
        assert_eq!(split_refs("X [a,b] + Y {c;d}"), vec!["X [a,b]", "Y {c;d}"]);
        assert!(split_refs("").is_empty());
        assert!(split_refs(" + ; ").is_empty());
    }

    #[test]
    fn test_citation_key() {
        assert_eq!(citation_key("1996H (estimate based on La+3)"), "1996H");
        assert_eq!(citation_key("X [a,b] part {c} 2"), "X part 2");
        assert_eq!(citation_key("1976BAE"), "1976BAE");
        assert_eq!(citation_key("(all annotation)"), "");
    }

    #[test]
    fn test_reference_store() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "/ citation keys").unwrap();
        writeln!(f, "1976BAE;Baes and Mesmer").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "\"2001ALB, part 2\";x").unwrap();
        let keys = load_reference_keys(f.path()).unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.is_known("1976BAE"));
        assert!(keys.is_known("2001ALB, part 2"));
        assert!(!keys.is_known("1999XYZ"));
    }
}
