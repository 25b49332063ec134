//! # Text codec of reaction records
//!
//! ## Record shapes
//! One record per line, fields separated by `;` (or `,`), quoting per
//! [`crate::Database::tokenizer`]:
//! - legacy, 18 fields: `name;logK;dH;dCp;R1;N1;...;R6;N6;nH;reference /comment`;
//!   `nH` is the net proton count, added as an `H+` reactant unless `H+` already
//!   sits in one of the six slots; tMax follows the default rules;
//! - variable: `name;logK;dH;dCp;tMax;nR;R1;N1;...;reference /comment`;
//! - analytic: `name;logK;analytic;tMax;a0;...;a5;nR;R1;N1;...;reference /comment`;
//! - lookup: `name;logK;lookup;tMax;nR;R1;N1;...;reference /comment` followed by
//!   5 lines of 14 values (NaN for a missing cell), one line per pressure level.
//!
//! A field that is present but empty stands for "not set". The layout is told by
//! field 3 (`analytic`/`lookup`) and otherwise by fields 5 and 6: a number in
//! field 5, or an empty field 5 followed by an integer, is the `tMax;nR` pair of
//! the variable layout, anything else is the first legacy reactant.
//! A legacy line must reach the `nH` field; the reference may be left off.
//! Layouts with a reactant count must hold a name or a coefficient for each
//! declared reactant. When a line has more fields than its layout needs, the
//! surplus belongs to the last (reference) field.
use crate::Database::Complex::{Complex, Reactant, is_empty_value};
use crate::Database::db_errors::{RecordParseError, TextCodecError};
use crate::Database::species_names::{PROTON, is_proton};
use crate::Database::tokenizer::{join_fields, split_line, split_line_n};
use crate::Thermodynamics::logK_extrapolation::{Extrapolation, LogKGrid, LogKModel};

/// first line of every text database
pub const TEXT_HEADER: &str = "COMPLEX;LogK;DH_kJmol;DCp_Jmol;R1;N1;R2;N2;R3;N3;R4;N4;R5;N5;R6;N6;H;Reference / Comment";

const LEGACY_FIELDS: usize = 18;
const LEGACY_SLOTS: usize = 6;
/// grid lines following a lookup header
pub const GRID_ROWS: usize = 5;
const GRID_COLUMNS: usize = 14;
const MAX_REACTANTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Legacy,
    Variable,
    Analytic,
    Lookup,
}

/// true for the header line of a text database
pub fn is_header_line(line: &str) -> bool {
    let upper = line.trim_start().to_ascii_uppercase();
    upper.starts_with("COMPLEX;") || upper.starts_with("COMPLEX,")
}

/// blank lines and lines starting with `/` carry no record
pub fn is_skipped_line(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t.starts_with('/')
}

/// number as written in the files; empty, "NaN" and "nan" are NaN
fn parse_number(text: &str) -> Option<f64> {
    let t = text.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    t.parse::<f64>().ok()
}

fn format_number(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else {
        format!("{}", x)
    }
}

fn format_optional(x: Option<f64>) -> String {
    x.map(format_number).unwrap_or_default()
}

/// Splits the trailing field into (reference, comment). The comment starts at
/// the first `" /"`, or at a leading `/`.
pub fn split_ref_comment(field: &str) -> (String, String) {
    let field = field.trim();
    if let Some(rest) = field.strip_prefix('/') {
        return (String::new(), rest.trim().to_string());
    }
    match field.find(" /") {
        Some(i) => (
            field[..i].trim().to_string(),
            field[i + 2..].trim().to_string(),
        ),
        None => (field.to_string(), String::new()),
    }
}

/// inverse of [`split_ref_comment`]
pub fn join_ref_comment(reference: &str, comment: &str) -> String {
    match (reference.is_empty(), comment.is_empty()) {
        (_, true) => reference.to_string(),
        (true, false) => format!("/{}", comment),
        (false, false) => format!("{} /{}", reference, comment),
    }
}

fn detect_layout(fields: &[String]) -> Layout {
    match fields.get(2).map(|f| f.to_ascii_lowercase()).as_deref() {
        Some("analytic") => Layout::Analytic,
        Some("lookup") => Layout::Lookup,
        _ => match (fields.get(4).map(String::as_str), fields.get(5)) {
            (Some(t_max), _) if !t_max.is_empty() && t_max.parse::<f64>().is_ok() => {
                Layout::Variable
            }
            (Some(""), Some(count)) if count.parse::<usize>().is_ok() => Layout::Variable,
            _ => Layout::Legacy,
        },
    }
}

/// column name of field `idx` of a legacy line
fn legacy_field_name(idx: usize) -> String {
    match idx {
        0 => "name".to_string(),
        1 => "logK".to_string(),
        2 => "DH".to_string(),
        3 => "DCp".to_string(),
        i if i == 4 + 2 * LEGACY_SLOTS => "H".to_string(),
        i if i % 2 == 0 => format!("R{}", (i - 4) / 2 + 1),
        i => format!("N{}", (i - 4) / 2 + 1),
    }
}

/// reads typed values out of the fields of one line
struct FieldReader<'a> {
    fields: &'a [String],
    line: usize,
    species: &'a str,
}

impl FieldReader<'_> {
    fn error(&self, field: &str, reason: impl Into<String>) -> RecordParseError {
        RecordParseError::new(field, self.line, self.species, reason)
    }

    fn text(&self, idx: usize) -> &str {
        self.fields.get(idx).map(String::as_str).unwrap_or("")
    }

    /// empty field or the EMPTY sentinel gives `None`
    fn optional(&self, idx: usize, field: &str) -> Result<Option<f64>, RecordParseError> {
        let t = self.text(idx);
        if t.is_empty() {
            return Ok(None);
        }
        match parse_number(t) {
            Some(x) if x.is_nan() => Err(self.error(field, "NaN is not allowed here")),
            Some(x) if is_empty_value(x) => Ok(None),
            Some(x) => Ok(Some(x)),
            None => Err(self.error(field, format!("'{}' is not a number", t))),
        }
    }

    fn count(&self, idx: usize) -> Result<usize, RecordParseError> {
        let t = self.text(idx);
        if t.is_empty() {
            return Err(self.error("nR", "missing reactant count"));
        }
        match t.parse::<f64>() {
            Ok(x) if x >= 0.0 && x.fract() == 0.0 && (x as usize) <= MAX_REACTANTS => {
                Ok(x as usize)
            }
            _ => Err(self.error("nR", format!("'{}' is not a reactant count", t))),
        }
    }

    /// The six legacy slots starting at `start`; fully empty slots are skipped.
    fn slot_reactants(&self, start: usize) -> Result<Vec<Reactant>, RecordParseError> {
        let mut out = Vec::with_capacity(LEGACY_SLOTS);
        for k in 0..LEGACY_SLOTS {
            let name = self.text(start + 2 * k);
            let coef_field = format!("N{}", k + 1);
            let coef = self.optional(start + 2 * k + 1, &coef_field)?;
            match (name.is_empty(), coef) {
                (true, None) => {}
                (false, None) => {
                    return Err(self.error(&coef_field, format!("no coefficient for '{}'", name)));
                }
                (true, Some(c)) if c == 0.0 => {}
                (_, Some(c)) => out.push(Reactant::new(name, c)),
            }
        }
        Ok(out)
    }

    /// `count` declared (name, coefficient) pairs starting at `start`; every
    /// pair needs its coefficient, a name-less pair keeps an empty name.
    fn counted_reactants(
        &self,
        start: usize,
        count: usize,
    ) -> Result<Vec<Reactant>, RecordParseError> {
        let mut out = Vec::with_capacity(count);
        for k in 0..count {
            let name = self.text(start + 2 * k);
            let coef_field = format!("N{}", k + 1);
            match (name.is_empty(), self.optional(start + 2 * k + 1, &coef_field)?) {
                (true, None) => {
                    return Err(self.error(
                        &format!("R{}", k + 1),
                        format!("reactant {} of {} is missing", k + 1, count),
                    ));
                }
                (false, None) => {
                    return Err(self.error(&coef_field, format!("no coefficient for '{}'", name)));
                }
                (_, Some(c)) => out.push(Reactant::new(name, c)),
            }
        }
        Ok(out)
    }
}

fn tokenize(line: &str, line_no: usize, n: Option<usize>) -> Result<Vec<String>, TextCodecError> {
    let result = match n {
        Some(n) => split_line_n(line, n),
        None => split_line(line),
    };
    result.map_err(|source| TextCodecError::Tokenize {
        line: line_no,
        source,
    })
}

/// Lines taken by the record starting with `line`: 1, or 1 + [`GRID_ROWS`] for lookup records.
pub fn record_line_count(line: &str, line_no: usize) -> Result<usize, TextCodecError> {
    let fields = tokenize(line, line_no, None)?;
    Ok(match detect_layout(&fields) {
        Layout::Lookup => 1 + GRID_ROWS,
        _ => 1,
    })
}

/// Decodes one record from its lines; `first_line` is the 1-based line number of
/// `lines[0]` in the file (0 when unknown).
pub fn decode_record(lines: &[&str], first_line: usize) -> Result<Complex, TextCodecError> {
    let header = lines.first().copied().unwrap_or("");
    let fields = tokenize(header, first_line, None)?;
    let name = fields.first().cloned().unwrap_or_default();
    if name.is_empty() {
        return Err(RecordParseError::new("name", first_line, "", "missing species name").into());
    }
    let layout = detect_layout(&fields);
    let head = FieldReader {
        fields: &fields,
        line: first_line,
        species: &name,
    };
    let n = match layout {
        Layout::Legacy => {
            // everything up to the net proton column is required
            if fields.len() < LEGACY_FIELDS - 1 {
                let missing = legacy_field_name(fields.len());
                return Err(head.error(&missing, "line ends before this field").into());
            }
            LEGACY_FIELDS
        }
        Layout::Variable => 6 + 2 * head.count(5)? + 1,
        Layout::Analytic => 11 + 2 * head.count(10)? + 1,
        Layout::Lookup => 5 + 2 * head.count(4)? + 1,
    };
    let fields = tokenize(header, first_line, Some(n))?;
    let r = FieldReader {
        fields: &fields,
        line: first_line,
        species: &name,
    };

    let mut c = Complex::new(&name);
    c.constant = r.optional(1, "logK")?;
    let (reference, comment) = split_ref_comment(r.text(n - 1));
    c.reference = reference;
    c.comment = comment;

    match layout {
        Layout::Legacy => {
            c.extrapolation = Extrapolation::delta_h_cp(r.optional(2, "DH")?, r.optional(3, "DCp")?);
            c.t_max = c.extrapolation.default_t_max();
            c.reactants = r.slot_reactants(4)?;
            let n_h = r.optional(4 + 2 * LEGACY_SLOTS, "H")?;
            c.proton_count_field = n_h;
            if let Some(n_h) = n_h {
                if n_h != 0.0 && !c.reactants.iter().any(|x| is_proton(&x.name)) {
                    c.reactants.push(Reactant::new(PROTON, n_h));
                }
            }
        }
        Layout::Variable => {
            c.extrapolation = Extrapolation::delta_h_cp(r.optional(2, "DH")?, r.optional(3, "DCp")?);
            c.t_max = r
                .optional(4, "tMax")?
                .unwrap_or_else(|| c.extrapolation.default_t_max());
            let count = r.count(5)?;
            c.reactants = r.counted_reactants(6, count)?;
        }
        Layout::Analytic => {
            let mut a = [None; 6];
            for (i, slot) in a.iter_mut().enumerate() {
                *slot = r.optional(4 + i, &format!("a{}", i))?;
            }
            c.extrapolation = Extrapolation::analytic(a);
            c.t_max = r
                .optional(3, "tMax")?
                .unwrap_or_else(|| c.extrapolation.default_t_max());
            let count = r.count(10)?;
            c.reactants = r.counted_reactants(11, count)?;
        }
        Layout::Lookup => {
            let count = r.count(4)?;
            c.reactants = r.counted_reactants(5, count)?;
            let grid = decode_grid(&lines[1.min(lines.len())..], first_line, &name)?;
            c.extrapolation = Extrapolation::lookup(grid);
            c.t_max = r
                .optional(3, "tMax")?
                .unwrap_or_else(|| c.extrapolation.default_t_max());
        }
    }
    Ok(c)
}

fn decode_grid(rows: &[&str], first_line: usize, species: &str) -> Result<LogKGrid, TextCodecError> {
    let mut grid = LogKGrid::from_element(f64::NAN);
    for row in 0..GRID_ROWS {
        let line_no = if first_line == 0 { 0 } else { first_line + 1 + row };
        let field = format!("logK grid row {}", row + 1);
        let Some(line) = rows.get(row) else {
            return Err(RecordParseError::new(&field, line_no, species, "missing line").into());
        };
        let mut values = tokenize(line, line_no, None)?;
        if values.len() == GRID_COLUMNS + 1 && values[GRID_COLUMNS].is_empty() {
            values.pop();
        }
        if values.len() != GRID_COLUMNS {
            return Err(RecordParseError::new(
                &field,
                line_no,
                species,
                format!("expected {} values, found {}", GRID_COLUMNS, values.len()),
            )
            .into());
        }
        for (col, v) in values.iter().enumerate() {
            grid[(row, col)] = parse_number(v).ok_or_else(|| {
                RecordParseError::new(&field, line_no, species, format!("'{}' is not a number", v))
            })?;
        }
    }
    Ok(grid)
}

/// Decodes a record held in a string (one line, or six for lookup records).
pub fn decode_str(text: &str) -> Result<Complex, TextCodecError> {
    let lines: Vec<&str> = text.lines().collect();
    decode_record(&lines, 0)
}

/// true when the record can be written in the fixed six-slot layout
fn fits_legacy(c: &Complex) -> bool {
    let protons = c.reactants.iter().filter(|r| is_proton(&r.name)).count();
    let others = c.reactants.len() - protons;
    // a first slot that is empty or numeric would read back as `tMax;nR`
    protons <= 1
        && others <= LEGACY_SLOTS
        && (c.t_max - c.default_t_max()).abs() < 1e-9
        && c.reactants
            .iter()
            .find(|r| !is_proton(&r.name))
            .is_none_or(|r| !r.name.is_empty() && r.name.parse::<f64>().is_err())
}

fn push_reactants(fields: &mut Vec<String>, reactants: &[Reactant]) {
    fields.push(reactants.len().to_string());
    for r in reactants {
        fields.push(r.name.clone());
        fields.push(format_number(r.coef));
    }
}

/// Encodes a record in the most compact shape that holds all of its fields.
/// Lookup records produce six lines joined by `'\n'`.
pub fn encode_record(c: &Complex) -> String {
    let mut fields: Vec<String> = vec![c.name.clone(), format_optional(c.constant)];
    let reference = join_ref_comment(&c.reference, &c.comment);
    match &c.extrapolation {
        Extrapolation::Analytic(s) => {
            fields.push("analytic".to_string());
            fields.push(format_number(c.t_max));
            fields.extend(s.a.iter().map(|a| format_optional(*a)));
            push_reactants(&mut fields, &c.reactants);
            fields.push(reference);
            join_fields(&fields)
        }
        Extrapolation::LookUp(g) => {
            fields.push("lookup".to_string());
            fields.push(format_number(c.t_max));
            push_reactants(&mut fields, &c.reactants);
            fields.push(reference);
            let mut out = join_fields(&fields);
            for row in 0..GRID_ROWS {
                let values: Vec<String> = (0..GRID_COLUMNS)
                    .map(|col| format_number(g.grid[(row, col)]))
                    .collect();
                out.push('\n');
                out.push_str(&values.join(";"));
            }
            out
        }
        Extrapolation::DeltaHCp(d) => {
            fields.push(format_optional(d.delta_h));
            fields.push(format_optional(d.delta_cp));
            if fits_legacy(c) {
                let mut n_h = String::new();
                let mut slots = 0;
                for r in &c.reactants {
                    if is_proton(&r.name) {
                        n_h = format_number(r.coef);
                    } else {
                        fields.push(r.name.clone());
                        fields.push(format_number(r.coef));
                        slots += 1;
                    }
                }
                for _ in slots..LEGACY_SLOTS {
                    fields.push(String::new());
                    fields.push(String::new());
                }
                fields.push(n_h);
            } else {
                fields.push(format_number(c.t_max));
                push_reactants(&mut fields, &c.reactants);
            }
            fields.push(reference);
            join_fields(&fields)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn round_trip(c: &Complex) -> Complex {
        let text = encode_record(c);
        decode_str(&text).unwrap_or_else(|e| panic!("cannot decode {:?}: {}", text, e))
    }

    #[test]
    fn test_decode_legacy_line() {
        let c = decode_str("FeOH+;-9.5;55.8;;Fe+2;1;H2O;1;;;;;;;;;-1;1976BAE /estimated").unwrap();
        assert_eq!(c.name, "FeOH+");
        assert_eq!(c.constant, Some(-9.5));
        assert_eq!(c.delta_h(), Some(55.8));
        assert_eq!(c.delta_cp(), None);
        assert_eq!(c.t_max, 100.0);
        assert_eq!(c.reactants.len(), 3);
        assert_eq!(c.coefficient_of("H+"), Some(-1.0));
        assert_eq!(c.proton_count_field, Some(-1.0));
        assert_eq!(c.reference, "1976BAE");
        assert_eq!(c.comment, "estimated");
    }

    #[test]
    fn test_legacy_proton_slot_wins_over_net_count() {
        let c = decode_str("X;1;;;A;1;H+;2;;;;;;;;;3;").unwrap();
        assert_eq!(c.coefficient_of("H+"), Some(2.0));
        assert_eq!(c.proton_count_field, Some(3.0));
        assert_eq!(c.reactants.len(), 2);
    }

    #[test]
    fn test_legacy_keeps_zero_and_nameless_entries() {
        let c = decode_str("X;1;;;A;0;;2;B;1;;;;;;;;").unwrap();
        let pairs: Vec<(&str, f64)> = c.reactants.iter().map(|r| (r.name.as_str(), r.coef)).collect();
        assert_eq!(pairs, vec![("A", 0.0), ("", 2.0), ("B", 1.0)]);
    }

    #[test]
    fn test_decode_variable_line() {
        let c = decode_str("CaCl+;0.4;;;25;2;Ca+2;1;Cl-;1;Ref, 2; more").unwrap();
        assert_eq!(c.t_max, 25.0);
        assert_eq!(c.reactants.len(), 2);
        assert_eq!(c.reference, "Ref, 2; more");
        assert_eq!(c.comment, "");
    }

    #[test]
    fn test_decode_analytic_line() {
        let c = decode_str(
            "CO2;-6.35;analytic;300;-356.3;-0.06;21834;126.8;-1684915;;2;HCO3-;1;H+;1;1998PAR",
        )
        .unwrap();
        assert!(c.is_analytic());
        assert_eq!(c.t_max, 300.0);
        match &c.extrapolation {
            Extrapolation::Analytic(s) => {
                assert_eq!(s.a[0], Some(-356.3));
                assert_eq!(s.a[5], None);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(c.reference, "1998PAR");
    }

    fn lookup_text() -> String {
        let mut text = String::from("AlOH+2;-4.95;LOOKUP;600;3;Al+3;1;H2O;1;H+;-1;/grid from fit");
        for row in 0..GRID_ROWS {
            let values: Vec<String> = (0..GRID_COLUMNS)
                .map(|c| if row == 0 && c >= 9 { "NaN".to_string() } else { format!("{}", row as f64 + c as f64 / 10.0) })
                .collect();
            text.push('\n');
            text.push_str(&values.join(";"));
        }
        text
    }

    #[test]
    fn test_decode_lookup_record() {
        let text = lookup_text();
        let first = text.lines().next().unwrap();
        assert_eq!(record_line_count(first, 1).unwrap(), 6);
        let c = decode_str(&text).unwrap();
        assert!(c.is_lookup());
        assert_eq!(c.comment, "grid from fit");
        assert_eq!(c.reference, "");
        match &c.extrapolation {
            Extrapolation::LookUp(g) => {
                assert!(g.grid[(0, 9)].is_nan());
                assert_relative_eq!(g.grid[(3, 4)], 3.4);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_lookup_with_short_row_fails() {
        let mut lines: Vec<String> = lookup_text().lines().map(String::from).collect();
        lines[3] = "1;2;3".to_string();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        match decode_record(&refs, 10) {
            Err(TextCodecError::Parse(e)) => {
                assert_eq!(e.field, "logK grid row 3");
                assert_eq!(e.line, 13);
                assert_eq!(e.species, "AlOH+2");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors_name_the_field() {
        match decode_str("X;abc;;;A;1;;;;;;;;;;;;") {
            Err(TextCodecError::Parse(e)) => {
                assert_eq!(e.field, "logK");
                assert_eq!(e.species, "X");
            }
            other => panic!("unexpected {:?}", other),
        }
        match decode_str("X;1;;;A;;;;;;;;;;;;;") {
            Err(TextCodecError::Parse(e)) => assert_eq!(e.field, "N1"),
            other => panic!("unexpected {:?}", other),
        }
        match decode_str("X;1;;;25;x;A;1;") {
            Err(TextCodecError::Parse(e)) => assert_eq!(e.field, "nR"),
            other => panic!("unexpected {:?}", other),
        }
        match decode_str(";1;;;A;1") {
            Err(TextCodecError::Parse(e)) => assert_eq!(e.field, "name"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_declared_reactants_must_be_present() {
        match decode_str("X;1;;;25;3;A;1") {
            Err(TextCodecError::Parse(e)) => {
                assert_eq!(e.field, "R2");
                assert_eq!(e.species, "X");
            }
            other => panic!("unexpected {:?}", other),
        }
        match decode_str("X;1;;;25;2;A;1;B") {
            Err(TextCodecError::Parse(e)) => assert_eq!(e.field, "N2"),
            other => panic!("unexpected {:?}", other),
        }
        match decode_str("CO2;-6.35;analytic;300;-356.3;;;;;;2;HCO3-;1") {
            Err(TextCodecError::Parse(e)) => assert_eq!(e.field, "R2"),
            other => panic!("unexpected {:?}", other),
        }
        let mut lines: Vec<String> = lookup_text().lines().map(String::from).collect();
        lines[0] = "AlOH+2;-4.95;lookup;600;3;Al+3;1".to_string();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        match decode_record(&refs, 4) {
            Err(TextCodecError::Parse(e)) => {
                assert_eq!(e.field, "R2");
                assert_eq!(e.line, 4);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_nameless_counted_reactant_is_kept() {
        let c = decode_str("X;1;;;60;2;;2;B;1;").unwrap();
        let pairs: Vec<(&str, f64)> = c.reactants.iter().map(|r| (r.name.as_str(), r.coef)).collect();
        assert_eq!(pairs, vec![("", 2.0), ("B", 1.0)]);

        // with the default tMax the first slot would read back as tMax;nR
        let mut c = c;
        c.t_max = c.default_t_max();
        let text = encode_record(&c);
        assert!(text.starts_with("X;1;;;25;2;;2;B;1"), "{}", text);
        assert!(c.is_equal_to(&decode_str(&text).unwrap()));
    }

    #[test]
    fn test_truncated_legacy_line_fails() {
        match decode_str("FeOH+;-9.5") {
            Err(TextCodecError::Parse(e)) => {
                assert_eq!(e.field, "DH");
                assert_eq!(e.species, "FeOH+");
            }
            other => panic!("unexpected {:?}", other),
        }
        match decode_str("FeOH+;-9.5;;;Fe+2;1;H2O") {
            Err(TextCodecError::Parse(e)) => assert_eq!(e.field, "N2"),
            other => panic!("unexpected {:?}", other),
        }
        match decode_str("FeOH+;-9.5;;;Fe+2;1;H2O;1;;;;;;;;") {
            Err(TextCodecError::Parse(e)) => assert_eq!(e.field, "H"),
            other => panic!("unexpected {:?}", other),
        }
        // the reference column may be left off
        let c = decode_str("FeOH+;-9.5;;;Fe+2;1;H2O;1;;;;;;;;;-1").unwrap();
        assert_eq!(c.reactants.len(), 3);
        assert_eq!(c.reference, "");
    }

    #[test]
    fn test_variable_line_with_empty_t_max() {
        let c = decode_str("CaCl+;0.4;;;;2;Ca+2;1;Cl-;1;REF").unwrap();
        assert_eq!(c.reactants.len(), 2);
        assert_eq!(c.reference, "REF");
        assert_eq!(c.t_max, c.default_t_max());

        let c = decode_str("CaCl+;0.4;-1.5;;;2;Ca+2;1;Cl-;1;").unwrap();
        assert_eq!(c.t_max, 100.0);
        // an empty first legacy slot followed by a non-integer stays legacy
        let c = decode_str("X;1;;;;0.5;B;1;;;;;;;;;;").unwrap();
        assert_eq!(c.reactants.len(), 2);
    }

    #[test]
    fn test_tokenize_error_carries_line() {
        match decode_record(&["X;1;\"open"], 7) {
            Err(TextCodecError::Tokenize { line, .. }) => assert_eq!(line, 7),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_log_k_and_sentinel() {
        let c = decode_str("X;;-999999.9;;A;1;;;;;;;;;;;;").unwrap();
        assert_eq!(c.constant, None);
        assert_eq!(c.delta_h(), None);
        assert!(encode_record(&c).starts_with("X;;;;A;1;"));
    }

    #[test]
    fn test_ref_comment_packing() {
        assert_eq!(split_ref_comment("A+B /note"), ("A+B".to_string(), "note".to_string()));
        assert_eq!(split_ref_comment("/only note"), (String::new(), "only note".to_string()));
        assert_eq!(split_ref_comment("1996H"), ("1996H".to_string(), String::new()));
        assert_eq!(join_ref_comment("A", "b"), "A /b");
        assert_eq!(join_ref_comment("", "b"), "/b");
        assert_eq!(join_ref_comment("A", ""), "A");
    }

    #[test]
    fn test_encoder_shapes() {
        let legacy = Complex::new("FeOH+")
            .with_constant(-9.5)
            .with_reactant("Fe+2", 1.0)
            .with_reactant("H2O", 1.0)
            .with_reactant("H+", -1.0);
        assert_eq!(encode_record(&legacy), "FeOH+;-9.5;;;Fe+2;1;H2O;1;;;;;;;;;-1;");

        let mut variable = legacy.clone();
        variable.t_max = 60.0;
        assert_eq!(encode_record(&variable), "FeOH+;-9.5;;;60;3;Fe+2;1;H2O;1;H+;-1;");

        let mut quoted = legacy.clone();
        quoted.name = "1,2-X".to_string();
        quoted.reference = "A; B".to_string();
        let line = encode_record(&quoted);
        assert!(line.starts_with("\"1,2-X\";"));
        assert!(line.ends_with("\"A; B\""));
    }

    #[test]
    fn test_round_trip_of_decoded_records() {
        let mut inputs = vec![
            "FeOH+;-9.5;55.8;;Fe+2;1;H2O;1;;;;;;;;;-1;1976BAE /estimated".to_string(),
            "X;1;;;A;1;H+;2;;;;;;;;;3;".to_string(),
            "X;1;;;A;0;;2;B;1;;;;;;;;".to_string(),
            "CaCl+;0.4;-1.5;20;150;2;Ca+2;1;Cl-;1;Ref, 2; more".to_string(),
            "Big;1;2;3;200;7;A;1;B;1;C;1;D;1;E;1;F;1;G;1;".to_string(),
            "CO2;-6.35;analytic;300;-356.3;-0.06;21834;126.8;-1684915;;2;HCO3-;1;H+;1;1998PAR".to_string(),
            "\"1,2-diol\";;;;\"it's\";1;;;;;;;;;;;;\"A, B /c; d\"".to_string(),
        ];
        inputs.push(lookup_text());
        for text in inputs {
            let c = decode_str(&text).unwrap();
            let back = round_trip(&c);
            assert!(c.is_equal_to(&back), "{} -> {}", text, encode_record(&c));
            assert_eq!(encode_record(&back), encode_record(&c));
        }
    }

    #[test]
    fn test_header_and_skipped_lines() {
        assert!(is_header_line(TEXT_HEADER));
        assert!(is_header_line("complex,logk"));
        assert!(!is_header_line("ComplexX;1"));
        assert!(is_skipped_line("   "));
        assert!(is_skipped_line("/ comment"));
        assert!(!is_skipped_line("X;1"));
    }
}
