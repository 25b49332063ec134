//! Spelling rules for species names.
//!
//! The databases write charges in several ways (`Fe+3`, `Fe 3+`, `Fe+++`) and
//! often omit the default aqueous state (`CO2` for `CO2(aq)`). Everything that
//! compares names goes through [`normalize_name`].
use regex::Regex;
use std::sync::LazyLock;

static CHARGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<base>.*?)(?:(?P<s1>[+-])(?P<d1>\d+)|\s+(?P<d2>\d+)(?P<s2>[+-])|(?P<s3>\++|-+))$")
        .expect("valid charge regex")
});

static POLYMORPH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<base>.+)\((?P<suffix>s|c|cr|am)\)$").expect("valid polymorph regex")
});

pub const WATER: &str = "H2O";
pub const ELECTRON: &str = "e-";
pub const PROTON: &str = "H+";

fn strip_aq(name: &str) -> &str {
    let trimmed = name.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.ends_with("(aq)") && trimmed.len() > 4 {
        trimmed[..trimmed.len() - 4].trim_end()
    } else {
        trimmed
    }
}

/// splits a name into (name without charge, signed charge)
fn split_charge(name: &str) -> (&str, i32) {
    let Some(caps) = CHARGE_RE.captures(name) else {
        return (name, 0);
    };
    let base = caps.name("base").map_or("", |m| m.as_str());
    let sign = |s: &str| if s == "-" { -1 } else { 1 };
    let charge = if let (Some(s), Some(d)) = (caps.name("s1"), caps.name("d1")) {
        sign(s.as_str()) * d.as_str().parse::<i32>().unwrap_or(1)
    } else if let (Some(s), Some(d)) = (caps.name("s2"), caps.name("d2")) {
        sign(s.as_str()) * d.as_str().parse::<i32>().unwrap_or(1)
    } else if let Some(s) = caps.name("s3") {
        let n = s.as_str().len() as i32;
        if s.as_str().starts_with('-') { -n } else { n }
    } else {
        0
    };
    (base.trim_end(), charge)
}

/// electric charge written in a species name, 0 when none
pub fn charge_of(name: &str) -> i32 {
    split_charge(strip_aq(name)).1
}

/// the name with its charge notation removed, `Fe 3+` -> `Fe`
pub fn name_without_charge(name: &str) -> String {
    split_charge(strip_aq(name)).0.to_string()
}

/// Canonical spelling used for comparisons: no `(aq)` suffix and the charge
/// written as `+`, `-`, `+n` or `-n`.
pub fn normalize_name(name: &str) -> String {
    let name = strip_aq(name);
    let (base, charge) = split_charge(name);
    if charge == 0 {
        return name.to_string();
    }
    match charge {
        1 => format!("{}+", base),
        -1 => format!("{}-", base),
        c if c > 0 => format!("{}+{}", base, c),
        c => format!("{}-{}", base, -c),
    }
}

pub fn names_equivalent(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}

pub fn is_water(name: &str) -> bool {
    let n = normalize_name(name);
    n == WATER || n == "H2O(l)"
}

pub fn is_electron(name: &str) -> bool {
    normalize_name(name) == ELECTRON
}

pub fn is_proton(name: &str) -> bool {
    normalize_name(name) == PROTON
}

/// For solid names ending in `(s)`, `(c)`, `(cr)` or `(am)` returns the base
/// name and the polymorph suffix.
pub fn solid_polymorph(name: &str) -> Option<(String, String)> {
    let caps = POLYMORPH_RE.captures(name.trim())?;
    Some((caps["base"].trim_end().to_string(), caps["suffix"].to_string()))
}
