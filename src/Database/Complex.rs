//! # Reaction record
//!
//! ## Overview
//! A [`Complex`] is one database entry: the product species `name`, the reaction
//! forming it from `reactants` (signed stoichiometric coefficients, the product
//! itself has coefficient 1), logK at 25 °C and an [`Extrapolation`] model of its
//! temperature and pressure dependence.
//!
//! ## Canonical form and comparison
//! - [`Complex::sort_reactants`] prunes empty and zero entries and orders the
//!   reactants (alphabetically, then water, electron and proton moved to the front);
//! - [`Complex::is_equal_to`] is deep equality with tolerant floats and
//!   spelling-insensitive species names;
//! - [`Complex::same_name_and_stoichiometry`] compares only the reaction;
//! - [`Complex::compare_to`] orders records for listings.
//!
//! A name starting with `@` is an exclusion marker: it removes a species declared
//! in an earlier file instead of defining a reaction.
use crate::Database::species_names::{
    charge_of, is_electron, is_proton, is_water, names_equivalent,
};
use crate::Thermodynamics::logK_extrapolation::{Extrapolation, LogKModel, in_low_density_region};
use crate::Thermodynamics::water_IAPWS95::{T_CRITICAL_C, T_TRIPLE_C, is_water_liquid, p_sat};
use approx::relative_eq;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// "value not set" in the file formats
pub const EMPTY: f64 = -999999.9;
/// marks an analytic record in the delta-H slot of the binary format
pub const ANALYTIC: f64 = -888888.8;
/// marks a lookup record in the delta-H slot of the binary format
pub const LOOKUP: f64 = -777777.7;

/// reactants with a smaller coefficient are treated as absent
pub const COEF_TOLERANCE: f64 = 0.001;
/// pruning threshold of [`Complex::sort_reactants`]
const PRUNE_TOLERANCE: f64 = 0.00001;
/// relative tolerance of float fields in [`Complex::is_equal_to`]
const FLOAT_TOLERANCE: f64 = 1e-9;
/// the saturation branch is used within this relative distance from pSat
const SATURATION_WINDOW: f64 = 0.005;
/// at or below this pressure (bar) every liquid point counts as saturated
const ONE_ATM_WINDOW: f64 = 1.014;
/// pressure limit (bar) of the models without a lookup grid
const MAX_P_NO_GRID: f64 = 221.0;

/// true when `x` is the EMPTY sentinel
pub fn is_empty_value(x: f64) -> bool {
    (x - EMPTY).abs() < 1e-3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reactant {
    pub name: String,
    pub coef: f64,
}

impl Reactant {
    pub fn new(name: &str, coef: f64) -> Self {
        Self {
            name: name.to_string(),
            coef,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complex {
    pub name: String,
    /// logK at 25 °C, `None` when unknown
    pub constant: Option<f64>,
    pub extrapolation: Extrapolation,
    /// highest valid temperature, °C
    pub t_max: f64,
    pub reactants: Vec<Reactant>,
    pub reference: String,
    pub comment: String,
    /// net proton count of the legacy text layout as it was read; only the
    /// consistency checker looks at it
    #[serde(default)]
    pub proton_count_field: Option<f64>,
}

impl Default for Complex {
    fn default() -> Self {
        let extrapolation = Extrapolation::default();
        Self {
            name: String::new(),
            constant: None,
            t_max: extrapolation.default_t_max(),
            extrapolation,
            reactants: Vec::new(),
            reference: String::new(),
            comment: String::new(),
            proton_count_field: None,
        }
    }
}

impl Complex {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// builder: appends one reactant
    pub fn with_reactant(mut self, name: &str, coef: f64) -> Self {
        self.reactants.push(Reactant::new(name, coef));
        self
    }

    /// builder: sets logK at 25 °C
    pub fn with_constant(mut self, log_k: f64) -> Self {
        self.constant = Some(log_k);
        self
    }

    /// builder: sets the extrapolation model and the matching default tMax
    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.t_max = extrapolation.default_t_max();
        self.extrapolation = extrapolation;
        self
    }

    pub fn is_analytic(&self) -> bool {
        self.extrapolation.is_analytic()
    }

    pub fn is_lookup(&self) -> bool {
        self.extrapolation.is_lookup()
    }

    pub fn is_exclusion_marker(&self) -> bool {
        self.name.starts_with('@')
    }

    /// 25 °C without enthalpy data, 100 with enthalpy, 200 with enthalpy and heat
    /// capacity, 600 for the analytic series and the lookup grid
    pub fn default_t_max(&self) -> f64 {
        self.extrapolation.default_t_max()
    }

    pub fn delta_h(&self) -> Option<f64> {
        self.extrapolation.delta_h(self.constant)
    }

    pub fn delta_cp(&self) -> Option<f64> {
        self.extrapolation.delta_cp(self.constant)
    }

    /// coefficient of a reactant (spelling-insensitive), summed over repeated entries
    pub fn coefficient_of(&self, name: &str) -> Option<f64> {
        let matching: Vec<f64> = self
            .reactants
            .iter()
            .filter(|r| names_equivalent(&r.name, name))
            .map(|r| r.coef)
            .collect();
        if matching.is_empty() {
            None
        } else {
            Some(matching.iter().sum())
        }
    }

    /// Charge of the product minus the charge carried by the reactants.
    /// Zero for a balanced reaction.
    pub fn check_charge_balance(&self) -> f64 {
        let name = self.name.trim_start_matches('@');
        let reactant_charge: f64 = self
            .reactants
            .iter()
            .filter(|r| !r.name.is_empty())
            .map(|r| r.coef * charge_of(&r.name) as f64)
            .sum();
        charge_of(name) as f64 - reactant_charge
    }

    ////////////////////////////////CANONICAL FORM////////////////////////////////

    /// Removes empty and zero reactants, sorts the rest by name and moves water,
    /// the electron and the proton (in this order of priority) to the front.
    pub fn sort_reactants(&mut self) -> &mut Self {
        self.reactants
            .retain(|r| !r.name.is_empty() && r.coef.abs() >= PRUNE_TOLERANCE);
        self.reactants.sort_by(|a, b| a.name.cmp(&b.name));
        let rank = |r: &Reactant| {
            if is_water(&r.name) {
                0
            } else if is_electron(&r.name) {
                1
            } else if is_proton(&r.name) {
                2
            } else {
                3
            }
        };
        // stable sort keeps the alphabetical order inside each rank
        self.reactants.sort_by_key(rank);
        self
    }

    /// reactants that take part in the reaction
    fn effective_reactants(&self) -> Vec<&Reactant> {
        self.reactants
            .iter()
            .filter(|r| !r.name.is_empty() && r.coef.abs() >= COEF_TOLERANCE)
            .collect()
    }

    /// same reactant multiset, order ignored, coefficients within 0.001
    fn same_reactants(&self, other: &Complex) -> bool {
        let mine = self.effective_reactants();
        let theirs = other.effective_reactants();
        if mine.len() != theirs.len() {
            return false;
        }
        let mut used = vec![false; theirs.len()];
        for r in mine {
            let found = (0..theirs.len()).find(|&i| {
                !used[i]
                    && names_equivalent(&r.name, &theirs[i].name)
                    && (r.coef - theirs[i].coef).abs() < COEF_TOLERANCE
            });
            match found {
                Some(i) => used[i] = true,
                None => return false,
            }
        }
        true
    }

    /// Equivalent names and the same reactant multiset; logK and the
    /// extrapolation model are ignored.
    pub fn same_name_and_stoichiometry(r1: &Complex, r2: &Complex) -> bool {
        names_equivalent(&r1.name, &r2.name) && r1.same_reactants(r2)
    }

    /// Deep equality with spelling-insensitive names and tolerant floats.
    pub fn is_equal_to(&self, other: &Complex) -> bool {
        names_equivalent(&self.name, &other.name)
            && option_close(self.constant, other.constant)
            && close(self.t_max, other.t_max)
            && extrapolations_close(&self.extrapolation, &other.extrapolation)
            && self.same_reactants(other)
            && self.reference == other.reference
            && self.comment == other.comment
    }

    /// Listing order: empty names first, then names without regard to case, then
    /// the canonical reaction text.
    pub fn compare_to(&self, other: &Complex) -> Ordering {
        match (self.name.is_empty(), other.name.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        self.name
            .to_lowercase()
            .cmp(&other.name.to_lowercase())
            .then_with(|| {
                let mut a = self.clone();
                let mut b = other.clone();
                a.sort_reactants();
                b.sort_reactants();
                a.reaction_text().cmp(&b.reaction_text())
            })
    }

    ////////////////////////////////RENDERING////////////////////////////////

    /// `"2 H2O + Fe+3 = Fe(OH)2+ + 2 H+"`: negative coefficients go to the product side,
    /// coefficient 1 is not written
    pub fn reaction_text(&self) -> String {
        let term = |r: &Reactant| {
            let c = r.coef.abs();
            if (c - 1.0).abs() < 1e-9 {
                r.name.clone()
            } else {
                format!("{} {}", c, r.name)
            }
        };
        let left: Vec<String> = self
            .reactants
            .iter()
            .filter(|r| !r.name.is_empty() && r.coef > 0.0)
            .map(term)
            .collect();
        let mut right = vec![self.name.clone()];
        right.extend(
            self.reactants
                .iter()
                .filter(|r| !r.name.is_empty() && r.coef < 0.0)
                .map(term),
        );
        format!("{} = {}", left.join(" + "), right.join(" + "))
    }

    /// reaction text followed by `; logK=X.XX (comment) [reference]` at (T, P)
    pub fn reaction_text_with_log_k(&self, t_c: f64, p_bar: f64) -> String {
        let mut text = format!(
            "{}; logK={:.2}",
            self.reaction_text(),
            self.log_k_at_t_and_p(t_c, p_bar)
        );
        if !self.comment.is_empty() {
            text.push_str(&format!(" ({})", self.comment));
        }
        if !self.reference.is_empty() {
            text.push_str(&format!(" [{}]", self.reference));
        }
        text
    }

    ////////////////////////////////EXTRAPOLATION////////////////////////////////

    /// logK on the liquid side of the saturation curve at `t_c` (°C).
    /// Returns the stored constant at 25 °C and NaN outside 0..min(tMax, 374) °C.
    pub fn log_k_at_tp_sat(&self, t_c: f64) -> f64 {
        if (t_c - 25.0).abs() < 0.001 {
            return match self.constant {
                Some(k) => k,
                None => self.extrapolation.log_k_sat(None, 25.0),
            };
        }
        if !t_c.is_finite() || t_c < 0.0 || t_c > self.t_max.min(374.0) {
            return f64::NAN;
        }
        let t_c = t_c.clamp(T_TRIPLE_C, T_CRITICAL_C);
        self.extrapolation.log_k_sat(self.constant, t_c)
    }

    /// logK at `t_c` (°C) and `p_bar` (bar). NaN where water is not liquid, in the
    /// low density region above the critical point, above tMax and, for records
    /// without a lookup grid, above 221 bar.
    pub fn log_k_at_t_and_p(&self, t_c: f64, p_bar: f64) -> f64 {
        if !t_c.is_finite() || !p_bar.is_finite() || t_c < 0.0 || t_c > self.t_max {
            return f64::NAN;
        }
        let t_c = t_c.max(T_TRIPLE_C);
        if is_water_liquid(t_c, p_bar).is_some() {
            return f64::NAN;
        }
        if t_c < T_CRITICAL_C {
            if let Ok(ps) = p_sat(t_c) {
                if p_bar <= ONE_ATM_WINDOW || (p_bar - ps).abs() <= SATURATION_WINDOW * ps {
                    return self.log_k_at_tp_sat(t_c);
                }
            }
        }
        if !self.is_lookup() && p_bar > MAX_P_NO_GRID {
            return f64::NAN;
        }
        if in_low_density_region(t_c, p_bar) {
            return f64::NAN;
        }
        self.extrapolation.log_k_tp(self.constant, t_c, p_bar)
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.constant {
            Some(k) => write!(f, "{}; logK={:.2}", self.reaction_text(), k),
            None => write!(f, "{}; logK=?", self.reaction_text()),
        }
    }
}

fn close(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || relative_eq!(a, b, epsilon = 1e-12, max_relative = FLOAT_TOLERANCE)
}

fn option_close(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => close(x, y),
        _ => false,
    }
}

fn extrapolations_close(a: &Extrapolation, b: &Extrapolation) -> bool {
    match (a, b) {
        (Extrapolation::DeltaHCp(x), Extrapolation::DeltaHCp(y)) => {
            option_close(x.delta_h, y.delta_h) && option_close(x.delta_cp, y.delta_cp)
        }
        (Extrapolation::Analytic(x), Extrapolation::Analytic(y)) => {
            x.a.iter().zip(y.a.iter()).all(|(p, q)| option_close(*p, *q))
        }
        (Extrapolation::LookUp(x), Extrapolation::LookUp(y)) => {
            x.grid.iter().zip(y.grid.iter()).all(|(p, q)| close(*p, *q))
        }
        _ => false,
    }
}
