//! # Consistency checker
//!
//! Reads a whole corpus once and collects the diagnostics of [`CheckReport`]:
//! reactant usage against the element table, zero coefficients, charge balance,
//! H+ field conflicts, duplicate products, reactions and solids, suspicious
//! product names and unknown citation keys. The corpus is never modified.
//!
//! A record named `@X` removes the records of `X` read before it, so a later
//! file can override an earlier one without being reported as a duplicate.
use crate::Checker::check_report::CheckReport;
use crate::Checker::name_heuristics::product_resembles_reactant;
use crate::Database::Complex::{COEF_TOLERANCE, Complex};
use crate::Database::db_errors::DbError;
use crate::Database::db_iterator::DatabaseIterator;
use crate::Database::elements::{ElementTable, element_file_for, is_binary_element_file};
use crate::Database::references::{ReferenceStore, citation_key, split_refs};
use crate::Database::species_names::{
    PROTON, is_electron, is_proton, is_water, names_equivalent, normalize_name, solid_polymorph,
};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

/// allowed charge imbalance
pub const CHARGE_TOLERANCE: f64 = 0.001;

/// Reactant multiset as a string: normalized names in order, coefficients to 3 decimals.
fn reaction_key(c: &Complex) -> String {
    let mut terms: Vec<String> = c
        .reactants
        .iter()
        .filter(|r| !r.name.is_empty() && r.coef.abs() >= COEF_TOLERANCE)
        .map(|r| format!("{}*{:.3}", normalize_name(&r.name), r.coef))
        .collect();
    terms.sort();
    terms.join("|")
}

/// spellings that collide when letter case is ignored, `"CO+2 / Co+2"`
fn case_collisions<'a>(names: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    let mut groups: HashMap<String, BTreeSet<String>> = HashMap::new();
    for name in names {
        let normalized = normalize_name(name);
        groups
            .entry(normalized.to_lowercase())
            .or_default()
            .insert(normalized);
    }
    groups
        .into_values()
        .filter(|spellings| spellings.len() > 1)
        .map(|spellings| spellings.into_iter().collect::<Vec<_>>().join(" / "))
        .collect()
}

/// Accumulates diagnostics record by record; [`finish`](Self::finish) adds the
/// checks that need the whole corpus.
pub struct ConsistencyChecker<'a> {
    elements: Option<&'a ElementTable>,
    references: Option<&'a dyn ReferenceStore>,
    report: CheckReport,
    /// records still in force, `None` once excluded by an `@` record
    records: Vec<Option<Complex>>,
    by_product: HashMap<String, Vec<usize>>,
    by_reaction: HashMap<String, Vec<usize>>,
    /// solid base name -> (index, polymorph suffix)
    by_solid: HashMap<String, Vec<(usize, String)>>,
    /// normalized reactant -> spelling first seen
    used: BTreeMap<String, String>,
}

impl<'a> ConsistencyChecker<'a> {
    pub fn new(
        elements: Option<&'a ElementTable>,
        references: Option<&'a dyn ReferenceStore>,
    ) -> Self {
        Self {
            elements,
            references,
            report: CheckReport::default(),
            records: Vec::new(),
            by_product: HashMap::new(),
            by_reaction: HashMap::new(),
            by_solid: HashMap::new(),
            used: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, c: &Complex) {
        self.report.records_read += 1;
        if let Some(target) = c.name.strip_prefix('@') {
            self.exclude(target);
            return;
        }
        self.check_reactants(c);
        self.check_charge(c);
        self.check_protons(c);
        self.check_references(c);
        self.index_duplicates(c);
    }

    fn exclude(&mut self, target: &str) {
        let key = normalize_name(target);
        let Some(indices) = self.by_product.remove(&key) else {
            debug!("exclusion of unknown species {}", target);
            return;
        };
        for i in indices {
            self.records[i] = None;
        }
        debug!("{} excluded", target);
    }

    fn check_reactants(&mut self, c: &Complex) {
        for r in &c.reactants {
            let named = !r.name.trim().is_empty();
            let zero = r.coef.abs() < COEF_TOLERANCE;
            if named == zero {
                self.report.zero_coefficient.insert(c.name.clone());
            }
            if !named || zero {
                continue;
            }
            let normalized = normalize_name(&r.name);
            *self.report.reactant_usage.entry(normalized.clone()).or_insert(0) += 1;
            self.used.entry(normalized).or_insert_with(|| r.name.clone());
            if let Some(table) = self.elements {
                if !table.is_known(&r.name) {
                    self.report.unknown_reactants.insert(r.name.clone());
                }
            }
            if r.coef > 0.0 && !product_resembles_reactant(&c.name, &r.name) {
                self.report
                    .name_warnings
                    .insert(format!("{}: {}", c.name, r.name));
            }
        }
    }

    fn check_charge(&mut self, c: &Complex) {
        let imbalance = c.check_charge_balance();
        if imbalance.abs() > CHARGE_TOLERANCE {
            self.report.charge_imbalance.insert(c.name.clone(), imbalance);
        }
    }

    fn check_protons(&mut self, c: &Complex) {
        let Some(n_h) = c.proton_count_field else {
            return;
        };
        let listed = c.coefficient_of(PROTON).unwrap_or(0.0);
        if (n_h - listed).abs() > COEF_TOLERANCE {
            warn!(
                "{}: net proton field {} but H+ coefficient {}",
                c.name, n_h, listed
            );
            self.report.proton_conflicts.insert(c.name.clone());
        }
    }

    fn check_references(&mut self, c: &Complex) {
        let Some(store) = self.references else {
            return;
        };
        // reported verbatim, looked up without annotations
        for key in split_refs(&c.reference) {
            if store.is_known(&key) || store.is_known(&citation_key(&key)) {
                self.report.references_found.insert(key);
            } else {
                self.report.references_not_found.insert(key);
            }
        }
    }

    fn live(&self, indices: Option<&Vec<usize>>) -> Vec<usize> {
        indices
            .map(|v| {
                v.iter()
                    .copied()
                    .filter(|&i| self.records[i].is_some())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn index_duplicates(&mut self, c: &Complex) {
        let index = self.records.len();
        let product_key = normalize_name(&c.name);
        for i in self.live(self.by_product.get(&product_key)) {
            let Some(earlier) = &self.records[i] else { continue };
            if Complex::same_name_and_stoichiometry(earlier, c) {
                self.report.dupl_reactions_same_product.insert(c.name.clone());
            } else {
                self.report.dupl_reactions_dif_product.insert(c.name.clone());
            }
        }

        let reaction = reaction_key(c);
        if !reaction.is_empty() {
            for i in self.live(self.by_reaction.get(&reaction)) {
                let Some(earlier) = &self.records[i] else { continue };
                if !names_equivalent(&earlier.name, &c.name) {
                    self.report
                        .dupl_products_same_reaction
                        .insert(format!("{} | {}", earlier.name, c.name));
                }
            }
            self.by_reaction.entry(reaction).or_default().push(index);
        }

        if let Some((base, suffix)) = solid_polymorph(&c.name) {
            let group = self.by_solid.entry(base).or_default();
            for (i, earlier_suffix) in group.iter() {
                let Some(earlier) = &self.records[*i] else { continue };
                if *earlier_suffix == suffix {
                    continue;
                }
                // amorphous phases are never the canonical name
                let (dup, canonical) = if earlier_suffix == "am" && suffix != "am" {
                    (earlier.name.clone(), c.name.clone())
                } else {
                    (c.name.clone(), earlier.name.clone())
                };
                self.report.dupl_solids.insert(dup, canonical);
            }
            group.push((index, suffix));
        }

        self.by_product.entry(product_key).or_default().push(index);
        self.records.push(Some(c.clone()));
    }

    /// Adds the corpus-wide checks and returns the report.
    pub fn finish(mut self) -> CheckReport {
        self.report.case_collisions_in_reactions =
            case_collisions(self.used.values().map(String::as_str));
        if let Some(table) = self.elements {
            let known = table.known_reactants();
            self.report.known_reactant_count = known.len();
            self.report.case_collisions_in_elements =
                case_collisions(known.iter().map(String::as_str));
            self.report.unused_reactants = known
                .into_iter()
                .filter(|k| {
                    !(is_water(k) || is_electron(k) || is_proton(k))
                        && !self.used.contains_key(&normalize_name(k))
                })
                .collect();
        }
        info!(
            "checked {} records: {} charge imbalanced, {} duplicate products, {} unknown reactants",
            self.report.records_read,
            self.report.charge_imbalance.len(),
            self.report.dupl_reactions_dif_product.len() + self.report.dupl_reactions_same_product.len(),
            self.report.unknown_reactants.len()
        );
        self.report
    }
}

/// checks records already in memory
pub fn check_records(
    records: &[Complex],
    elements: Option<&ElementTable>,
    references: Option<&dyn ReferenceStore>,
) -> CheckReport {
    let mut checker = ConsistencyChecker::new(elements, references);
    for c in records {
        checker.add(c);
    }
    checker.finish()
}

/// Checks a corpus of database files. The first read error aborts the check.
pub fn check_corpus<P: AsRef<Path>>(
    files: &[P],
    elements: Option<&ElementTable>,
    references: Option<&dyn ReferenceStore>,
) -> Result<CheckReport, DbError> {
    let mut checker = ConsistencyChecker::new(elements, references);
    for record in DatabaseIterator::new(files) {
        checker.add(&record?);
    }
    Ok(checker.finish())
}

/// Reads the element files sitting next to the databases (`x.db` -> `x.elb`,
/// otherwise `x.elt`) into one table, in corpus order, so that `@` removals of a
/// later text file apply to earlier files. `None` when there is none.
pub fn sibling_element_table<P: AsRef<Path>>(files: &[P]) -> Result<Option<ElementTable>, DbError> {
    let mut table: Option<ElementTable> = None;
    for f in files {
        let path = element_file_for(f.as_ref());
        if !path.exists() {
            continue;
        }
        let target = table.get_or_insert_with(ElementTable::new);
        if is_binary_element_file(&path) {
            target.merge(&ElementTable::from_binary_file(&path)?);
        } else {
            let name = path.display().to_string();
            let content = fs::read_to_string(&path).map_err(|e| DbError::io(&name, e))?;
            target.apply_text(&content, &name)?;
        }
        info!("element table {} loaded", path.display());
    }
    Ok(table)
}
