//! # Diagnostics of a consistency check
//!
//! Everything the checker finds goes into [`CheckReport`]. Findings are data, not
//! errors: the caller decides what to show and what to fix.
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    /// records read from the corpus, exclusion markers included
    pub records_read: usize,
    /// distinct reactant formulas of the element table
    pub known_reactant_count: usize,
    /// reactant -> number of records using it
    pub reactant_usage: BTreeMap<String, usize>,
    /// used in reactions but missing from the element table
    pub unknown_reactants: BTreeSet<String>,
    /// in the element table but never used
    pub unused_reactants: BTreeSet<String>,
    /// reactant spellings differing only by letter case, `"CO+2 / Co+2"`
    pub case_collisions_in_reactions: BTreeSet<String>,
    pub case_collisions_in_elements: BTreeSet<String>,
    /// a named reactant with zero coefficient or a coefficient without a name
    pub zero_coefficient: BTreeSet<String>,
    /// product -> charge imbalance
    pub charge_imbalance: BTreeMap<String, f64>,
    /// the net proton field disagrees with the H+ reactant
    pub proton_conflicts: BTreeSet<String>,
    /// one product name with different reactions
    pub dupl_reactions_dif_product: BTreeSet<String>,
    /// one product name repeated with the same reaction
    pub dupl_reactions_same_product: BTreeSet<String>,
    /// different product names with the same reactants, `"first | second"`
    pub dupl_products_same_reaction: BTreeSet<String>,
    /// solid name -> the polymorph it duplicates
    pub dupl_solids: BTreeMap<String, String>,
    /// product names that do not look like their reactants
    pub name_warnings: BTreeSet<String>,
    pub references_found: BTreeSet<String>,
    pub references_not_found: BTreeSet<String>,
}

impl CheckReport {
    /// true when no finding other than name warnings and unused reactants was made
    pub fn is_clean(&self) -> bool {
        self.unknown_reactants.is_empty()
            && self.case_collisions_in_reactions.is_empty()
            && self.case_collisions_in_elements.is_empty()
            && self.zero_coefficient.is_empty()
            && self.charge_imbalance.is_empty()
            && self.proton_conflicts.is_empty()
            && self.dupl_reactions_dif_product.is_empty()
            && self.dupl_reactions_same_product.is_empty()
            && self.dupl_products_same_reaction.is_empty()
            && self.dupl_solids.is_empty()
            && self.references_not_found.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("records read", self.records_read),
            ("known reactants", self.known_reactant_count),
            ("reactants used", self.reactant_usage.len()),
            ("unknown reactants", self.unknown_reactants.len()),
            ("unused reactants", self.unused_reactants.len()),
            ("case collisions (reactions)", self.case_collisions_in_reactions.len()),
            ("case collisions (elements)", self.case_collisions_in_elements.len()),
            ("zero coefficients", self.zero_coefficient.len()),
            ("charge imbalance", self.charge_imbalance.len()),
            ("H+ conflicts", self.proton_conflicts.len()),
            ("same product, different reactions", self.dupl_reactions_dif_product.len()),
            ("same product, same reaction", self.dupl_reactions_same_product.len()),
            ("different products, same reaction", self.dupl_products_same_reaction.len()),
            ("duplicate solids", self.dupl_solids.len()),
            ("name warnings", self.name_warnings.len()),
            ("references found", self.references_found.len()),
            ("references not found", self.references_not_found.len()),
        ]
    }

    /// one row per diagnostic with its count
    pub fn summary_table(&self) -> Table {
        let mut table = Table::new();
        table.add_row(Row::new(vec![Cell::new("diagnostic"), Cell::new("count")]));
        for (label, n) in self.counts() {
            table.add_row(Row::new(vec![Cell::new(label), Cell::new(&n.to_string())]));
        }
        table
    }

    fn list_table(title: &str, items: impl Iterator<Item = String>) -> Option<Table> {
        let mut table = Table::new();
        table.add_row(Row::new(vec![Cell::new(title)]));
        let mut any = false;
        for item in items {
            table.add_row(Row::new(vec![Cell::new(&item)]));
            any = true;
        }
        any.then_some(table)
    }

    /// detail tables of the non-empty diagnostics
    pub fn detail_tables(&self) -> Vec<Table> {
        let sets: Vec<(&str, &BTreeSet<String>)> = vec![
            ("unknown reactants", &self.unknown_reactants),
            ("unused reactants", &self.unused_reactants),
            ("case collisions (reactions)", &self.case_collisions_in_reactions),
            ("case collisions (elements)", &self.case_collisions_in_elements),
            ("zero coefficients", &self.zero_coefficient),
            ("H+ conflicts", &self.proton_conflicts),
            ("same product, different reactions", &self.dupl_reactions_dif_product),
            ("same product, same reaction", &self.dupl_reactions_same_product),
            ("different products, same reaction", &self.dupl_products_same_reaction),
            ("name warnings", &self.name_warnings),
            ("references not found", &self.references_not_found),
        ];
        let mut tables: Vec<Table> = sets
            .into_iter()
            .filter_map(|(title, set)| Self::list_table(title, set.iter().cloned()))
            .collect();
        tables.extend(Self::list_table(
            "charge imbalance",
            self.charge_imbalance
                .iter()
                .map(|(name, d)| format!("{}: {:+.3}", name, d)),
        ));
        tables.extend(Self::list_table(
            "duplicate solids",
            self.dupl_solids
                .iter()
                .map(|(dup, canonical)| format!("{} duplicates {}", dup, canonical)),
        ));
        tables
    }

    pub fn pretty_print(&self) {
        self.summary_table().printstd();
        for table in self.detail_tables() {
            table.printstd();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_clean() {
        let r = CheckReport::default();
        assert!(r.is_clean());
        assert!(r.detail_tables().is_empty());
        // header plus one row per diagnostic
        assert_eq!(r.summary_table().len(), 18);
    }

    #[test]
    fn test_findings_make_tables_and_json() {
        let mut r = CheckReport::default();
        r.records_read = 3;
        r.charge_imbalance.insert("FeOH+".to_string(), 1.0);
        r.name_warnings.insert("X: Y".to_string());
        assert!(!r.is_clean());
        assert_eq!(r.detail_tables().len(), 2);
        let json = r.to_json().unwrap();
        assert!(json.contains("\"FeOH+\": 1.0"));
        let back: CheckReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
        let text = r.summary_table().to_string();
        assert!(text.contains("charge imbalance"));
    }

    #[test]
    fn test_name_warnings_alone_keep_report_clean() {
        let mut r = CheckReport::default();
        r.name_warnings.insert("X: Y".to_string());
        r.unused_reactants.insert("Ca+2".to_string());
        assert!(r.is_clean());
    }
}
