/// diagnostics collected over a database corpus
pub mod check_report;
/// the corpus scan: usage, charge balance, duplicates, references
/// # Examples
/// ```
/// use ChemEqDB::Checker::consistency_checker::check_records;
/// use ChemEqDB::Database::Complex::Complex;
/// let unbalanced = Complex::new("FeOH+")
///     .with_reactant("Fe+2", 1.0)
///     .with_reactant("H2O", 1.0);
/// let report = check_records(&[unbalanced], None, None);
/// assert!(report.charge_imbalance.contains_key("FeOH+"));
/// ```
pub mod consistency_checker;
/// product names against their reactants
pub mod name_heuristics;
