/// splitting of delimited lines with the `'`/`"` quoting dialect of the database files
/// # Examples
/// ```
/// use ChemEqDB::Database::tokenizer::split_line;
/// let fields = split_line("a,\"b,c\";d").unwrap();
/// assert_eq!(fields, vec!["a", "b,c", "d"]);
/// ```
pub mod tokenizer;
/// charges, spelling variants and polymorph suffixes of species names
pub mod species_names;
/// the reaction record: reactants, logK and its temperature/pressure model
/// # Examples
/// ```
/// use ChemEqDB::Database::Complex::Complex;
/// let mut c = Complex::new("FeOH+")
///     .with_constant(-9.5)
///     .with_reactant("Fe+2", 1.0)
///     .with_reactant("H2O", 1.0)
///     .with_reactant("H+", -1.0);
/// c.sort_reactants();
/// assert_eq!(c.reaction_text(), "H2O + Fe+2 = FeOH+ + H+");
/// assert!(c.check_charge_balance().abs() < 1e-9);
/// assert_eq!(c.log_k_at_tp_sat(25.0), -9.5);
/// ```
#[allow(non_snake_case)]
pub mod Complex;
/// errors of the codecs and of file access
pub mod db_errors;
/// one-line (six for lookup records) text encoding
pub mod complex_text;
/// length-prefixed binary encoding
pub mod complex_binary;
/// record iteration across an ordered list of text and binary files
pub mod db_iterator;
/// append, replace, delete and conversion of database files
pub mod db_edit;
/// element/reactant association table
pub mod elements;
/// citation keys
pub mod references;
