//! Does a product name look like it was made from its reactants?
//!
//! `Fe+2 + H2O = FeOH+ + H+` is fine because `FeOH` contains `Fe`. Oxo-anions and
//! protonated forms are renamed when they react (`HCO3-` becomes `CaCO3`,
//! `NH4+` becomes `NH3`), so for those reactants the product only has to contain
//! the fragment listed below. A miss is a hint, not an error.
use crate::Database::species_names::{is_electron, is_proton, is_water, name_without_charge, normalize_name};

/// reactant (without charge) -> fragment the product must contain
pub const NAME_EXCEPTIONS: &[(&str, &str)] = &[
    ("NH4", "NH"),
    ("NH3", "N"),
    ("NO3", "N"),
    ("NO2", "N"),
    ("CO3", "C"),
    ("HCO3", "C"),
    ("CO2", "C"),
    ("H2CO3", "C"),
    ("CH4", "C"),
    ("HS", "S"),
    ("H2S", "S"),
    ("SO4", "S"),
    ("HSO4", "S"),
    ("SO3", "S"),
    ("S2O3", "S"),
    ("PO4", "P"),
    ("HPO4", "P"),
    ("H2PO4", "P"),
    ("H3PO4", "P"),
    ("H4SiO4", "Si"),
    ("H3SiO4", "Si"),
    ("SiO2", "Si"),
    ("H3BO3", "B"),
    ("B(OH)4", "B"),
    ("H3AsO3", "As"),
    ("H2AsO4", "As"),
    ("HAsO4", "As"),
    ("AsO4", "As"),
    ("HSe", "Se"),
    ("SeO3", "Se"),
    ("SeO4", "Se"),
    ("MoO4", "Mo"),
    ("WO4", "W"),
    ("CrO4", "Cr"),
    ("MnO4", "Mn"),
    ("TcO4", "Tc"),
    ("ReO4", "Re"),
    ("VO2", "V"),
    ("UO2", "U"),
    ("NpO2", "Np"),
    ("PuO2", "Pu"),
    ("IO3", "I"),
    ("BrO3", "Br"),
    ("ClO4", "Cl"),
    ("OH", "O"),
    ("O2", "O"),
    ("H2O2", "O"),
    ("Al(OH)4", "Al"),
];

fn base(name: &str) -> String {
    name_without_charge(&normalize_name(name))
}

/// True when `product` contains `reactant` (charge and `(aq)` removed) or the
/// fragment its exception entry asks for. Water, the electron and the proton
/// always pass.
pub fn product_resembles_reactant(product: &str, reactant: &str) -> bool {
    if is_water(reactant) || is_electron(reactant) || is_proton(reactant) {
        return true;
    }
    let product = base(product);
    let reactant = base(reactant);
    if reactant.is_empty() || product.contains(&reactant) {
        return true;
    }
    NAME_EXCEPTIONS
        .iter()
        .find(|(r, _)| *r == reactant)
        .is_some_and(|(_, fragment)| product.contains(fragment))
}
