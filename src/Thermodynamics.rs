/// temperature and pressure dependence of logK: enthalpy/heat capacity, analytic series, lookup grid
/// # Examples
/// ```
/// use ChemEqDB::Thermodynamics::logK_extrapolation::{delta_to_a, get_delta_cp, get_delta_h};
/// let a = delta_to_a(-9.5, Some(55.8), Some(-210.0));
/// assert!((get_delta_h(&a) - 55.8).abs() < 1e-6);
/// assert!((get_delta_cp(&a) + 210.0).abs() < 1e-6);
/// ```
#[allow(non_snake_case)]
pub mod logK_extrapolation;
/// tests
#[allow(non_snake_case)]
pub mod logK_extrapolation_tests;
/// interpolation over the logK lookup grid
pub mod lookup_interpolation;
/// IAPWS-95 equation of state of water: saturation, ice melting curves, density
/// # Examples
/// ```
/// use ChemEqDB::Thermodynamics::water_IAPWS95::{p_sat, rho};
/// let p = p_sat(100.0).unwrap();
/// assert!((p - 1.01418).abs() < 1e-3);
/// let density = rho(25.0, 1.0).unwrap();
/// assert!((density - 997.0).abs() < 0.5);
/// ```
#[allow(non_snake_case)]
pub mod water_IAPWS95;
