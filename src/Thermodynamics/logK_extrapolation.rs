//! # Temperature dependence of logK
//!
//! ## Overview
//! A reaction record carries one of three models for logK(T, P):
//! - [`DeltaHCp`]: reaction enthalpy and heat capacity at 25 °C, converted to the
//!   analytic series on the fly by [`delta_to_a`];
//! - [`AnalyticSeries`]: `logK(T) = a0 + a1·T + a2/T + a3·log10(T) + a4/T² + a5·T²`;
//! - [`LookupGrid`]: logK values on a 5×14 (pressure × temperature) grid.
//!
//! The three are wrapped in the [`Extrapolation`] enum and dispatched through the
//! [`LogKModel`] trait with `enum_dispatch`, the same way thermodynamic data
//! formats are dispatched over one calculator interface. Domain checks (tMax,
//! water phase, saturation) live on the record, the models only evaluate.
use crate::Thermodynamics::lookup_interpolation::{interpolate_grid, interpolate_saturation_row};
use enum_dispatch::enum_dispatch;
use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};

/// reference temperature, K
pub const T0: f64 = 298.15;
/// gas constant, J/(mol·K)
pub const R: f64 = 8.3144598;
/// R·ln(10)
pub const RLN10: f64 = R * std::f64::consts::LN_10;

/// default tMax without enthalpy data, °C
pub const T_MAX_NO_DATA: f64 = 25.0;
/// default tMax with enthalpy only, °C
pub const T_MAX_ENTHALPY: f64 = 100.0;
/// default tMax with enthalpy and heat capacity, °C
pub const T_MAX_HEAT_CAPACITY: f64 = 200.0;
/// default tMax of the analytic series and the lookup grid, °C
pub const T_MAX_FULL: f64 = 600.0;

/// pressure levels of the lookup grid rows, bar; row 0 is the saturation curve
pub const GRID_PRESSURES: [f64; 5] = [f64::NAN, 500.0, 1000.0, 3000.0, 5000.0];
/// temperature nodes of the lookup grid columns, °C
pub const GRID_TEMPERATURES: [f64; 14] = [
    0.0, 25.0, 50.0, 100.0, 150.0, 200.0, 250.0, 300.0, 350.0, 400.0, 450.0, 500.0, 550.0, 600.0,
];

pub type LogKGrid = SMatrix<f64, 5, 14>;

#[enum_dispatch]
pub trait LogKModel {
    /// logK along the saturation curve at `t_c` (°C); `log_k25` is the stored constant
    fn log_k_sat(&self, log_k25: Option<f64>, t_c: f64) -> f64;
    /// logK at `t_c` (°C) and `p_bar` (bar)
    fn log_k_tp(&self, log_k25: Option<f64>, t_c: f64, p_bar: f64) -> f64;
    /// reaction enthalpy at 25 °C, kJ/mol
    fn delta_h(&self, log_k25: Option<f64>) -> Option<f64>;
    /// reaction heat capacity at 25 °C, J/(mol·K)
    fn delta_cp(&self, log_k25: Option<f64>) -> Option<f64>;
    /// highest temperature the model is trusted to, °C
    fn default_t_max(&self) -> f64;
}

#[enum_dispatch(LogKModel)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Extrapolation {
    DeltaHCp(DeltaHCp),
    Analytic(AnalyticSeries),
    LookUp(LookupGrid),
}

impl Default for Extrapolation {
    fn default() -> Self {
        Extrapolation::DeltaHCp(DeltaHCp::default())
    }
}

impl Extrapolation {
    pub fn delta_h_cp(delta_h: Option<f64>, delta_cp: Option<f64>) -> Self {
        Extrapolation::DeltaHCp(DeltaHCp { delta_h, delta_cp })
    }

    pub fn analytic(a: [Option<f64>; 6]) -> Self {
        Extrapolation::Analytic(AnalyticSeries { a })
    }

    pub fn lookup(grid: LogKGrid) -> Self {
        Extrapolation::LookUp(LookupGrid { grid })
    }

    pub fn is_analytic(&self) -> bool {
        matches!(self, Extrapolation::Analytic(_))
    }

    pub fn is_lookup(&self) -> bool {
        matches!(self, Extrapolation::LookUp(_))
    }

    /// Coefficients of the analytic series equivalent to this model, if one exists.
    /// The lookup grid has no closed form.
    pub fn analytic_coefficients(&self, log_k25: Option<f64>) -> Option<[Option<f64>; 6]> {
        match self {
            Extrapolation::DeltaHCp(d) => {
                log_k25.map(|k| delta_to_a(k, d.delta_h, d.delta_cp))
            }
            Extrapolation::Analytic(s) => Some(s.a),
            Extrapolation::LookUp(_) => None,
        }
    }
}

////////////////////////////////ENTHALPY AND HEAT CAPACITY////////////////////////////////
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaHCp {
    /// kJ/mol
    pub delta_h: Option<f64>,
    /// J/(mol·K)
    pub delta_cp: Option<f64>,
}

impl LogKModel for DeltaHCp {
    fn log_k_sat(&self, log_k25: Option<f64>, t_c: f64) -> f64 {
        match log_k25 {
            Some(k) => evaluate_series(&delta_to_a(k, self.delta_h, self.delta_cp), t_c + 273.15),
            None => f64::NAN,
        }
    }

    fn log_k_tp(&self, log_k25: Option<f64>, t_c: f64, _p_bar: f64) -> f64 {
        self.log_k_sat(log_k25, t_c)
    }

    fn delta_h(&self, _log_k25: Option<f64>) -> Option<f64> {
        self.delta_h
    }

    fn delta_cp(&self, _log_k25: Option<f64>) -> Option<f64> {
        self.delta_cp
    }

    fn default_t_max(&self) -> f64 {
        match (self.delta_h, self.delta_cp) {
            (Some(_), Some(_)) => T_MAX_HEAT_CAPACITY,
            (Some(_), None) => T_MAX_ENTHALPY,
            _ => T_MAX_NO_DATA,
        }
    }
}

////////////////////////////////ANALYTIC SERIES////////////////////////////////
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticSeries {
    /// unset coefficients count as zero
    pub a: [Option<f64>; 6],
}

impl LogKModel for AnalyticSeries {
    fn log_k_sat(&self, _log_k25: Option<f64>, t_c: f64) -> f64 {
        if self.a.iter().all(Option::is_none) {
            return f64::NAN;
        }
        evaluate_series(&self.a, t_c + 273.15)
    }

    fn log_k_tp(&self, log_k25: Option<f64>, t_c: f64, _p_bar: f64) -> f64 {
        self.log_k_sat(log_k25, t_c)
    }

    fn delta_h(&self, _log_k25: Option<f64>) -> Option<f64> {
        if self.a.iter().all(Option::is_none) {
            return None;
        }
        Some(get_delta_h(&self.a))
    }

    fn delta_cp(&self, _log_k25: Option<f64>) -> Option<f64> {
        if self.a.iter().all(Option::is_none) {
            return None;
        }
        Some(get_delta_cp(&self.a))
    }

    fn default_t_max(&self) -> f64 {
        T_MAX_FULL
    }
}

////////////////////////////////LOOKUP GRID////////////////////////////////
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupGrid {
    /// rows: saturation, 500, 1000, 3000, 5000 bar; columns: [`GRID_TEMPERATURES`]
    pub grid: LogKGrid,
}

impl Default for LookupGrid {
    fn default() -> Self {
        Self {
            grid: LogKGrid::from_element(f64::NAN),
        }
    }
}

impl LookupGrid {
    /// slope of the saturation row at 25 °C from the 0 and 50 °C nodes, per K
    fn slope_at_25(&self) -> Option<f64> {
        let s = (self.grid[(0, 2)] - self.grid[(0, 0)]) / 50.0;
        s.is_finite().then_some(s)
    }
}

impl LogKModel for LookupGrid {
    fn log_k_sat(&self, _log_k25: Option<f64>, t_c: f64) -> f64 {
        interpolate_saturation_row(&self.grid, t_c)
    }

    fn log_k_tp(&self, _log_k25: Option<f64>, t_c: f64, p_bar: f64) -> f64 {
        interpolate_grid(&self.grid, t_c, p_bar)
    }

    fn delta_h(&self, _log_k25: Option<f64>) -> Option<f64> {
        self.slope_at_25().map(|s| RLN10 * T0 * T0 * s / 1000.0)
    }

    fn delta_cp(&self, _log_k25: Option<f64>) -> Option<f64> {
        // d(T²·dlogK/dT)/dT between the 12.5 and 37.5 °C midpoints
        let g = &self.grid;
        let t1 = 12.5 + 273.15;
        let t2 = 37.5 + 273.15;
        let s1 = (g[(0, 1)] - g[(0, 0)]) / 25.0;
        let s2 = (g[(0, 2)] - g[(0, 1)]) / 25.0;
        let cp = RLN10 * (t2 * t2 * s2 - t1 * t1 * s1) / 25.0;
        cp.is_finite().then_some(cp)
    }

    fn default_t_max(&self) -> f64 {
        T_MAX_FULL
    }
}

////////////////////////////////CONVERSIONS////////////////////////////////

/// `logK(T) = a0 + a1·T + a2/T + a3·log10(T) + a4/T² + a5·T²`, T in K
pub fn evaluate_series(a: &[Option<f64>; 6], t_k: f64) -> f64 {
    let c = |i: usize| a[i].unwrap_or(0.0);
    c(0) + c(1) * t_k + c(2) / t_k + c(3) * t_k.log10() + c(4) / (t_k * t_k) + c(5) * t_k * t_k
}

/// Analytic coefficients equivalent to logK0 at 25 °C with a constant heat
/// capacity of reaction. Without enthalpy only `a0` is set, without heat
/// capacity `a3` stays unset.
pub fn delta_to_a(log_k0: f64, delta_h: Option<f64>, delta_cp: Option<f64>) -> [Option<f64>; 6] {
    let mut a = [None; 6];
    a[0] = Some(log_k0);
    let Some(dh) = delta_h else {
        return a;
    };
    let mut a0 = log_k0 + dh * 1000.0 / (RLN10 * T0);
    let mut a2 = -dh * 1000.0 / RLN10;
    if let Some(dcp) = delta_cp {
        a0 -= dcp * (1.0 + T0.ln()) / RLN10;
        a2 += dcp * T0 / RLN10;
        a[3] = Some(dcp / R);
    }
    a[0] = Some(a0);
    a[2] = Some(a2);
    a
}

/// dlogK/dT of the series, T in K
fn series_slope(a: &[Option<f64>; 6], t_k: f64) -> f64 {
    let c = |i: usize| a[i].unwrap_or(0.0);
    c(1) - c(2) / (t_k * t_k) + c(3) / (t_k * std::f64::consts::LN_10)
        - 2.0 * c(4) / (t_k * t_k * t_k)
        + 2.0 * c(5) * t_k
}

/// reaction enthalpy at 25 °C in kJ/mol from analytic coefficients (van 't Hoff)
pub fn get_delta_h(a: &[Option<f64>; 6]) -> f64 {
    RLN10 * T0 * T0 * series_slope(a, T0) / 1000.0
}

/// reaction heat capacity at 25 °C in J/(mol·K) from analytic coefficients
pub fn get_delta_cp(a: &[Option<f64>; 6]) -> f64 {
    let c = |i: usize| a[i].unwrap_or(0.0);
    RLN10
        * (2.0 * c(1) * T0
            + c(3) / std::f64::consts::LN_10
            + 2.0 * c(4) / (T0 * T0)
            + 6.0 * c(5) * T0 * T0)
}

////////////////////////////////LOW DENSITY REGION////////////////////////////////
/// (T °C, lowest pressure in bar) below which the fluid is too expanded for the
/// models, starting at the critical point
const LOW_DENSITY_BAND: [(f64, f64); 8] = [
    (373.946, 220.64),
    (380.0, 235.0),
    (390.0, 262.0),
    (400.0, 290.0),
    (450.0, 430.0),
    (500.0, 560.0),
    (550.0, 700.0),
    (600.0, 840.0),
];

/// true above the critical temperature when the pressure is below the band
pub fn in_low_density_region(t_c: f64, p_bar: f64) -> bool {
    let (t_first, _) = LOW_DENSITY_BAND[0];
    if t_c <= t_first {
        return false;
    }
    let p_min = LOW_DENSITY_BAND
        .windows(2)
        .find(|w| t_c <= w[1].0)
        .map(|w| {
            let (t1, p1) = w[0];
            let (t2, p2) = w[1];
            p1 + (p2 - p1) * (t_c - t1) / (t2 - t1)
        })
        .unwrap_or(LOW_DENSITY_BAND[LOW_DENSITY_BAND.len() - 1].1);
    p_bar < p_min
}
