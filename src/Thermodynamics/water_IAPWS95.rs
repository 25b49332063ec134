//! # Water equation of state (IAPWS-95)
//!
//! ## Overview
//! Pure numeric functions for liquid water used to validate the (T, P) points at
//! which equilibrium constants are extrapolated:
//! - [`p_sat`], [`rho_sat`]: auxiliary saturation correlations of Wagner and Pruß
//!   (J. Phys. Chem. Ref. Data 31 (2002), eqs. 2.5 and 2.6);
//! - [`water_phase`], [`is_water_liquid`]: partition of the (T, P) plane into
//!   steam, ices Ih, III, V, VI, VII and liquid/supercritical fluid, using the
//!   saturation curve and the IAPWS R14-08 melting and sublimation curves;
//! - [`p4rho_t`]: pressure from density and temperature through the derivative of
//!   the residual Helmholtz energy (56 terms);
//! - [`rho`]: density from temperature and pressure, the inverse of `p4rho_t`,
//!   found by bracketing a sign change and refining it with a chord iteration.
//!
//! Temperatures are in °C, pressures in bar unless the name says otherwise.
//! None of the functions keep state, they can be called from any thread.
use std::fmt;
use thiserror::Error;

/// triple point temperature, °C
pub const T_TRIPLE_C: f64 = 0.01;
/// critical temperature, °C
pub const T_CRITICAL_C: f64 = 373.946;
/// critical temperature, K
pub const TC_K: f64 = 647.096;
/// critical density, kg/m³
pub const RHOC: f64 = 322.0;
/// critical pressure, MPa
pub const PC_MPA: f64 = 22.064;
/// specific gas constant of water, kJ/(kg·K)
const R_W: f64 = 0.46151805;
const MAX_ITERATIONS: usize = 200;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WaterError {
    #[error("outside the valid range: {0}")]
    Domain(String),
    #[error(
        "water density did not converge in {iterations} iterations at t = {t_c} °C, p = {p_bar} bar"
    )]
    Convergence {
        iterations: usize,
        t_c: f64,
        p_bar: f64,
    },
}

/// Stable phase of pure water at a (T, P) point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaterPhase {
    /// liquid or supercritical fluid
    Liquid,
    Steam,
    IceIh,
    IceIII,
    IceV,
    IceVI,
    IceVII,
}

impl fmt::Display for WaterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WaterPhase::Liquid => "liquid",
            WaterPhase::Steam => "steam",
            WaterPhase::IceIh => "ice Ih",
            WaterPhase::IceIII => "ice III",
            WaterPhase::IceV => "ice V",
            WaterPhase::IceVI => "ice VI",
            WaterPhase::IceVII => "ice VII",
        };
        write!(f, "{}", s)
    }
}

////////////////////////////////SATURATION CURVE////////////////////////////////

fn p_sat_mpa(t_k: f64) -> f64 {
    const A: [f64; 6] = [
        -7.85951783,
        1.84408259,
        -11.7866497,
        22.6807411,
        -15.9618719,
        1.80122502,
    ];
    let th = 1.0 - t_k / TC_K;
    let sum = A[0] * th
        + A[1] * th.powf(1.5)
        + A[2] * th.powi(3)
        + A[3] * th.powf(3.5)
        + A[4] * th.powi(4)
        + A[5] * th.powf(7.5);
    PC_MPA * (TC_K / t_k * sum).exp()
}

/// Vapour pressure of water in bar, valid for 0.01 <= t < 373.946 °C
pub fn p_sat(t_c: f64) -> Result<f64, WaterError> {
    if !(T_TRIPLE_C..T_CRITICAL_C).contains(&t_c) {
        return Err(WaterError::Domain(format!(
            "pSat needs {} <= t < {} °C, got {}",
            T_TRIPLE_C, T_CRITICAL_C, t_c
        )));
    }
    Ok(p_sat_mpa(t_c + 273.15) * 10.0)
}

/// Density of saturated liquid water in g/cm³, valid for 0.01 <= t <= 373.946 °C
pub fn rho_sat(t_c: f64) -> Result<f64, WaterError> {
    if !(T_TRIPLE_C..=T_CRITICAL_C).contains(&t_c) {
        return Err(WaterError::Domain(format!(
            "rhoSat needs {} <= t <= {} °C, got {}",
            T_TRIPLE_C, T_CRITICAL_C, t_c
        )));
    }
    const B: [f64; 6] = [
        1.99274064,
        1.09965342,
        -0.510839303,
        -1.75493479,
        -45.5170352,
        -6.74694450e5,
    ];
    let th = (1.0 - (t_c + 273.15) / TC_K).max(0.0);
    let ratio = 1.0
        + B[0] * th.powf(1.0 / 3.0)
        + B[1] * th.powf(2.0 / 3.0)
        + B[2] * th.powf(5.0 / 3.0)
        + B[3] * th.powf(16.0 / 3.0)
        + B[4] * th.powf(43.0 / 3.0)
        + B[5] * th.powf(110.0 / 3.0);
    Ok(ratio * RHOC / 1000.0)
}

/// Boiling temperature (°C) at a pressure in bar, inverse of [`p_sat`] by bisection
pub fn t_sat(p_bar: f64) -> Result<f64, WaterError> {
    let p_min = p_sat_mpa(T_TRIPLE_C + 273.15) * 10.0;
    let p_max = PC_MPA * 10.0;
    if !(p_min..p_max).contains(&p_bar) {
        return Err(WaterError::Domain(format!(
            "tSat needs {:.6} <= p < {} bar, got {}",
            p_min, p_max, p_bar
        )));
    }
    let (mut lo, mut hi) = (T_TRIPLE_C, T_CRITICAL_C);
    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        if p_sat_mpa(mid + 273.15) * 10.0 < p_bar {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-9 {
            break;
        }
    }
    Ok(0.5 * (lo + hi))
}

////////////////////////////////MELTING AND SUBLIMATION CURVES (IAPWS R14-08)////////////////////////////////
/// sublimation pressure of ice Ih in MPa, 50 <= T <= 273.16 K
pub fn p_subl_ice_ih(t_k: f64) -> f64 {
    const A: [f64; 3] = [-0.212144006e2, 0.273203819e2, -0.610598130e1];
    const B: [f64; 3] = [0.333333333e-2, 0.120666667e1, 0.170333333e1];
    let th = t_k / 273.16;
    let sum: f64 = A.iter().zip(B.iter()).map(|(a, b)| a * th.powf(*b)).sum();
    611.657e-6 * (sum / th).exp()
}

/// melting pressure of ice Ih in MPa, 251.165 <= T <= 273.16 K
pub fn p_melt_ice_ih(t_k: f64) -> f64 {
    const A: [f64; 3] = [0.119539337e7, 0.808183159e5, 0.333826860e4];
    const B: [f64; 3] = [0.300000e1, 0.257500e2, 0.103750e3];
    let th = t_k / 273.16;
    let sum: f64 = A
        .iter()
        .zip(B.iter())
        .map(|(a, b)| a * (1.0 - th.powf(*b)))
        .sum();
    611.657e-6 * (1.0 + sum)
}

/// melting pressure of ice III in MPa, 251.165 <= T <= 256.164 K
pub fn p_melt_ice_iii(t_k: f64) -> f64 {
    let th = t_k / 251.165;
    208.566 * (1.0 - 0.299948 * (1.0 - th.powi(60)))
}

/// melting pressure of ice V in MPa, 256.164 <= T <= 273.31 K
pub fn p_melt_ice_v(t_k: f64) -> f64 {
    let th = t_k / 256.164;
    350.100 * (1.0 - 1.18721 * (1.0 - th.powi(8)))
}

/// melting pressure of ice VI in MPa, 273.31 <= T <= 355 K
pub fn p_melt_ice_vi(t_k: f64) -> f64 {
    let th = t_k / 273.31;
    632.400 * (1.0 - 1.07476 * (1.0 - th.powf(4.6)))
}

/// melting pressure of ice VII in MPa, 355 <= T <= 715 K
pub fn p_melt_ice_vii(t_k: f64) -> f64 {
    let th = t_k / 355.0;
    let ln_p = 1.73683 * (1.0 - 1.0 / th) - 0.544606e-1 * (1.0 - th.powi(5))
        + 0.806106e-7 * (1.0 - th.powi(22));
    2216.0 * ln_p.exp()
}

/// Which phase of pure water is stable at `t_c` (°C) and `p_bar` (bar)
pub fn water_phase(t_c: f64, p_bar: f64) -> WaterPhase {
    let t = t_c + 273.15;
    let p = p_bar / 10.0;
    if p <= 0.0 || (t < 273.16 && p < p_subl_ice_ih(t)) {
        return WaterPhase::Steam;
    }
    if t < 251.165 {
        return if p < 208.566 {
            WaterPhase::IceIh
        } else {
            WaterPhase::IceIII
        };
    }
    if t < 273.16 && p < p_melt_ice_ih(t) {
        return WaterPhase::IceIh;
    }
    if t <= 256.164 {
        if p > p_melt_ice_iii(t) {
            return WaterPhase::IceIII;
        }
    } else if t <= 273.31 {
        if p > p_melt_ice_v(t) {
            return WaterPhase::IceV;
        }
    } else if t <= 355.0 {
        if p > p_melt_ice_vi(t) {
            return WaterPhase::IceVI;
        }
    } else if t <= 715.0 && p > p_melt_ice_vii(t) {
        return WaterPhase::IceVII;
    }
    if t_c >= T_TRIPLE_C - 1e-9 && t < TC_K && p < p_sat_mpa(t) * (1.0 - 1e-9) {
        return WaterPhase::Steam;
    }
    WaterPhase::Liquid
}

/// `None` when water is liquid (or supercritical) at the point, otherwise the
/// phase that is stable there
pub fn is_water_liquid(t_c: f64, p_bar: f64) -> Option<WaterPhase> {
    match water_phase(t_c, p_bar) {
        WaterPhase::Liquid => None,
        other => Some(other),
    }
}

////////////////////////////////RESIDUAL HELMHOLTZ ENERGY////////////////////////////////
/// terms 1..7: (n, d, t)
const POLY: [(f64, i32, f64); 7] = [
    (0.12533547935523e-1, 1, -0.5),
    (0.78957634722828e1, 1, 0.875),
    (-0.87803203303561e1, 1, 1.0),
    (0.31802509345418, 2, 0.5),
    (-0.26145533859358, 2, 0.75),
    (-0.78199751687981e-2, 3, 0.375),
    (0.88089493102134e-2, 4, 1.0),
];

/// terms 8..51: (n, c, d, t)
const EXPO: [(f64, i32, i32, i32); 44] = [
    (-0.66856572307965, 1, 1, 4),
    (0.20433810950965, 1, 1, 6),
    (-0.66212605039687e-4, 1, 1, 12),
    (-0.19232721156002, 1, 2, 1),
    (-0.25709043003438, 1, 2, 5),
    (0.16074868486251, 1, 3, 4),
    (-0.40092828925807e-1, 1, 4, 2),
    (0.39343422603254e-6, 1, 4, 13),
    (-0.75941377088144e-5, 1, 5, 9),
    (0.56250979351888e-3, 1, 7, 3),
    (-0.15608652257135e-4, 1, 9, 4),
    (0.11537996422951e-8, 1, 10, 11),
    (0.36582165144204e-6, 1, 11, 4),
    (-0.13251180074668e-11, 1, 13, 13),
    (-0.62639586912454e-9, 1, 15, 1),
    (-0.10793600908932, 2, 1, 7),
    (0.17611491008752e-1, 2, 2, 1),
    (0.22132295167546, 2, 2, 9),
    (-0.40247669763528, 2, 2, 10),
    (0.58083399985759, 2, 3, 10),
    (0.49969146990806e-2, 2, 4, 3),
    (-0.31358700712549e-1, 2, 4, 7),
    (-0.74315929710341, 2, 4, 10),
    (0.47807329915480, 2, 5, 10),
    (0.20527940895948e-1, 2, 6, 6),
    (-0.13636435110343, 2, 6, 10),
    (0.14180634400617e-1, 2, 7, 10),
    (0.83326504880713e-2, 2, 9, 1),
    (-0.29052336009585e-1, 2, 9, 2),
    (0.38615085574206e-1, 2, 9, 3),
    (-0.20393486513704e-1, 2, 9, 4),
    (-0.16554050063734e-2, 2, 9, 8),
    (0.19955571979541e-2, 2, 10, 6),
    (0.15870308324157e-3, 2, 10, 9),
    (-0.16388568342530e-4, 2, 12, 8),
    (0.43613615723811e-1, 3, 3, 16),
    (0.34994005463765e-1, 3, 4, 22),
    (-0.76788197844621e-1, 3, 4, 23),
    (0.22446277332006e-1, 3, 5, 23),
    (-0.62689710414685e-4, 4, 14, 10),
    (-0.55711118565645e-9, 6, 3, 50),
    (-0.19905718354408, 6, 6, 44),
    (0.31777497330738, 6, 6, 46),
    (-0.11841182425981, 6, 6, 50),
];

/// terms 52..54: (n, d, t, alpha, beta, gamma, epsilon)
const GAUSS: [(f64, i32, f64, f64, f64, f64, f64); 3] = [
    (-0.31306260323435e2, 3, 0.0, 20.0, 150.0, 1.21, 1.0),
    (0.31546140237781e2, 3, 1.0, 20.0, 150.0, 1.21, 1.0),
    (-0.25213154341695e4, 3, 4.0, 20.0, 250.0, 1.25, 1.0),
];

/// terms 55..56: (n, a, b, B, C, D, A, beta)
const NON_ANALYTIC: [(f64, f64, f64, f64, f64, f64, f64, f64); 2] = [
    (-0.14874640856724, 3.5, 0.85, 0.2, 28.0, 700.0, 0.32, 0.3),
    (0.31806110878444, 3.5, 0.95, 0.2, 32.0, 800.0, 0.32, 0.3),
];

/// ∂φʳ/∂δ of the residual Helmholtz energy
fn phi_r_delta(delta: f64, tau: f64) -> f64 {
    let mut sum = 0.0;
    for &(n, d, t) in POLY.iter() {
        sum += n * d as f64 * delta.powi(d - 1) * tau.powf(t);
    }
    for &(n, c, d, t) in EXPO.iter() {
        let dc = delta.powi(c);
        sum += n * (-dc).exp() * (delta.powi(d - 1) * tau.powi(t) * (d as f64 - c as f64 * dc));
    }
    for &(n, d, t, alpha, beta, gamma, eps) in GAUSS.iter() {
        let de = delta - eps;
        let tg = tau - gamma;
        sum += n
            * delta.powi(d)
            * tau.powf(t)
            * (-alpha * de * de - beta * tg * tg).exp()
            * (d as f64 / delta - 2.0 * alpha * de);
    }
    for &(n, a, b, big_b, big_c, big_d, big_a, beta) in NON_ANALYTIC.iter() {
        let dm1 = delta - 1.0;
        let sq = dm1 * dm1;
        let theta = (1.0 - tau) + big_a * sq.powf(1.0 / (2.0 * beta));
        let dist = theta * theta + big_b * sq.powf(a);
        let psi = (-big_c * sq - big_d * (tau - 1.0).powi(2)).exp();
        let dpsi_ddelta = -2.0 * big_c * dm1 * psi;
        let ddist_ddelta = dm1
            * (big_a * theta * (2.0 / beta) * sq.powf(1.0 / (2.0 * beta) - 1.0)
                + 2.0 * big_b * a * sq.powf(a - 1.0));
        // Δ^b has an infinite slope at Δ = 0 but is multiplied by ∂Δ/∂δ = 0 there
        let ddistb_ddelta = if dist > 0.0 {
            b * dist.powf(b - 1.0) * ddist_ddelta
        } else {
            0.0
        };
        sum += n * (dist.powf(b) * (psi + delta * dpsi_ddelta) + ddistb_ddelta * delta * psi);
    }
    sum
}

/// Pressure in MPa of water with density `rho_kg_m3` (kg/m³) at `t_c` (°C).
/// Returns NaN for non-positive density or absolute temperature.
pub fn p4rho_t(rho_kg_m3: f64, t_c: f64) -> f64 {
    let t_k = t_c + 273.15;
    if !(rho_kg_m3 > 0.0 && t_k > 0.0) {
        return f64::NAN;
    }
    let delta = rho_kg_m3 / RHOC;
    let tau = TC_K / t_k;
    rho_kg_m3 * R_W * t_k * (1.0 + delta * phi_r_delta(delta, tau)) / 1000.0
}

////////////////////////////////DENSITY FROM T AND P////////////////////////////////
/// Density of water in kg/m³ at `t_c` (°C) and `p_bar` (bar).
///
/// Fails with [`WaterError::Domain`] where water is not liquid (steam or one of the
/// ices) or outside the range of the equation of state, and with
/// [`WaterError::Convergence`] when either iteration exceeds its cap.
pub fn rho(t_c: f64, p_bar: f64) -> Result<f64, WaterError> {
    if !t_c.is_finite() || !p_bar.is_finite() || p_bar <= 0.0 {
        return Err(WaterError::Domain(format!(
            "density needs finite t and positive p, got t = {} °C, p = {} bar",
            t_c, p_bar
        )));
    }
    let t_k = t_c + 273.15;
    if t_k > 1273.15 || p_bar > 1.0e5 {
        return Err(WaterError::Domain(format!(
            "t = {} °C, p = {} bar is beyond the IAPWS-95 range",
            t_c, p_bar
        )));
    }
    if let Some(phase) = is_water_liquid(t_c, p_bar) {
        return Err(WaterError::Domain(format!(
            "water is {} at t = {} °C, p = {} bar",
            phase, t_c, p_bar
        )));
    }
    let target = p_bar / 10.0;
    let convergence_error = || WaterError::Convergence {
        iterations: MAX_ITERATIONS,
        t_c,
        p_bar,
    };

    // seed: the saturated liquid below the critical point, ideal gas above it
    let (mut r, mut step, floor) = if t_k < TC_K {
        let r_sat = rho_sat(t_c.max(T_TRIPLE_C))? * 1000.0;
        (r_sat, r_sat * 1e-4, r_sat * 0.9)
    } else {
        let r_ideal = target * 1000.0 / (R_W * t_k);
        (r_ideal, 0.1 * r_ideal, 1e-9)
    };

    // 1) bracket the sign change of p4rho_t(r) - target
    let mut lower: Option<(f64, f64)> = None;
    let mut upper: Option<(f64, f64)> = None;
    let mut iterations = 0;
    loop {
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            return Err(convergence_error());
        }
        let p = p4rho_t(r, t_c);
        if !p.is_finite() {
            return Err(convergence_error());
        }
        if p == target {
            return Ok(r);
        }
        if p < target {
            lower = Some((r, p));
        } else {
            upper = Some((r, p));
        }
        match (lower, upper) {
            (Some(_), Some(_)) => break,
            (Some((r_lo, _)), None) => {
                r = r_lo + step;
                step *= 2.0;
            }
            (None, Some((r_hi, _))) => {
                while r_hi - step <= floor {
                    step *= 0.5;
                    if step < r_hi * 1e-14 {
                        return Err(convergence_error());
                    }
                }
                r = r_hi - step;
            }
            (None, None) => unreachable!("every evaluation sets one side of the bracket"),
        }
    }
    let (Some((mut r_lo, mut p_lo)), Some((mut r_hi, mut p_hi))) = (lower, upper) else {
        return Err(convergence_error());
    };

    // 2) chord iteration on the bracket (Illinois variant of regula falsi)
    let mut r_prev = r;
    let mut last_side = 0;
    for _ in 0..MAX_ITERATIONS {
        let r_new = r_lo + (target - p_lo) * (r_hi - r_lo) / (p_hi - p_lo);
        let p_new = p4rho_t(r_new, t_c);
        if !p_new.is_finite() {
            return Err(convergence_error());
        }
        let dr = (r_new - r_prev).abs();
        r_prev = r_new;
        if (p_new - target).abs() < target * 1e-6 && dr < r_new * 1e-5 {
            return Ok(r_new);
        }
        if p_new < target {
            r_lo = r_new;
            p_lo = p_new;
            if last_side == -1 {
                p_hi = target + 0.5 * (p_hi - target);
            }
            last_side = -1;
        } else {
            r_hi = r_new;
            p_hi = p_new;
            if last_side == 1 {
                p_lo = target + 0.5 * (p_lo - target);
            }
            last_side = 1;
        }
    }
    Err(convergence_error())
}
