//! Linear and bilinear interpolation over the logK lookup grid.
//!
//! Row 0 of the grid follows the saturation curve, so its pressure depends on the
//! temperature node: `max(pSat(T), 1.01325 bar)` below the critical point and
//! undefined above it. The other rows are isobars at 500, 1000, 3000, 5000 bar.
//! Any neighbour that is NaN makes the result NaN.
use crate::Thermodynamics::logK_extrapolation::{GRID_PRESSURES, GRID_TEMPERATURES, LogKGrid};
use crate::Thermodynamics::water_IAPWS95::{T_CRITICAL_C, T_TRIPLE_C, p_sat};

/// number of grid columns lying on the saturation curve (0..350 °C)
const SATURATION_NODES: usize = 9;
const ONE_ATM: f64 = 1.01325;

/// value between (x0, v0) and (x1, v1); a neighbour with zero weight is not read
fn lerp(x0: f64, x1: f64, v0: f64, v1: f64, x: f64) -> f64 {
    if x == x0 {
        return v0;
    }
    if x == x1 {
        return v1;
    }
    let f = (x - x0) / (x1 - x0);
    v0 + f * (v1 - v0)
}

/// logK on the saturation curve, linear between the 0..350 °C nodes and
/// extrapolated from the last segment up to the critical point
pub fn interpolate_saturation_row(grid: &LogKGrid, t_c: f64) -> f64 {
    if !(0.0..=T_CRITICAL_C).contains(&t_c) {
        return f64::NAN;
    }
    let j = (0..SATURATION_NODES - 1)
        .find(|&j| t_c <= GRID_TEMPERATURES[j + 1])
        .unwrap_or(SATURATION_NODES - 2);
    lerp(
        GRID_TEMPERATURES[j],
        GRID_TEMPERATURES[j + 1],
        grid[(0, j)],
        grid[(0, j + 1)],
        t_c,
    )
}

/// pressure of grid row 0 at a temperature node, NaN at and above the critical point
pub fn saturation_row_pressure(t_c: f64) -> f64 {
    if t_c >= T_CRITICAL_C {
        return f64::NAN;
    }
    match p_sat(t_c.max(T_TRIPLE_C)) {
        Ok(p) => p.max(ONE_ATM),
        Err(_) => f64::NAN,
    }
}

/// logK along one grid column at pressure `p_bar`
fn interpolate_column(grid: &LogKGrid, col: usize, p_bar: f64) -> f64 {
    let mut pressures = GRID_PRESSURES;
    pressures[0] = saturation_row_pressure(GRID_TEMPERATURES[col]);
    let i = if p_bar <= pressures[1] {
        0
    } else {
        (1..pressures.len() - 1)
            .find(|&i| p_bar <= pressures[i + 1])
            .unwrap_or(pressures.len() - 2)
    };
    if pressures[i].is_nan() {
        return f64::NAN;
    }
    lerp(
        pressures[i],
        pressures[i + 1],
        grid[(i, col)],
        grid[(i + 1, col)],
        p_bar,
    )
}

/// Bilinear interpolation at (`t_c`, `p_bar`): first along pressure in the two
/// bracketing temperature columns, then along temperature.
pub fn interpolate_grid(grid: &LogKGrid, t_c: f64, p_bar: f64) -> f64 {
    let last = GRID_TEMPERATURES.len() - 1;
    if !(0.0..=GRID_TEMPERATURES[last]).contains(&t_c) || !(p_bar > 0.0) || p_bar > 5000.0 {
        return f64::NAN;
    }
    let j = (0..last)
        .find(|&j| t_c <= GRID_TEMPERATURES[j + 1])
        .unwrap_or(last - 1);
    let (t0, t1) = (GRID_TEMPERATURES[j], GRID_TEMPERATURES[j + 1]);
    if t_c == t0 {
        return interpolate_column(grid, j, p_bar);
    }
    if t_c == t1 {
        return interpolate_column(grid, j + 1, p_bar);
    }
    let v0 = interpolate_column(grid, j, p_bar);
    let v1 = interpolate_column(grid, j + 1, p_bar);
    lerp(t0, t1, v0, v1, t_c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// logK = row * 10 + column, NaN in row 0 above the critical point
    fn ramp_grid() -> LogKGrid {
        LogKGrid::from_fn(|r, c| {
            if r == 0 && c >= 9 {
                f64::NAN
            } else {
                (r * 10 + c) as f64
            }
        })
    }

    #[test]
    fn test_saturation_row_nodes_and_midpoints() {
        let g = ramp_grid();
        assert_relative_eq!(interpolate_saturation_row(&g, 25.0), 1.0);
        assert_relative_eq!(interpolate_saturation_row(&g, 75.0), 2.5);
        assert_relative_eq!(interpolate_saturation_row(&g, 350.0), 8.0);
        // extrapolated from the 300..350 segment
        assert_relative_eq!(interpolate_saturation_row(&g, 360.0), 8.2, epsilon = 1e-12);
        assert!(interpolate_saturation_row(&g, 380.0).is_nan());
        assert!(interpolate_saturation_row(&g, -1.0).is_nan());
    }

    #[test]
    fn test_saturation_row_nan_neighbour() {
        let mut g = ramp_grid();
        g[(0, 3)] = f64::NAN;
        assert!(interpolate_saturation_row(&g, 75.0).is_nan());
        assert_relative_eq!(interpolate_saturation_row(&g, 25.0), 1.0);
    }

    #[test]
    fn test_grid_on_isobars() {
        let g = ramp_grid();
        assert_relative_eq!(interpolate_grid(&g, 100.0, 1000.0), 23.0);
        assert_relative_eq!(interpolate_grid(&g, 125.0, 1000.0), 23.5);
        assert_relative_eq!(interpolate_grid(&g, 100.0, 2000.0), 28.0);
        assert_relative_eq!(interpolate_grid(&g, 450.0, 5000.0), 50.0);
    }

    #[test]
    fn test_grid_near_saturation() {
        let g = ramp_grid();
        let p0 = saturation_row_pressure(100.0);
        assert_relative_eq!(p0, 1.01418, max_relative = 1e-4);
        assert_relative_eq!(interpolate_grid(&g, 100.0, p0), 3.0);
        let mid = 0.5 * (p0 + 500.0);
        assert_relative_eq!(interpolate_grid(&g, 100.0, mid), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_grid_supercritical_needs_isobars() {
        let g = ramp_grid();
        // row 0 is undefined at 400 °C, so 300 bar has no lower neighbour
        assert!(interpolate_grid(&g, 400.0, 300.0).is_nan());
        assert_relative_eq!(interpolate_grid(&g, 400.0, 750.0), 24.0);
        assert!(interpolate_grid(&g, 400.0, 6000.0).is_nan());
        assert!(interpolate_grid(&g, 650.0, 1000.0).is_nan());
    }
}
