///////////////////////////TESTING////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use crate::Thermodynamics::logK_extrapolation::*;
    use approx::assert_relative_eq;

    fn van_t_hoff(log_k0: f64, delta_h: f64, t_k: f64) -> f64 {
        log_k0 - delta_h * 1000.0 / RLN10 * (1.0 / t_k - 1.0 / T0)
    }

    #[test]
    fn test_delta_to_a_recovers_delta_h_and_delta_cp() {
        for (k, h, cp) in [
            (-9.5, 55.8, -210.0),
            (3.2, -12.0, 45.0),
            (0.0, 1.0, 1.0),
            (-13.99, 55.81, -224.5),
        ] {
            let a = delta_to_a(k, Some(h), Some(cp));
            assert_relative_eq!(get_delta_h(&a), h, max_relative = 1e-6);
            assert_relative_eq!(get_delta_cp(&a), cp, max_relative = 1e-6);
            assert_relative_eq!(evaluate_series(&a, T0), k, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_delta_to_a_partial_data() {
        let a = delta_to_a(2.5, None, None);
        assert_eq!(a[0], Some(2.5));
        assert!(a[1..].iter().all(Option::is_none));

        let a = delta_to_a(2.5, Some(-10.0), None);
        assert!(a[0].is_some() && a[2].is_some());
        assert!(a[3].is_none());
        assert_relative_eq!(get_delta_h(&a), -10.0, max_relative = 1e-9);
        assert_relative_eq!(get_delta_cp(&a), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_enthalpy_model_follows_van_t_hoff() {
        let model = DeltaHCp {
            delta_h: Some(-25.0),
            delta_cp: None,
        };
        for t_c in [0.01, 50.0, 90.0] {
            assert_relative_eq!(
                model.log_k_sat(Some(4.0), t_c),
                van_t_hoff(4.0, -25.0, t_c + 273.15),
                epsilon = 1e-9
            );
        }
        assert!(model.log_k_sat(None, 50.0).is_nan());
    }

    #[test]
    fn test_default_t_max() {
        assert_eq!(Extrapolation::delta_h_cp(None, None).default_t_max(), 25.0);
        assert_eq!(Extrapolation::delta_h_cp(Some(1.0), None).default_t_max(), 100.0);
        assert_eq!(Extrapolation::delta_h_cp(Some(1.0), Some(2.0)).default_t_max(), 200.0);
        assert_eq!(Extrapolation::delta_h_cp(None, Some(2.0)).default_t_max(), 25.0);
        assert_eq!(Extrapolation::analytic([Some(1.0), None, None, None, None, None]).default_t_max(), 600.0);
        assert_eq!(Extrapolation::LookUp(LookupGrid::default()).default_t_max(), 600.0);
    }

    #[test]
    fn test_analytic_series_matches_converted_enthalpy_model() {
        let a = delta_to_a(-3.0, Some(40.0), Some(-100.0));
        let analytic = Extrapolation::analytic(a);
        let enthalpy = Extrapolation::delta_h_cp(Some(40.0), Some(-100.0));
        for t_c in [10.0, 75.0, 150.0] {
            assert_relative_eq!(
                analytic.log_k_sat(None, t_c),
                enthalpy.log_k_sat(Some(-3.0), t_c),
                epsilon = 1e-9
            );
        }
        assert_relative_eq!(analytic.delta_h(None).unwrap(), 40.0, max_relative = 1e-6);
        assert_relative_eq!(analytic.delta_cp(None).unwrap(), -100.0, max_relative = 1e-6);
        assert_eq!(enthalpy.analytic_coefficients(Some(-3.0)), Some(a));
        assert_eq!(enthalpy.analytic_coefficients(None), None);
    }

    #[test]
    fn test_empty_analytic_series_is_undefined() {
        let s = AnalyticSeries::default();
        assert!(s.log_k_sat(Some(1.0), 50.0).is_nan());
        assert_eq!(s.delta_h(None), None);
    }

    #[test]
    fn test_lookup_enthalpy_from_saturation_row() {
        let mut grid = LookupGrid::default();
        for (col, t_c) in GRID_TEMPERATURES.iter().take(9).enumerate() {
            grid.grid[(0, col)] = van_t_hoff(1.0, -20.0, t_c + 273.15);
        }
        assert_relative_eq!(grid.delta_h(None).unwrap(), -20.0, max_relative = 0.02);
        // a van 't Hoff row has no heat capacity, up to the finite difference error
        assert!(grid.delta_cp(None).unwrap().abs() < 5.0);
        assert!(LookupGrid::default().delta_h(None).is_none());
    }

    #[test]
    fn test_low_density_region() {
        assert!(!in_low_density_region(350.0, 10.0));
        assert!(!in_low_density_region(373.0, 100.0));
        assert!(in_low_density_region(380.0, 230.0));
        assert!(!in_low_density_region(380.0, 240.0));
        // halfway between (400, 290) and (450, 430)
        assert!(in_low_density_region(425.0, 355.0));
        assert!(!in_low_density_region(425.0, 365.0));
        assert!(in_low_density_region(650.0, 800.0));
    }
}
