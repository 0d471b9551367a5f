use approx::assert_relative_eq;
use dualtree_lpr::prelude::*;
use dualtree_lpr::LprConfig;

fn line(n: usize, step: f64) -> (Vec<f64>, Vec<f64>) {
    let x: Vec<f64> = (0..n).map(|i| i as f64 * step).collect();
    let y: Vec<f64> = x.iter().map(|&xi| 2.0 * xi + 1.0).collect();
    (x, y)
}

// ============================================================================
// Scenario Tests
// ============================================================================

#[test]
fn test_kernel_average_matches_brute_force() {
    let x: Vec<f64> = vec![0.0, 1.0, 2.0, 3.0, 4.0];
    let y = x.clone();

    let model = Lpr::new()
        .bandwidth(10.0)
        .degree(Constant)
        .build()
        .unwrap();

    let dual = model.fit(&x, &y, &[2.0]).unwrap();
    let naive = model.fit_naive(&x, &y, &[2.0]).unwrap();

    assert!((dual.values[0] - naive.values[0]).abs() < 1e-3);
    // Symmetric weights around x = 2
    assert_relative_eq!(dual.values[0], 2.0, epsilon = 1e-12);
    assert!(dual.gradient(0).is_none());
}

#[test]
fn test_exact_line_recovered_in_both_modes() {
    let (x, y) = line(5, 1.0);

    for mode in [Quick, QuickPlusRelative] {
        let model = Lpr::new()
            .bandwidth(3.0)
            .degree(Linear)
            .pruning_mode(mode)
            .build()
            .unwrap();
        let result = model.fit(&x, &y, &[0.0, 1.5, 2.0, 4.0]).unwrap();

        for i in 0..result.len() {
            let coefficients = result.coefficients(i).unwrap();
            assert_relative_eq!(coefficients[0], 1.0, epsilon = 1e-9);
            assert_relative_eq!(coefficients[1], 2.0, epsilon = 1e-9);
            assert_relative_eq!(result.gradient(i).unwrap()[0], 2.0, epsilon = 1e-9);
        }
        assert_relative_eq!(result.values[1], 4.0, epsilon = 1e-9);
    }
}

#[test]
fn test_exact_line_recovered_under_heavy_pruning() {
    // Approximated weights are still positive weights, so an exact line is still exact.
    let (x, y) = line(400, 0.01);
    let queries: Vec<f64> = (0..50).map(|i| 0.2 + i as f64 * 0.07).collect();

    for (mode, abs_tol, rel_tol) in [(Quick, 20.0, 0.0), (QuickPlusRelative, 0.0, 0.5)] {
        let model = Lpr::new()
            .bandwidth(0.5)
            .degree(Linear)
            .kernel(Tricube)
            .pruning_mode(mode)
            .absolute_tolerance(abs_tol)
            .relative_tolerance(rel_tol)
            .leaf_size(4)
            .build()
            .unwrap();
        let result = model.fit(&x, &y, &queries).unwrap();

        assert!(result.stats.prunes > 0);
        for i in 0..result.len() {
            let coefficients = result.coefficients(i).unwrap();
            assert_relative_eq!(coefficients[0], 1.0, epsilon = 1e-6);
            assert_relative_eq!(coefficients[1], 2.0, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_exact_plane_recovered_3d() {
    let mut points = Vec::new();
    let mut targets = Vec::new();
    for i in 0..6 {
        for j in 0..6 {
            for k in 0..6 {
                let p = [i as f64 * 0.2, j as f64 * 0.2, k as f64 * 0.2];
                points.extend_from_slice(&p);
                targets.push(1.0 + p[0] - 2.0 * p[1] + 0.5 * p[2]);
            }
        }
    }

    let model = Lpr::new()
        .dimensions(3)
        .bandwidth(0.7)
        .leaf_size(8)
        .build()
        .unwrap();
    let result = model.fit(&points, &targets, &[0.5, 0.5, 0.5]).unwrap();

    let coefficients = result.coefficients(0).unwrap();
    assert_eq!(coefficients.len(), 4);
    assert_relative_eq!(coefficients[0], 1.0, epsilon = 1e-8);
    assert_relative_eq!(coefficients[1], 1.0, epsilon = 1e-8);
    assert_relative_eq!(coefficients[2], -2.0, epsilon = 1e-8);
    assert_relative_eq!(coefficients[3], 0.5, epsilon = 1e-8);
    assert_relative_eq!(result.values[0], 0.75, epsilon = 1e-8);
}

// ============================================================================
// Degenerate Query Tests
// ============================================================================

#[test]
fn test_query_outside_support_uses_global_mean() {
    let x = vec![0.0, 1.0, 2.0, 3.0, 4.0];
    let y = x.clone();

    let model = Lpr::new().bandwidth(0.5).build().unwrap();
    let result = model.fit(&x, &y, &[100.0, 2.0]).unwrap();

    assert_eq!(
        result.estimates[0],
        LocalEstimate::Degenerate {
            reason: NoKernelSupport,
            value: 2.0
        }
    );
    assert_eq!(result.values[0], 2.0);
    assert_eq!(result.n_degenerate(), 1);
    assert!(result.coefficients(0).is_none());
}

#[test]
fn test_query_outside_support_return_zero() {
    let x = vec![0.0, 1.0, 2.0];
    let y = vec![5.0, 6.0, 7.0];

    let model = Lpr::new()
        .bandwidth(0.5)
        .zero_weight_fallback(ReturnZero)
        .build()
        .unwrap();
    let result = model.fit(&x, &y, &[-50.0]).unwrap();
    assert_eq!(result.values[0], 0.0);

    let weighted = Lpr::new()
        .bandwidth(0.5)
        .zero_weight_fallback(UseGlobalMean)
        .build()
        .unwrap()
        .fit_weighted(&x, &y, &[1.0, 0.0, 3.0], &[-50.0])
        .unwrap();
    // (5 * 1 + 7 * 3) / 4
    assert_relative_eq!(weighted.values[0], 6.5);
}

#[test]
fn test_single_supporting_point_is_singular() {
    let x = vec![0.0, 1.0, 2.0];
    let y = vec![5.0, 6.0, 7.0];

    let model = Lpr::new().bandwidth(0.6).degree(Linear).build().unwrap();
    let result = model.fit(&x, &y, &[0.0]).unwrap();

    match &result.estimates[0] {
        LocalEstimate::Degenerate { reason, value } => {
            assert_eq!(*reason, SingularSystem);
            assert_relative_eq!(*value, 5.0);
        }
        other => panic!("expected a singular system, got {:?}", other),
    }

    // The same query is fine with a local constant.
    let constant = Lpr::new()
        .bandwidth(0.6)
        .degree(Constant)
        .build()
        .unwrap()
        .fit(&x, &y, &[0.0])
        .unwrap();
    assert_eq!(constant.n_degenerate(), 0);
    assert_relative_eq!(constant.values[0], 5.0);
}

// ============================================================================
// Custom Kernel Tests
// ============================================================================

struct Cauchy;

impl Kernel<f64> for Cauchy {
    fn evaluate(&self, distance: f64) -> f64 {
        1.0 / (1.0 + distance * distance)
    }

    fn name(&self) -> &'static str {
        "Cauchy"
    }
}

#[test]
fn test_custom_kernel_matches_brute_force() {
    let x: Vec<f64> = (0..200).map(|i| (i as f64 * 0.173).sin() * 3.0).collect();
    let y: Vec<f64> = x.iter().map(|&v| v * v).collect();
    let queries = vec![-2.0, -0.5, 0.0, 1.25, 2.5];

    let model = Lpr::new()
        .bandwidth(0.4)
        .degree(Quadratic)
        .relative_tolerance(0.0)
        .leaf_size(8)
        .build()
        .unwrap();

    let dual = model.fit_with_kernel(&Cauchy, &x, &y, None, &queries).unwrap();
    let naive = model
        .fit_naive_with_kernel(&Cauchy, &x, &y, None, &queries)
        .unwrap();

    assert_eq!(dual.kernel, "Cauchy");
    for (a, b) in dual.values.iter().zip(naive.values.iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-8);
    }
    // y = x^2 is reproduced by a local quadratic
    for (v, q) in dual.values.iter().zip(queries.iter()) {
        assert_relative_eq!(*v, q * q, epsilon = 1e-6);
    }
}

// ============================================================================
// Precision Tests
// ============================================================================

#[test]
fn test_f32_fit() {
    let x: Vec<f32> = (0..50).map(|i| i as f32 * 0.1).collect();
    let y: Vec<f32> = x.iter().map(|&v| 3.0 * v - 1.0).collect();

    let model = Lpr::<f32>::new().bandwidth(1.0).build().unwrap();
    let result = model.fit(&x, &y, &[2.0]).unwrap();

    assert_relative_eq!(result.values[0], 5.0, epsilon = 1e-3);
    let coefficients = result.coefficients(0).unwrap();
    assert_relative_eq!(coefficients[1], 3.0, epsilon = 1e-3);
}

#[test]
fn test_quadratic_far_from_data_centre_f64() {
    // Queries near the end of a long design must not lose conditioning.
    let x: Vec<f64> = (0..=1000).map(|i| i as f64).collect();
    let y: Vec<f64> = x.iter().map(|&v| (v / 50.0).sin()).collect();
    let queries = [500.3, 700.3, 900.3, 990.3];

    let model = Lpr::new()
        .bandwidth(10.0)
        .degree(Quadratic)
        .absolute_tolerance(0.0)
        .relative_tolerance(0.0)
        .build()
        .unwrap();

    for result in [
        model.fit(&x, &y, &queries).unwrap(),
        model.fit_naive(&x, &y, &queries).unwrap(),
    ] {
        assert_eq!(result.n_degenerate(), 0);
        for (i, &q) in queries.iter().enumerate() {
            assert_relative_eq!(result.values[i], (q / 50.0).sin(), epsilon = 1e-3);
            let slope = (q / 50.0).cos() / 50.0;
            assert_relative_eq!(result.gradient(i).unwrap()[0], slope, epsilon = 1e-3);
        }
    }
    assert_relative_eq!(
        model.fit(&x, &y, &[990.3]).unwrap().values[0],
        -0.74701,
        epsilon = 1e-3
    );
}

#[test]
fn test_quadratic_far_from_data_centre_f32() {
    let x: Vec<f32> = (0..=1000).map(|i| i as f32).collect();
    let y: Vec<f32> = x.iter().map(|&v| (v / 50.0).sin()).collect();
    let queries = [500.3f32, 700.3, 900.3, 990.3];

    let model = Lpr::<f32>::new()
        .bandwidth(10.0)
        .degree(Quadratic)
        .absolute_tolerance(0.0)
        .relative_tolerance(0.0)
        .build()
        .unwrap();

    for result in [
        model.fit(&x, &y, &queries).unwrap(),
        model.fit_naive(&x, &y, &queries).unwrap(),
    ] {
        assert_eq!(result.n_degenerate(), 0);
        for (i, &q) in queries.iter().enumerate() {
            assert_relative_eq!(result.values[i], (q / 50.0).sin(), epsilon = 1e-2);
        }
    }
}

#[test]
fn test_general_degree_variant() {
    let x: Vec<f64> = (0..60).map(|i| i as f64 * 0.1).collect();
    let y: Vec<f64> = x.iter().map(|&v| v.powi(5) - 2.0 * v).collect();

    let model = Lpr::new()
        .bandwidth(2.0)
        .degree(Degree(5))
        .relative_tolerance(0.0)
        .build()
        .unwrap();
    let result = model.fit(&x, &y, &[2.55]).unwrap();

    assert_eq!(result.degree.value(), 5);
    assert_relative_eq!(result.values[0], 2.55f64.powi(5) - 5.1, epsilon = 1e-6);

    // Large degrees are bounded by the moment-table limit.
    assert_eq!(
        Lpr::<f64>::new().degree(Degree(40_000)).build().unwrap_err(),
        LprError::InvalidDegree(40_000)
    );
    assert_eq!(
        Lpr::<f64>::new().degree(Degree(usize::MAX)).build().unwrap_err(),
        LprError::InvalidDegree(usize::MAX)
    );
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_builder_parameter_errors() {
    assert_eq!(
        Lpr::<f64>::new().bandwidth(0.0).build().unwrap_err(),
        LprError::InvalidBandwidth(0.0)
    );
    assert_eq!(
        Lpr::<f64>::new().dimensions(0).build().unwrap_err(),
        LprError::InvalidDimensions(0)
    );
    assert_eq!(
        Lpr::<f64>::new()
            .dimensions(2)
            .bandwidths(vec![1.0, 1.0, 1.0])
            .build()
            .unwrap_err(),
        LprError::InvalidBandwidthLength {
            got: 3,
            expected: 2
        }
    );
    assert_eq!(
        Lpr::<f64>::new().relative_tolerance(-0.1).build().unwrap_err(),
        LprError::InvalidTolerance(-0.1)
    );
    assert_eq!(
        Lpr::<f64>::new()
            .absolute_tolerance(f64::INFINITY)
            .build()
            .unwrap_err(),
        LprError::InvalidTolerance(f64::INFINITY)
    );
    assert_eq!(
        Lpr::<f64>::new().condition_tolerance(1.0).build().unwrap_err(),
        LprError::InvalidConditionTolerance(1.0)
    );
    assert_eq!(
        Lpr::<f64>::new().leaf_size(0).build().unwrap_err(),
        LprError::InvalidLeafSize(0)
    );
    assert_eq!(
        Lpr::<f64>::new()
            .dimensions(11)
            .degree(Quartic)
            .build()
            .unwrap_err(),
        LprError::InvalidDegree(4)
    );
    assert!(Lpr::<f64>::new()
        .dimensions(10)
        .degree(Quartic)
        .build()
        .is_ok());
}

#[test]
fn test_duplicate_parameters_rejected() {
    let err = Lpr::<f64>::new()
        .bandwidth(1.0)
        .bandwidths(vec![1.0])
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        LprError::DuplicateParameter {
            parameter: "bandwidth"
        }
    );

    let err = Lpr::<f64>::new()
        .leaf_size(4)
        .leaf_size(8)
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        LprError::DuplicateParameter {
            parameter: "leaf_size"
        }
    );
}

#[test]
fn test_input_errors() {
    let model = Lpr::new().dimensions(2).build().unwrap();

    assert_eq!(
        model.fit(&[], &[], &[0.0, 0.0]).unwrap_err(),
        LprError::EmptyInput
    );
    assert_eq!(
        model.fit(&[0.0, 0.0], &[1.0], &[]).unwrap_err(),
        LprError::EmptyInput
    );
    assert_eq!(
        model.fit(&[0.0, 0.0, 1.0], &[1.0], &[0.0, 0.0]).unwrap_err(),
        LprError::DimensionMismatch {
            len: 3,
            dimensions: 2
        }
    );
    assert_eq!(
        model.fit(&[0.0, 0.0], &[1.0], &[0.0]).unwrap_err(),
        LprError::DimensionMismatch {
            len: 1,
            dimensions: 2
        }
    );
    assert_eq!(
        model
            .fit(&[0.0, 0.0, 1.0, 1.0], &[1.0], &[0.0, 0.0])
            .unwrap_err(),
        LprError::MismatchedInputs { x_len: 2, y_len: 1 }
    );
    assert_eq!(
        model
            .fit_weighted(&[0.0, 0.0, 1.0, 1.0], &[1.0, 2.0], &[1.0], &[0.0, 0.0])
            .unwrap_err(),
        LprError::MismatchedInputs { x_len: 2, y_len: 1 }
    );

    let err = model
        .fit(&[0.0, f64::NAN], &[1.0], &[0.0, 0.0])
        .unwrap_err();
    assert_eq!(err, LprError::InvalidNumericValue("references[1]=NaN".to_string()));

    let err = model
        .fit(&[0.0, 0.0], &[f64::INFINITY], &[0.0, 0.0])
        .unwrap_err();
    assert!(matches!(err, LprError::InvalidNumericValue(_)));

    let err = model
        .fit_weighted(&[0.0, 0.0, 1.0, 1.0], &[1.0, 2.0], &[1.0, -1.0], &[0.0, 0.0])
        .unwrap_err();
    assert!(matches!(err, LprError::InvalidWeights(_)));

    let err = model
        .fit_weighted(&[0.0, 0.0, 1.0, 1.0], &[1.0, 2.0], &[0.0, 0.0], &[0.0, 0.0])
        .unwrap_err();
    assert!(matches!(err, LprError::InvalidWeights(_)));
}

// ============================================================================
// Configuration and Output Tests
// ============================================================================

#[test]
fn test_default_configuration() {
    let model = Lpr::<f64>::new().build().unwrap();
    let config = model.config();
    let defaults = LprConfig::<f64>::default();

    assert_eq!(config, &defaults);
    assert_eq!(config.dimensions, 1);
    assert_eq!(config.bandwidths, vec![1.0]);
    assert_eq!(config.degree, Linear);
    assert_eq!(config.weight_function, Epanechnikov);
    assert_eq!(config.pruning_mode, QuickPlusRelative);
    assert_eq!(config.absolute_tolerance, 0.0);
    assert_relative_eq!(config.relative_tolerance, 0.01);
    assert_eq!(config.leaf_size, 32);
    assert_relative_eq!(config.condition_tolerance, f64::EPSILON.sqrt());
    assert_eq!(config.zero_weight_fallback, UseGlobalMean);
    assert!(config.parallel);
}

#[test]
fn test_result_display() {
    let (x, y) = line(10, 1.0);
    let model = Lpr::new().bandwidth(3.0).build().unwrap();

    let result = model.fit(&x, &y, &[2.0, 50.0]).unwrap();
    let text = format!("{}", result);
    assert!(text.contains("Summary:"));
    assert!(text.contains("Kernel: Epanechnikov"));
    assert!(text.contains("Pruning: QuickPlusRelative"));
    assert!(text.contains("Traversal:"));
    assert!(text.contains("Solved"));
    assert!(text.contains("NoSupport"));

    let naive = model.fit_naive(&x, &y, &[2.0]).unwrap();
    let text = format!("{}", naive);
    assert!(text.contains("Pruning: None (brute force)"));
    assert!(!text.contains("Traversal:"));
}

#[test]
fn test_fit_under_tracing_subscriber() {
    use tracing_subscriber::filter::LevelFilter;

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .finish();

    let (x, y) = line(100, 0.1);
    let result = tracing::subscriber::with_default(subscriber, || {
        Lpr::new()
            .bandwidth(0.35)
            .parallel(false)
            .build()
            .unwrap()
            .fit(&x, &y, &[0.5, 1000.0])
            .unwrap()
    });

    assert_eq!(result.count_degenerate(NoKernelSupport), 1);
}

#[cfg(feature = "serde")]
#[test]
fn test_result_serializes_to_json() {
    let (x, y) = line(5, 1.0);
    let model = Lpr::new().bandwidth(3.0).build().unwrap();
    let result = model.fit(&x, &y, &[2.0]).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["kernel"], "Epanechnikov");
    assert_eq!(json["degree"], "Linear");
    assert_eq!(json["pruning_mode"], "QuickPlusRelative");
    assert_eq!(json["dimensions"], 1);
    assert!(json["estimates"][0]["Solved"]["coefficients"].is_array());

    let degree: dualtree_lpr::PolynomialDegree = serde_json::from_str("\"Cubic\"").unwrap();
    assert_eq!(degree, Cubic);
}
