use approx::assert_relative_eq;
use chrono::NaiveDate;
use price_forecast::data::DataLoader;
use price_forecast::error::ForecastError;
use price_forecast::models::arima::ArimaModel;
use price_forecast::models::{
    fit_and_forecast, fit_and_forecast_with, FitOptions, ForecastModel, ForecastRequest,
    ModelOrder, TrainedForecastModel,
};
use price_forecast::series::{Series, SeriesBuilder, SeriesPoint};
use price_forecast::utils::month_sequence;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use rstest::rstest;
use std::time::Duration;

fn cotton() -> Series {
    let store = DataLoader::embedded().unwrap();
    let catalog = SeriesBuilder::build(&store).unwrap();
    catalog.get("cotton").unwrap().clone()
}

fn series_from(label: &str, prices: &[f64]) -> Series {
    let start = NaiveDate::from_ymd_opt(1989, 12, 1).unwrap();
    let dates = month_sequence(start, prices.len()).unwrap();
    let points = dates
        .into_iter()
        .zip(prices)
        .map(|(date, price)| SeriesPoint { date, price: *price })
        .collect();
    Series::new(label, points).unwrap()
}

fn ar1_series(phi: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let mut values = Vec::with_capacity(n);
    let mut x = 0.0;
    for _ in 0..n {
        x = phi * x + rng.sample(noise);
        values.push(100.0 + x);
    }
    values
}

#[test]
fn test_cotton_six_month_forecast() {
    let series = cotton();
    let request = ForecastRequest::new(6, ModelOrder::new(1, 1, 1));
    let result = fit_and_forecast(&series, &request).unwrap();

    assert_eq!(result.horizon(), 6);
    assert_eq!(result.order(), ModelOrder::new(1, 1, 1));
    assert_eq!(result.dates()[0], NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    assert_eq!(result.dates()[5], NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());

    let points = result.points();
    for point in points {
        assert!(point.point.is_finite());
        assert!(point.lower <= point.point && point.point <= point.upper);
    }
    for pair in points.windows(2) {
        assert!(pair[1].width() >= pair[0].width() - 1e-9);
    }
}

#[rstest]
#[case(ModelOrder::new(0, 1, 0))]
#[case(ModelOrder::new(1, 0, 0))]
#[case(ModelOrder::new(2, 1, 1))]
#[case(ModelOrder::new(0, 1, 2))]
#[case(ModelOrder::new(1, 1, 0))]
fn test_orders_produce_ordered_intervals(#[case] order: ModelOrder) {
    let series = cotton();
    let result = fit_and_forecast(&series, &ForecastRequest::new(12, order)).unwrap();

    assert_eq!(result.horizon(), 12);
    for pair in result.points().windows(2) {
        assert!(pair[1].width() >= pair[0].width() - 1e-9);
    }
    let diagnostics = result.diagnostics();
    assert_eq!(diagnostics.ar.len(), order.p);
    assert_eq!(diagnostics.ma.len(), order.q);
    assert_eq!(diagnostics.intercept.is_some(), order.d == 0);
}

#[test]
fn test_random_walk_carries_last_price() {
    let series = cotton();
    let result = fit_and_forecast(&series, &ForecastRequest::new(3, ModelOrder::new(0, 1, 0))).unwrap();
    for value in result.values() {
        assert_relative_eq!(value, 2331.0, epsilon = 1e-9);
    }
}

#[test]
fn test_information_criteria() {
    let series = cotton();
    let result = fit_and_forecast(&series, &ForecastRequest::new(6, ModelOrder::new(1, 1, 1))).unwrap();
    let d = result.diagnostics();

    // p + q + sigma2, no intercept after differencing
    assert_eq!(d.parameters, 3);
    assert_eq!(d.observations, 58);
    let k = d.parameters as f64;
    let n = d.observations as f64;
    assert_relative_eq!(d.aic, -2.0 * d.log_likelihood + 2.0 * k, epsilon = 1e-9);
    assert_relative_eq!(d.bic, -2.0 * d.log_likelihood + k * n.ln(), epsilon = 1e-9);
    assert!(d.sigma2 > 0.0);
}

#[test]
fn test_forecast_is_deterministic() {
    let series = cotton();
    let request = ForecastRequest::new(6, ModelOrder::new(2, 1, 1));
    let first = fit_and_forecast(&series, &request).unwrap();
    let second = fit_and_forecast(&series, &request).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_narrower_intervals_at_lower_confidence() {
    let series = cotton();
    let order = ModelOrder::new(1, 1, 1);
    let wide = fit_and_forecast(&series, &ForecastRequest::new(4, order)).unwrap();
    let narrow =
        fit_and_forecast(&series, &ForecastRequest::new(4, order).with_confidence(0.8)).unwrap();

    assert_eq!(wide.values(), narrow.values());
    for (w, n) in wide.points().iter().zip(narrow.points()) {
        assert!(n.width() < w.width());
    }
}

#[test]
fn test_ar1_coefficient_recovery() {
    let values = ar1_series(0.6, 400, 42);
    let series = series_from("synthetic", &values);
    let trained = ArimaModel::new(ModelOrder::new(1, 0, 0))
        .train(&series, &FitOptions::default())
        .unwrap();

    let d = trained.diagnostics();
    assert!((d.ar[0] - 0.6).abs() < 0.1, "phi = {}", d.ar[0]);
    let intercept = d.intercept.unwrap();
    assert!((intercept - 100.0).abs() < 0.5, "mean = {}", intercept);
    assert!((d.sigma2 - 1.0).abs() < 0.25, "sigma2 = {}", d.sigma2);
    assert_eq!(trained.name(), "ARIMA(1,0,0)");
}

#[test]
fn test_five_points_is_insufficient() {
    let series = series_from("short", &[10.0, 11.0, 12.5, 11.0, 13.0]);
    let err = fit_and_forecast(&series, &ForecastRequest::new(3, ModelOrder::default())).unwrap_err();

    match err {
        ForecastError::InsufficientData { points, required, .. } => {
            assert_eq!(points, 5);
            assert_eq!(required, 6);
        }
        other => panic!("expected InsufficientData, got {:?}", other),
    }
}

#[test]
fn test_six_points_is_enough_for_small_order() {
    let series = series_from("short", &[10.0, 11.0, 12.5, 11.0, 13.0, 12.0]);
    let result = fit_and_forecast(&series, &ForecastRequest::new(2, ModelOrder::new(0, 1, 0))).unwrap();
    assert_eq!(result.horizon(), 2);
}

#[test]
fn test_order_too_large_is_invalid() {
    let series = series_from("short", &[10.0, 11.0, 12.5, 11.0, 13.0, 12.0, 14.0]);
    let err = fit_and_forecast(&series, &ForecastRequest::new(2, ModelOrder::new(3, 2, 3))).unwrap_err();
    assert!(matches!(err, ForecastError::InvalidOrder { series_len: 7, .. }));
    assert!(err.is_request_scoped());
}

#[test]
fn test_zero_timeout_fails_with_timeout() {
    let series = cotton();
    let options = FitOptions {
        timeout: Some(Duration::ZERO),
        ..FitOptions::default()
    };
    let err = fit_and_forecast_with(&series, &ForecastRequest::new(6, ModelOrder::default()), &options)
        .unwrap_err();
    assert!(matches!(err, ForecastError::Timeout { .. }));
}

#[test]
fn test_iteration_budget_exhausted() {
    let series = cotton();
    let options = FitOptions {
        max_iterations: 1,
        ..FitOptions::default()
    };
    let err = fit_and_forecast_with(&series, &ForecastRequest::new(6, ModelOrder::new(2, 1, 2)), &options)
        .unwrap_err();
    assert!(matches!(err, ForecastError::NonConvergence { .. }));
}

#[test]
fn test_trending_series_is_constant_after_differencing() {
    let prices: Vec<f64> = (0..12).map(|i| 100.0 + 5.0 * i as f64).collect();
    let series = series_from("linear", &prices);
    let err = fit_and_forecast(&series, &ForecastRequest::new(3, ModelOrder::new(1, 1, 0))).unwrap_err();
    assert!(matches!(err, ForecastError::NonConvergence { .. }));
}

#[test]
fn test_next_period_change() {
    let series = cotton();
    let result = fit_and_forecast(&series, &ForecastRequest::new(1, ModelOrder::new(0, 1, 0))).unwrap();
    assert_relative_eq!(result.next_period_change(2331.0).unwrap(), 0.0, epsilon = 1e-9);
}
