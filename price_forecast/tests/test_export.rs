use chrono::NaiveDate;
use price_forecast::data::DataLoader;
use price_forecast::export::{
    forecast_rows, read_forecast_csv, write_forecast_csv, write_series_csv, ForecastRow,
};
use price_forecast::models::{fit_and_forecast, ForecastRequest, ModelOrder};
use price_forecast::series::SeriesBuilder;
use pretty_assertions::assert_eq;
use std::fs::File;
use tempfile::tempdir;

#[test]
fn test_forecast_csv_round_trip() {
    let store = DataLoader::embedded().unwrap();
    let catalog = SeriesBuilder::build(&store).unwrap();
    let rice = catalog.get("rice").unwrap();
    let result = fit_and_forecast(rice, &ForecastRequest::new(6, ModelOrder::new(1, 1, 1))).unwrap();

    let mut buffer = Vec::new();
    write_forecast_csv(&result, &mut buffer).unwrap();
    let text = String::from_utf8(buffer.clone()).unwrap();

    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("month,predicted,lower,upper"));
    let first = lines.next().unwrap();
    assert!(first.starts_with("2025-01-01,"));
    for field in first.split(',').skip(1) {
        let decimals = field.split('.').nth(1).unwrap();
        assert_eq!(decimals.len(), 2);
    }

    let rows = read_forecast_csv(buffer.as_slice()).unwrap();
    assert_eq!(rows, forecast_rows(&result));
    assert_eq!(rows.len(), 6);
    for (row, point) in rows.iter().zip(result.points()) {
        assert_eq!(row.month, point.date);
        assert!((row.predicted - point.point).abs() <= 0.005 + 1e-9);
        assert!((row.lower - point.lower).abs() <= 0.005 + 1e-9);
        assert!((row.upper - point.upper).abs() <= 0.005 + 1e-9);
    }
}

#[test]
fn test_series_csv_to_file() {
    let store = DataLoader::embedded().unwrap();
    let catalog = SeriesBuilder::build(&store).unwrap();
    let cotton = catalog.get("cotton").unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("cotton.csv");
    write_series_csv(cotton, File::create(&path).unwrap()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 61);
    assert_eq!(lines[0], "month,price");
    assert_eq!(lines[1], "2020-01-01,1762.00");
    assert_eq!(lines[60], "2024-12-01,2331.00");
}

#[test]
fn test_read_rejects_bad_rows() {
    let text = "month,predicted,lower,upper\n2025-13-01,1.00,0.50,1.50\n";
    assert!(read_forecast_csv(text.as_bytes()).is_err());
}

#[test]
fn test_rows_are_rounded() {
    let text = "month,predicted,lower,upper\n2025-02-01,10.00,9.25,10.75\n";
    let rows = read_forecast_csv(text.as_bytes()).unwrap();
    assert_eq!(
        rows,
        vec![ForecastRow {
            month: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            predicted: 10.0,
            lower: 9.25,
            upper: 10.75,
        }]
    );
}
