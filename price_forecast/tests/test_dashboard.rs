use price_forecast::config::DashboardConfig;
use price_forecast::data::DataLoader;
use price_forecast::error::ForecastError;
use price_forecast::models::ModelOrder;
use price_forecast::overview::{highest_priced, most_volatile};
use price_forecast::series::SeriesBuilder;
use price_forecast::Dashboard;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn embedded_dashboard() -> Dashboard {
    let store = DataLoader::embedded().unwrap();
    Dashboard::new(
        Arc::new(SeriesBuilder::build(&store).unwrap()),
        DashboardConfig::default(),
    )
}

#[test]
fn test_entities_sorted() {
    let dashboard = embedded_dashboard();
    let entities = dashboard.entities();
    assert_eq!(entities.len(), 12);
    assert_eq!(entities[0], "Cotton");
    assert_eq!(entities[11], "Wheat");
}

#[test]
fn test_analyze_default_request() {
    let dashboard = embedded_dashboard();
    let view = dashboard.analyze_default("Cotton").unwrap();

    assert!(!view.is_degraded());
    assert_eq!(view.request.horizon, 6);
    assert_eq!(view.request.order, ModelOrder::new(1, 1, 1));
    let forecast = view.forecast.as_ref().unwrap();
    assert_eq!(forecast.horizon(), 6);

    let expected = (forecast.values()[0] - 2331.0) / 2331.0 * 100.0;
    assert!((view.next_period_change().unwrap() - expected).abs() < 1e-9);

    let json = view.to_json().unwrap();
    assert!(json.contains("\"forecast_failure\": null"));
    assert!(json.contains("\"aic\""));
}

#[test]
fn test_unknown_entity() {
    let dashboard = embedded_dashboard();
    let err = dashboard.analyze("saffron", 6, ModelOrder::default()).unwrap_err();
    assert!(matches!(err, ForecastError::UnknownEntity(name) if name == "saffron"));
}

#[test]
fn test_parameters_outside_bounds() {
    let dashboard = embedded_dashboard();
    assert!(matches!(
        dashboard.analyze("cotton", 13, ModelOrder::default()),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(matches!(
        dashboard.analyze("cotton", 0, ModelOrder::default()),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(matches!(
        dashboard.analyze("cotton", 6, ModelOrder::new(4, 1, 1)),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_insufficient_data_degrades_to_history() {
    let text = "Crop,Year,Month,Price,Market\n\
                ragi,2024,January,2100,AP\n\
                ragi,2024,February,2150,AP\n\
                ragi,2024,March,2080,AP\n\
                ragi,2024,April,2200,AP\n";
    let store = DataLoader::from_csv_str(text).unwrap();
    let dashboard = Dashboard::new(
        Arc::new(SeriesBuilder::build(&store).unwrap()),
        DashboardConfig::default(),
    );

    let view = dashboard.analyze_default("ragi").unwrap();
    assert!(view.is_degraded());
    assert_eq!(view.series.len(), 4);
    assert_eq!(view.next_period_change(), None);
    assert!(view.forecast_failure.unwrap().contains("Insufficient data"));
}

#[test]
fn test_invalid_order_degrades_to_history() {
    let text = "Crop,Year,Month,Price,Market\n\
                jowar,2024,January,2100,AP\n\
                jowar,2024,February,2150,AP\n\
                jowar,2024,March,2080,AP\n\
                jowar,2024,April,2200,AP\n\
                jowar,2024,May,2170,AP\n\
                jowar,2024,June,2240,AP\n\
                jowar,2024,July,2190,AP\n";
    let store = DataLoader::from_csv_str(text).unwrap();
    let dashboard = Dashboard::new(
        Arc::new(SeriesBuilder::build(&store).unwrap()),
        DashboardConfig::default(),
    );

    let view = dashboard.analyze("Jowar", 6, ModelOrder::new(3, 2, 3)).unwrap();
    assert!(view.is_degraded());
    assert!(view.forecast_failure.unwrap().contains("ARIMA(3,2,3)"));
}

#[test]
fn test_overview_rankings() {
    let store = DataLoader::embedded().unwrap();
    let catalog = SeriesBuilder::build(&store).unwrap();

    let top: Vec<String> = highest_priced(&catalog, 3).into_iter().map(|r| r.label).collect();
    assert_eq!(top, vec!["Wheat", "Jowar", "Maize"]);

    let volatile = most_volatile(&catalog, 3);
    let labels: Vec<&str> = volatile.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["Wheat", "Maize", "Onion"]);
    assert!(volatile[2].value < 0.0);
}

#[test]
fn test_dashboard_rankings_use_configured_count() {
    let dashboard = embedded_dashboard();
    assert_eq!(dashboard.highest_priced().len(), 5);
    assert_eq!(dashboard.most_volatile().len(), 5);
}
