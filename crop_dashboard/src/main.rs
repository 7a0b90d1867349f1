//! # crop-dashboard
//!
//! Command-line dashboard for crop price history and ARIMA forecasts.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use price_forecast::cache;
use price_forecast::data::{DataLoader, RecordStore};
use price_forecast::export::{forecast_file_name, forecast_rows, write_forecast_csv, write_series_csv};
use price_forecast::models::ModelOrder;
use price_forecast::overview::PriceRanking;
use price_forecast::series::Series;
use price_forecast::utils::{format_month_year, format_short_month};
use price_forecast::{Dashboard, DashboardConfig, EntityView};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crop-dashboard")]
#[command(about = "Crop price history and ARIMA forecasts", long_about = None)]
struct Cli {
    /// Price table (CSV); the embedded dataset when omitted
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summary of every crop
    Crops,

    /// Dataset summary with the highest priced and most volatile crops
    Overview,

    /// Monthly price history of one crop
    History {
        crop: String,

        /// Write the history to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Forecast future prices of one crop
    Forecast(ForecastArgs),
}

#[derive(Args)]
struct ForecastArgs {
    crop: String,

    /// Months to forecast
    #[arg(long)]
    horizon: Option<usize>,

    /// Autoregressive order
    #[arg(short)]
    p: Option<usize>,

    /// Differencing order
    #[arg(short)]
    d: Option<usize>,

    /// Moving-average order
    #[arg(short)]
    q: Option<usize>,

    /// Write the forecast to this CSV file, or a directory for the default name
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the view as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = DashboardConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let store = load_store(cli.data.as_deref().or(config.data.path.as_deref()))?;
    let catalog = cache::catalog_for(&store)?;
    let dashboard = Dashboard::new(catalog, config);

    match cli.command {
        Commands::Crops => print_crops(&dashboard),
        Commands::Overview => print_overview(&dashboard, &store),
        Commands::History { crop, output } => {
            let series = dashboard.series(&crop)?;
            print_history(series);
            if let Some(path) = output {
                let file = File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
                write_series_csv(series, BufWriter::new(file))?;
                info!(path = %path.display(), "history written");
            }
        }
        Commands::Forecast(args) => run_forecast(&dashboard, args)?,
    }

    Ok(())
}

fn load_store(path: Option<&Path>) -> Result<RecordStore> {
    match path {
        Some(path) => DataLoader::from_path(path).with_context(|| format!("failed to load {}", path.display())),
        None => Ok(DataLoader::embedded()?),
    }
}

fn run_forecast(dashboard: &Dashboard, args: ForecastArgs) -> Result<()> {
    let defaults = &dashboard.config().forecast;
    let horizon = args.horizon.unwrap_or(defaults.horizon);
    let order = ModelOrder::new(
        args.p.unwrap_or(defaults.order.p),
        args.d.unwrap_or(defaults.order.d),
        args.q.unwrap_or(defaults.order.q),
    );

    let view = dashboard.analyze(&args.crop, horizon, order)?;
    if args.json {
        println!("{}", view.to_json()?);
    } else {
        print_view(&view);
    }

    if let Some(path) = args.output {
        write_forecast_output(&view, path)?;
    }
    Ok(())
}

/// Write the view's forecast, returning where it went; a view without a
/// forecast writes nothing
fn write_forecast_output(view: &EntityView, path: PathBuf) -> Result<Option<PathBuf>> {
    let Some(forecast) = view.forecast.as_ref() else {
        warn!(path = %path.display(), "no forecast available, nothing written");
        return Ok(None);
    };
    let path = if path.is_dir() {
        path.join(forecast_file_name(view.series.label(), Local::now().date_naive()))
    } else {
        path
    };
    let file = File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
    write_forecast_csv(forecast, BufWriter::new(file))?;
    info!(path = %path.display(), "forecast written");
    Ok(Some(path))
}

/// "Rs 2,331.00"
fn rupees(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let negative = value < 0.0 && formatted.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if negative { "-" } else { "" };
    format!("{}Rs {}.{}", sign, grouped, fraction)
}

fn print_crops(dashboard: &Dashboard) {
    println!(
        "{:<12} {:>6} {:>19} {:>14} {:>14} {:>9}",
        "Crop", "Months", "Range", "Latest", "Average", "Change"
    );
    for series in dashboard.catalog().iter() {
        let summary = series.summary();
        println!(
            "{:<12} {:>6} {:>19} {:>14} {:>14} {:>8.2}%",
            series.label(),
            summary.count,
            summary.date_range(),
            rupees(summary.latest_price),
            rupees(summary.mean_price),
            summary.last_change_pct
        );
    }
}

fn print_rankings(title: &str, rankings: &[PriceRanking], percent: bool) {
    println!("{}", title);
    for (i, entry) in rankings.iter().enumerate() {
        let value = if percent {
            format!("{:+.2}%", entry.value)
        } else {
            rupees(entry.value)
        };
        println!("  {}. {:<12} {:>14}", i + 1, entry.label, value);
    }
}

fn print_overview(dashboard: &Dashboard, store: &RecordStore) {
    let summary = store.summary();
    println!("Total records:   {}", summary.total_records);
    println!("Crops:           {}", summary.unique_entities);
    println!("Years:           {} to {}", summary.first_year, summary.last_year);
    println!();
    print_rankings("Highest priced", &dashboard.highest_priced(), false);
    println!();
    print_rankings("Most volatile (last month)", &dashboard.most_volatile(), true);
}

fn print_history(series: &Series) {
    let summary = series.summary();
    println!("{} price history ({})", series.label(), summary.date_range());
    if !series.regions().is_empty() {
        println!("Markets: {}", series.regions().join(", "));
    }
    for point in series.points() {
        println!("  {:<9} {:>14}", format_short_month(point.date), rupees(point.price));
    }
}

fn print_view(view: &EntityView) {
    let summary = view.series.summary();
    println!("{}", view.series.label());
    println!("  Current price:  {}", rupees(summary.latest_price));
    println!("  Average price:  {}", rupees(summary.mean_price));
    println!("  Last change:    {:+.2}%", summary.last_change_pct);

    let forecast = match (&view.forecast, &view.forecast_failure) {
        (Some(forecast), _) => forecast,
        (None, failure) => {
            println!();
            println!("Forecast unavailable: {}", failure.as_deref().unwrap_or("unknown error"));
            println!();
            print_history(&view.series);
            return;
        }
    };

    if let Some(change) = view.next_period_change() {
        println!("  Next month:     {:+.2}%", change);
    }
    println!();
    println!(
        "{} forecast, {:.0}% interval",
        forecast.order(),
        forecast.confidence() * 100.0
    );
    println!("  {:<15} {:>14} {:>14} {:>14}", "Month", "Predicted", "Lower", "Upper");
    for row in forecast_rows(forecast) {
        println!(
            "  {:<15} {:>14} {:>14} {:>14}",
            format_month_year(row.month),
            rupees(row.predicted),
            rupees(row.lower),
            rupees(row.upper)
        );
    }

    let diagnostics = forecast.diagnostics();
    println!();
    println!("Model statistics");
    println!("  AIC:            {:.2}", diagnostics.aic);
    println!("  BIC:            {:.2}", diagnostics.bic);
    println!("  Log likelihood: {:.2}", diagnostics.log_likelihood);
}

#[cfg(test)]
mod tests {
    use super::*;
    use price_forecast::series::SeriesBuilder;
    use std::sync::Arc;

    fn dashboard(text: &str) -> Dashboard {
        let store = DataLoader::from_csv_str(text).unwrap();
        let catalog = Arc::new(SeriesBuilder::build(&store).unwrap());
        Dashboard::new(catalog, DashboardConfig::default())
    }

    #[test]
    fn test_degraded_forecast_writes_nothing() {
        let dashboard = dashboard(
            "Crop,Year,Month,Price,Market\n\
             Moong,2024,January,1500,Kurnool\n\
             Moong,2024,February,1620,Kurnool\n\
             Moong,2024,March,1580,Kurnool\n",
        );
        let view = dashboard.analyze("moong", 3, ModelOrder::new(0, 1, 0)).unwrap();
        assert!(view.is_degraded());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moong.csv");
        assert_eq!(write_forecast_output(&view, path.clone()).unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_forecast_written_into_directory() {
        let rows: String = (1..=12)
            .map(|m| format!("Rice,2024,{},{},AP\n", month_name(m), 2000 + 37 * (m % 5)))
            .collect();
        let dashboard = dashboard(&format!("Crop,Year,Month,Price,Market\n{}", rows));
        let view = dashboard.analyze("rice", 3, ModelOrder::new(0, 1, 0)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let written = write_forecast_output(&view, dir.path().to_path_buf())
            .unwrap()
            .unwrap();
        assert!(written.starts_with(dir.path()));
        assert!(written
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("rice_price_forecast_"));
    }

    fn month_name(m: u32) -> &'static str {
        [
            "January", "February", "March", "April", "May", "June", "July", "August", "September",
            "October", "November", "December",
        ][m as usize - 1]
    }

    #[test]
    fn test_rupees() {
        assert_eq!(rupees(2331.0), "Rs 2,331.00");
        assert_eq!(rupees(1234567.891), "Rs 1,234,567.89");
        assert_eq!(rupees(999.5), "Rs 999.50");
        assert_eq!(rupees(-42.0), "-Rs 42.00");
        assert_eq!(rupees(-0.001), "Rs 0.00");
        assert_eq!(rupees(-0.005001), "-Rs 0.01");
    }
}
