use std::env;
use std::error::Error;
use std::fs;

use colored::*;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use isodispatch::api::{OsrmClient, TransitClient};
use isodispatch::{load_hospitals, DispatchConfig, LatLon, Optimizer, PlanPayload};

const HOSPITALS_FILE: &str = "data/hospitals.json";
const OUTPUT_FILE: &str = "output/routes.json";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            fmt::layer()
                .with_span_events(fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE)
                .pretty(),
        )
        .init();

    dotenv().ok();

    let avoid_point = parse_avoid_arg()?;
    let hospitals = load_hospitals(HOSPITALS_FILE)?;
    info!(
        "loaded {} locations, {} vehicle fleet",
        hospitals.len(),
        DispatchConfig::default().num_vehicles
    );

    let router = OsrmClient::from_env();
    let transit = TransitClient::from_env();

    let mut optimizer = Optimizer::new(
        hospitals,
        &router,
        transit.as_ref(),
        DispatchConfig::default(),
    )
    .await?;
    let payload = optimizer.solve_and_report(avoid_point).await?;

    print_summary(&payload);

    fs::create_dir_all("output")?;
    fs::write(OUTPUT_FILE, serde_json::to_string_pretty(&payload)?)?;
    info!("plan written to {OUTPUT_FILE}");

    Ok(())
}

/// Optional `--avoid lat,lon` argument marking a road closure.
fn parse_avoid_arg() -> Result<Option<LatLon>, Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    let Some(pos) = args.iter().position(|a| a == "--avoid") else {
        return Ok(None);
    };
    let raw = args
        .get(pos + 1)
        .ok_or("--avoid requires a lat,lon argument")?;
    let (lat, lon) = raw
        .split_once(',')
        .ok_or("--avoid expects the form lat,lon")?;
    Ok(Some(LatLon::new(
        lat.trim().parse::<f64>()?,
        lon.trim().parse::<f64>()?,
    )))
}

fn print_summary(payload: &PlanPayload) {
    for route in &payload.routes {
        let deliveries = route.steps.iter().filter(|s| !s.is_depot()).count();
        println!(
            "Van {} | {} deliveries, {} canceled, avg potency {}",
            route.vehicle_id,
            deliveries,
            route.canceled.len(),
            colorize_potency(route.avg_potency),
        );
        for step in &route.steps {
            if step.is_depot() {
                continue;
            }
            println!(
                "    T+{:>4} min  {}  {}",
                step.arrival_time_min,
                colorize_potency(step.potency),
                step.name
            );
        }
        for step in &route.canceled {
            println!(
                "    {} {} (would arrive T+{} at {:.1}%)",
                "CANCELED".red().bold(),
                step.name,
                step.arrival_time_min,
                step.potency
            );
        }
    }

    let analytics = &payload.analytics;
    println!(
        "{}",
        format_args!(
            "Fleet: {} served, avg potency {:.1}%, {} cardiac-ready, ${:.0} preserved",
            analytics.fleet_stops_served,
            analytics.fleet_avg_potency,
            analytics.clinical_outcomes.cardiac_ready,
            analytics.financial.total_preserved_value
        )
        .to_string()
        .green()
    );
}

fn colorize_potency(potency: f64) -> ColoredString {
    let label = format!("{potency:>5.1}%");
    if potency >= 70.0 {
        label.green()
    } else if potency >= 35.0 {
        label.yellow()
    } else {
        label.red()
    }
}
