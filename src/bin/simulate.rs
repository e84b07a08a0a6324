use std::error::Error;
use std::fs;

use chrono::Utc;
use csv::Writer;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use isodispatch::api::OsrmClient;
use isodispatch::{load_hospitals, DispatchConfig, DynamicSimulator, ScenarioConfig};

const HOSPITALS_FILE: &str = "data/hospitals.json";
const LOG_FILE: &str = "simulation_log.md";
const CURVE_FILE: &str = "output/decay_curve.csv";

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

    let hospitals = load_hospitals(HOSPITALS_FILE)?;
    let router = OsrmClient::from_env();
    let simulator = DynamicSimulator::new(
        hospitals,
        &router,
        DispatchConfig::default(),
        ScenarioConfig::default(),
    )?;

    let report = simulator.run_scenario().await?;

    println!("{}", report.narrative);

    let log = format!(
        "{}\n*Generated: {}*\n",
        report.narrative,
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    );
    fs::write(LOG_FILE, log)?;
    info!("simulation log written to {LOG_FILE}");

    fs::create_dir_all("output")?;
    save_decay_curve(&report.decay_curve, report.ignorant_arrival_min, CURVE_FILE)?;
    info!("decay curve samples written to {CURVE_FILE}");

    Ok(())
}

fn save_decay_curve(
    curve: &[(f64, f64)],
    ignorant_arrival_min: f64,
    filename: &str,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_path(filename)?;

    wtr.write_record(["minute", "activity_pct", "ignorant_arrival_min"])?;
    for (minute, activity) in curve {
        wtr.write_record(&[
            minute.to_string(),
            activity.to_string(),
            ignorant_arrival_min.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
