#![deny(warnings)]

//! Headless CLI: load an input bundle, validate it, compute the sales report
//! and write it as JSON.

mod config;

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Write;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use venue_core::{validate_bundle, validate_salary_settings, InputBundle};
use venue_sales::{compute_from_bundle, reconcile, ReconciliationResult};

use config::{parse_args, CliConfig};

fn main() -> Result<()> {
    // Logging setup; stdout is reserved for the report.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!(
            "venue-cli {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    validate_salary_settings(&config.salary_settings)?;

    let Some(input) = &args.input else {
        bail!("--input <bundle.json> is required");
    };
    let text = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let bundle: InputBundle =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", input.display()))?;
    validate_bundle(&bundle)?;
    let bundle = bundle.restrict_to_stores(&args.stores);

    let today = args.today.unwrap_or_else(|| chrono::Local::now().date_naive());
    let period = args.period(&config, today)?;
    info!(
        input = %input.display(),
        start = %period.start,
        end = %period.end,
        %today,
        stores = args.stores.len(),
        "starting CLI"
    );

    let report = compute_from_bundle(&bundle, period, today, &config.salary_settings);
    if let ReconciliationResult::Discrepancies(found) = reconcile(&report) {
        for d in &found {
            error!(check = d.check, expected = %d.expected, actual = %d.actual, "report does not reconcile");
        }
        bail!("report failed {} reconciliation check(s)", found.len());
    }

    let json = if config.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            println!(
                "KPI | {}..{} | events: {} | revenue: {} | variable: {} | fixed: {} | net: {}",
                period.start,
                period.end,
                report.total_events,
                report.total_revenue,
                report.total_variable_cost,
                report.total_fixed_cost,
                report.net_profit
            );
        }
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(json.as_bytes())?;
            out.write_all(b"\n")?;
        }
    }

    Ok(())
}
