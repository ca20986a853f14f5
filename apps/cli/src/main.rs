#![deny(warnings)]

//! Headless CLI: load a scenario, run the CVP engine and print the results.

use anyhow::{bail, Context, Result};
use cvp_core::{CampaignInput, CvpInput, ValidationLimits};
use cvp_engine::{render, CvpError, DisplayConfig, Level, Message};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Scenario file: the input snapshot plus presentation options.
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct Scenario {
    #[serde(flatten)]
    input: CvpInput,
    display: DisplayConfig,
    /// Cap conversion at 10% instead of 100%.
    strict_conversion: bool,
    /// Keys matching none of the above; a non-empty map is a typo.
    #[serde(flatten)]
    unknown: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Default, PartialEq)]
struct Args {
    scenario: Option<PathBuf>,
    strict_conversion: bool,
    chart_out: Option<PathBuf>,
    json: bool,
    explain: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Args {
    let mut parsed = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => parsed.scenario = it.next().map(PathBuf::from),
            "--chart-out" => parsed.chart_out = it.next().map(PathBuf::from),
            "--strict-conversion" => parsed.strict_conversion = true,
            "--json" => parsed.json = true,
            "--explain" => parsed.explain = true,
            _ => {}
        }
    }
    parsed
}

fn builtin_scenario() -> Scenario {
    Scenario {
        input: CvpInput {
            fixed_costs: Decimal::new(10_000, 0),
            variable_cost_per_unit: Decimal::new(30, 0),
            avg_price_per_unit: Decimal::new(80, 0),
            target_profit: Decimal::new(5_000, 0),
            campaign: Some(CampaignInput {
                messages_sent: 10_000,
                delivery_rate: Decimal::new(85, 2),
                conversion_rate: Decimal::new(2, 2),
                cost_per_message: Decimal::new(10, 2),
                promotional_discount: Decimal::new(10, 2),
            }),
        },
        display: DisplayConfig::default(),
        strict_conversion: false,
        unknown: BTreeMap::new(),
    }
}

fn parse_scenario(text: &str) -> Result<Scenario> {
    let scenario: Scenario = serde_yaml::from_str(text)?;
    if !scenario.unknown.is_empty() {
        let keys: Vec<&str> = scenario.unknown.keys().map(String::as_str).collect();
        bail!("unknown scenario keys: {}", keys.join(", "));
    }
    Ok(scenario)
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    parse_scenario(&text).with_context(|| format!("parsing scenario {}", path.display()))
}

fn section<T: Serialize>(outcome: &std::result::Result<T, CvpError>) -> Value {
    match outcome {
        Ok(v) => json!({ "ok": v }),
        Err(e) => json!({ "error": e.to_string() }),
    }
}

fn tag(level: Level) -> &'static str {
    match level {
        Level::Success => "ok",
        Level::Info => "info",
        Level::Error => "error",
    }
}

fn print_messages(messages: &[Message]) {
    for m in messages {
        println!("[{}] {}", tag(m.level), m.text);
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1));
    info!(scenario = ?args.scenario, strict = args.strict_conversion, "starting CLI");

    let mut scenario = match &args.scenario {
        Some(path) => load_scenario(path)?,
        None => builtin_scenario(),
    };
    if args.explain {
        scenario.display.show_overview = true;
    }
    let limits = if args.strict_conversion || scenario.strict_conversion {
        ValidationLimits::strict()
    } else {
        ValidationLimits::default()
    };

    let report = cvp_engine::analyze(&scenario.input, &limits);
    let messages = render(&report, &scenario.display);

    if args.json {
        let out = json!({
            "input": report.input,
            "base": section(&report.base),
            "campaign": report.campaign.as_ref().map(section),
            "messages": messages,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_messages(&messages);
    }

    if let Some(path) = &args.chart_out {
        let charts = report.charts(&scenario.display)?;
        std::fs::write(path, serde_json::to_string_pretty(&charts)?)
            .with_context(|| format!("writing charts to {}", path.display()))?;
        info!(path = %path.display(), charts = charts.len(), "chart data written");
    }

    Ok(())
}
