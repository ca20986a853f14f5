//! Chart data for the plotting layer.
//!
//! Each chart is keyed by a unit-volume axis and a currency axis labelled in
//! thousands. The plotting layer only draws; every value is computed here.

use crate::format::format_thousands;
use crate::report::DisplayConfig;
use crate::{add, mul, CvpError};
use cvp_core::{CampaignResult, CvpInput, CvpResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// Units drawn past the furthest volume of interest.
pub const HEADROOM_UNITS: u64 = 100;

/// Upper limit on points per series; wider domains are sampled evenly.
pub const MAX_POINTS: u64 = 10_001;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// A curve sampled at every point of [`ChartSpec::volumes`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub color: String,
    pub style: LineStyle,
    pub values: Vec<Decimal>,
}

/// Horizontal line at a currency amount.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub label: String,
    pub color: String,
    pub style: LineStyle,
    pub amount: Decimal,
}

/// Vertical line from the volume axis up to a (volume, amount) point, e.g. break-even.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Marker {
    pub label: String,
    pub color: String,
    pub style: LineStyle,
    pub volume: Decimal,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Currency shown on the y axis.
    pub currency: String,
    pub volumes: Vec<u64>,
    pub series: Vec<Series>,
    pub reference_lines: Vec<ReferenceLine>,
    pub markers: Vec<Marker>,
}

impl ChartSpec {
    /// Y-axis tick label in thousands of the chart currency.
    pub fn y_tick_label(&self, amount: Decimal) -> String {
        format_thousands(amount, &self.currency)
    }

    pub fn series(&self, label: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.label == label)
    }
}

/// Volume axis `0..=ceil(volume) + HEADROOM_UNITS`.
///
/// Domains wider than [`MAX_POINTS`] are sampled with a constant stride; the
/// upper bound is always the last point.
pub fn volume_domain(volume: Decimal) -> Result<Vec<u64>, CvpError> {
    let top = volume
        .max(Decimal::ZERO)
        .ceil()
        .to_u64()
        .and_then(|v| v.checked_add(HEADROOM_UNITS))
        .ok_or(CvpError::Overflow {
            step: "chart volume domain",
        })?;
    let stride = top.div_ceil(MAX_POINTS - 1).max(1);
    let mut volumes: Vec<u64> = (0..=top).step_by(stride as usize).collect();
    if volumes.last() != Some(&top) {
        volumes.push(top);
    }
    Ok(volumes)
}

fn cost_curve(fixed: Decimal, unit_cost: Decimal, volumes: &[u64]) -> Result<Vec<Decimal>, CvpError> {
    volumes
        .iter()
        .map(|&v| add(fixed, mul(unit_cost, Decimal::from(v), "variable cost")?, "total cost"))
        .collect()
}

fn line(label: &str, color: &str, style: LineStyle, values: Vec<Decimal>) -> Series {
    Series {
        label: label.to_string(),
        color: color.to_string(),
        style,
        values,
    }
}

fn level(label: &str, color: &str, amount: Decimal) -> ReferenceLine {
    ReferenceLine {
        label: label.to_string(),
        color: color.to_string(),
        style: LineStyle::Dashed,
        amount,
    }
}

fn marker(label: &str, color: &str, volume: Decimal, amount: Decimal) -> Marker {
    Marker {
        label: label.to_string(),
        color: color.to_string(),
        style: LineStyle::Dashed,
        volume,
        amount,
    }
}

fn axis_labels(display: &DisplayConfig) -> (String, String) {
    (
        format!("Sales Volume ({})", display.unit_label),
        format!("Amount ({})", display.currency),
    )
}

/// Cost and revenue curves at full price with break-even and target markers.
pub fn base_chart(
    input: &CvpInput,
    base: &CvpResult,
    display: &DisplayConfig,
) -> Result<ChartSpec, CvpError> {
    let volumes = volume_domain(base.target_volume)?;
    let costs = cost_curve(input.fixed_costs, input.variable_cost_per_unit, &volumes)?;
    let revenue = volumes
        .iter()
        .map(|&v| mul(input.avg_price_per_unit, Decimal::from(v), "sales revenue"))
        .collect::<Result<Vec<_>, _>>()?;
    let (x_label, y_label) = axis_labels(display);
    debug!(points = volumes.len(), "base chart built");

    Ok(ChartSpec {
        title: "Cost-Volume-Profit Analysis (Normal Sales Cycle)".to_string(),
        x_label,
        y_label,
        currency: display.currency.clone(),
        volumes,
        series: vec![
            line("Total Costs (Fixed + Variable)", "red", LineStyle::Solid, costs),
            line("Sales Revenue", "green", LineStyle::Solid, revenue),
        ],
        reference_lines: vec![
            level("Fixed Costs", "blue", input.fixed_costs),
            level("Break-even Revenue", "black", base.break_even_revenue),
            level("Target Revenue", "orange", base.target_revenue),
        ],
        markers: vec![
            marker(
                "Break-even",
                "black",
                base.break_even_volume,
                base.break_even_revenue,
            ),
            marker(
                "Target Profit",
                "orange",
                base.target_volume,
                base.target_revenue,
            ),
        ],
    })
}

/// Costs including marketing spend against the blended campaign revenue level.
pub fn campaign_chart(
    input: &CvpInput,
    campaign: &CampaignResult,
    display: &DisplayConfig,
) -> Result<ChartSpec, CvpError> {
    let volumes = volume_domain(campaign.total_volume)?;
    let fixed = add(
        input.fixed_costs,
        campaign.marketing_cost,
        "fixed plus marketing",
    )?;
    let costs = cost_curve(fixed, input.variable_cost_per_unit, &volumes)?;
    let revenue = vec![campaign.total_revenue; volumes.len()];
    let adjusted_revenue = mul(
        campaign.adjusted_break_even_volume,
        input.avg_price_per_unit,
        "adjusted break-even revenue",
    )?;
    let (x_label, y_label) = axis_labels(display);
    debug!(points = volumes.len(), "campaign chart built");

    Ok(ChartSpec {
        title: "Cost-Volume-Profit Analysis (With Promotional Campaign)".to_string(),
        x_label,
        y_label,
        currency: display.currency.clone(),
        volumes,
        series: vec![
            line(
                "Total Costs (Fixed + Variable + Marketing)",
                "red",
                LineStyle::Solid,
                costs,
            ),
            line("Sales Revenue", "green", LineStyle::Solid, revenue),
        ],
        reference_lines: vec![
            level("Fixed + Marketing Costs", "blue", fixed),
            level("Break-even Revenue", "black", adjusted_revenue),
            level("Target Revenue", "orange", campaign.total_revenue),
        ],
        markers: vec![
            marker(
                "Adjusted Break-even",
                "black",
                campaign.adjusted_break_even_volume,
                adjusted_revenue,
            ),
            marker(
                "Target Profit",
                "orange",
                campaign.total_volume,
                campaign.total_revenue,
            ),
        ],
    })
}
