//! Human-readable success and error lines for one analysis run.

use crate::format::{format_amount, format_units};
use crate::{CvpError, CvpReport, MarginKind};
use cvp_core::{CampaignResult, CvpResult};
use serde::{Deserialize, Serialize};

/// Labels used when rendering figures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Currency code printed next to amounts.
    pub currency: String,
    /// Plural name of one sold unit.
    pub unit_label: String,
    /// Open the report with the key-terms explainer.
    pub show_overview: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency: "ZAR".to_string(),
            unit_label: "baskets".to_string(),
            show_overview: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Success,
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Message {
    pub level: Level,
    pub text: String,
}

impl Message {
    fn success(text: String) -> Self {
        Self {
            level: Level::Success,
            text,
        }
    }

    fn info(text: &str) -> Self {
        Self {
            level: Level::Info,
            text: text.to_string(),
        }
    }
}

/// Key terms and the formulas behind every figure in the report.
pub fn overview() -> Vec<Message> {
    [
        "CVP analysis shows how costs and sales volume drive profit: the break-even \
         point and the volume needed for a target profit.",
        "Contribution margin = average price per unit - variable cost per unit.",
        "Break-even volume = fixed costs / contribution margin.",
        "Target volume = (fixed costs + target profit) / contribution margin.",
        "With a campaign, converted customers pay the discounted price; regular \
         customers cover (fixed costs + marketing costs + target profit - campaign \
         contribution) at the full contribution margin.",
    ]
    .into_iter()
    .map(Message::info)
    .collect()
}

fn diagnostic(err: &CvpError) -> Message {
    let text = match err {
        CvpError::NonPositiveMargin {
            kind: MarginKind::Base,
            ..
        } => "Contribution margin is zero or negative. Please ensure that the average basket \
              value is greater than the variable cost."
            .to_string(),
        CvpError::NonPositiveMargin {
            kind: MarginKind::Campaign,
            ..
        } => "Campaign contribution margin is zero or negative. Please ensure that the \
              discounted basket value is greater than the variable cost."
            .to_string(),
        other => format!("Cannot compute: {other}."),
    };
    Message {
        level: Level::Error,
        text,
    }
}

fn base_lines(b: &CvpResult, d: &DisplayConfig, out: &mut Vec<Message>) {
    let unit = &d.unit_label;
    let cur = &d.currency;
    out.push(Message::success(format!(
        "Break-even volume: {} {unit}",
        format_units(b.break_even_volume)
    )));
    out.push(Message::success(format!(
        "Volume to achieve total profit goal: {} {unit}",
        format_units(b.target_volume)
    )));
    out.push(Message::success(format!(
        "Total revenue to achieve profit goal: {cur} {}",
        format_amount(b.target_revenue)
    )));
}

fn campaign_lines(c: &CampaignResult, d: &DisplayConfig, out: &mut Vec<Message>) {
    let unit = &d.unit_label;
    let cur = &d.currency;
    out.push(Message {
        level: Level::Info,
        text: format!(
            "Number of converted messages: {}",
            format_units(c.converted_customers)
        ),
    });
    let lines = [
        format!("Marketing Costs: {cur} {}", format_amount(c.marketing_cost)),
        format!(
            "Grand Total (Fixed Costs + Marketing Costs + Target Profit): {cur} {}",
            format_amount(c.grand_total)
        ),
        format!(
            "Campaign Sales Contribution: {cur} {}",
            format_amount(c.campaign_contribution)
        ),
        format!(
            "Remaining Grand Total after Campaign Sales Contribution: {cur} {}",
            format_amount(c.remaining_required)
        ),
        format!(
            "Remaining Regular Sales Needed: {}",
            format_units(c.regular_customers_needed)
        ),
        format!(
            "Total Sales (Regular + Campaign Converted): {}",
            format_units(c.total_volume)
        ),
        format!(
            "Total revenue (Regular + Campaign Converted): {cur} {}",
            format_amount(c.total_revenue)
        ),
        format!(
            "Break-even volume including marketing costs: {} {unit}",
            format_units(c.adjusted_break_even_volume)
        ),
    ];
    out.extend(lines.into_iter().map(Message::success));
}

/// Render the report as ordered lines. A failed section yields one error line
/// and none of its figures; a failed base section also suppresses the campaign.
pub fn render(report: &CvpReport, display: &DisplayConfig) -> Vec<Message> {
    let mut out = if display.show_overview {
        overview()
    } else {
        Vec::new()
    };
    match &report.base {
        Ok(b) => base_lines(b, display, &mut out),
        Err(e) => {
            out.push(diagnostic(e));
            return out;
        }
    }
    match &report.campaign {
        Some(Ok(c)) => campaign_lines(c, display, &mut out),
        Some(Err(e)) => out.push(diagnostic(e)),
        None => {}
    }
    out
}
