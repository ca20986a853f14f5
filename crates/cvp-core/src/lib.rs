#![deny(warnings)]

//! Core domain records and invariants for cost-volume-profit analysis.
//!
//! This crate defines the serializable input snapshot consumed by the engine,
//! the result records it produces, and validation helpers that guarantee the
//! input domain before any arithmetic runs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Promotional messaging campaign parameters.
///
/// Rates are fractions, e.g. `0.85` means 85%.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CampaignInput {
    /// Number of outbound messages sent.
    pub messages_sent: u64,
    /// Share of messages delivered, in [0,1].
    pub delivery_rate: Decimal,
    /// Share of delivered messages that convert to a paying customer, in [0,1].
    pub conversion_rate: Decimal,
    /// Cost of sending one message.
    pub cost_per_message: Decimal,
    /// Discount granted to converted customers, in [0,1].
    pub promotional_discount: Decimal,
}

impl Default for CampaignInput {
    fn default() -> Self {
        Self {
            messages_sent: 0,
            delivery_rate: Decimal::new(85, 2),
            conversion_rate: Decimal::new(2, 2),
            cost_per_message: Decimal::ZERO,
            promotional_discount: Decimal::ZERO,
        }
    }
}

/// One input snapshot for a CVP computation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvpInput {
    /// Fixed operating costs for the period.
    pub fixed_costs: Decimal,
    /// Average variable cost per unit (basket).
    pub variable_cost_per_unit: Decimal,
    /// Average selling price per unit (basket value).
    pub avg_price_per_unit: Decimal,
    /// Profit goal for the period.
    pub target_profit: Decimal,
    /// Campaign parameters, when a campaign is modeled.
    pub campaign: Option<CampaignInput>,
}

impl CvpInput {
    /// Price minus variable cost per unit. May be zero or negative.
    pub fn contribution_margin(&self) -> Decimal {
        self.avg_price_per_unit - self.variable_cost_per_unit
    }
}

/// Break-even and target-profit figures at full price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CvpResult {
    /// Undiscounted margin per unit (> 0 for any successful computation).
    pub contribution_margin: Decimal,
    /// Units at which revenue equals total cost.
    pub break_even_volume: Decimal,
    /// Units needed to reach the target profit.
    pub target_volume: Decimal,
    pub break_even_revenue: Decimal,
    pub target_revenue: Decimal,
}

/// Campaign-adjusted figures: regular customers needed once the converted
/// customers' contribution has been credited against the target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignResult {
    /// Price paid by converted customers.
    pub discounted_price: Decimal,
    /// Expected converted customers (fractional).
    pub converted_customers: Decimal,
    /// Messages sent times cost per message.
    pub marketing_cost: Decimal,
    /// Discounted price minus variable cost per unit.
    pub campaign_margin: Decimal,
    /// Converted customers times campaign margin.
    pub campaign_contribution: Decimal,
    /// Converted customers times discounted price.
    pub campaign_revenue: Decimal,
    /// Fixed costs plus marketing cost plus target profit.
    pub grand_total: Decimal,
    /// Grand total not covered by the campaign, never negative.
    pub remaining_required: Decimal,
    /// Full-price customers needed to cover the remainder.
    pub regular_customers_needed: Decimal,
    /// Regular plus converted customers.
    pub total_volume: Decimal,
    /// Blended revenue of regular and converted customers.
    pub total_revenue: Decimal,
    /// Break-even restated with marketing cost as an extra fixed cost.
    pub adjusted_break_even_volume: Decimal,
}

/// Bounds applied when validating an input snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationLimits {
    /// Highest accepted conversion rate.
    pub max_conversion_rate: Decimal,
}

impl ValidationLimits {
    /// Caps conversion at 10%.
    pub fn strict() -> Self {
        Self {
            max_conversion_rate: Decimal::new(10, 2),
        }
    }
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_conversion_rate: Decimal::ONE,
        }
    }
}

/// Validation errors for the input domain.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Currency amounts must be non-negative.
    #[error("{field} must not be negative")]
    NegativeMoney { field: &'static str },
    /// Fractions must lie within [0, 1].
    #[error("{field} must be within [0,1], got {value}")]
    RateOutOfRange { field: &'static str, value: Decimal },
    /// Conversion rate exceeds the configured cap.
    #[error("conversion rate {value} exceeds the accepted maximum of {cap}")]
    ConversionRateAboveCap { value: Decimal, cap: Decimal },
}

fn non_negative(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney { field });
    }
    Ok(())
}

fn unit_fraction(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ValidationError::RateOutOfRange { field, value });
    }
    Ok(())
}

/// Validate campaign parameters.
pub fn validate_campaign(
    c: &CampaignInput,
    limits: &ValidationLimits,
) -> Result<(), ValidationError> {
    unit_fraction("delivery_rate", c.delivery_rate)?;
    unit_fraction("conversion_rate", c.conversion_rate)?;
    unit_fraction("promotional_discount", c.promotional_discount)?;
    non_negative("cost_per_message", c.cost_per_message)?;
    if c.conversion_rate > limits.max_conversion_rate {
        return Err(ValidationError::ConversionRateAboveCap {
            value: c.conversion_rate,
            cap: limits.max_conversion_rate,
        });
    }
    debug!(messages = c.messages_sent, "campaign input validated");
    Ok(())
}

/// Validate the full-price fields of an input snapshot, ignoring the campaign.
pub fn validate_base(input: &CvpInput) -> Result<(), ValidationError> {
    non_negative("fixed_costs", input.fixed_costs)?;
    non_negative("variable_cost_per_unit", input.variable_cost_per_unit)?;
    non_negative("avg_price_per_unit", input.avg_price_per_unit)?;
    non_negative("target_profit", input.target_profit)
}
