#![deny(warnings)]

//! Cost-volume-profit engine.
//!
//! Pure functions mapping one [`CvpInput`] snapshot to break-even and
//! target-profit figures, with a campaign-adjusted variant that splits the
//! required sales volume into full-price regular customers and discounted
//! campaign-converted customers.
//!
//! All arithmetic is checked; nothing here divides by a margin that has not
//! been confirmed strictly positive.

pub mod chart;
pub mod format;
pub mod report;

use cvp_core::{
    validate_base, validate_campaign, CampaignResult, CvpInput, CvpResult, ValidationError,
    ValidationLimits,
};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

pub use chart::{ChartSpec, LineStyle, Marker, ReferenceLine, Series};
pub use report::{overview, render, DisplayConfig, Level, Message};

/// Which contribution margin a computation depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarginKind {
    /// Full price minus variable cost.
    Base,
    /// Discounted price minus variable cost.
    Campaign,
}

impl fmt::Display for MarginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginKind::Base => f.write_str("base"),
            MarginKind::Campaign => f.write_str("campaign"),
        }
    }
}

/// Errors produced by the engine.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CvpError {
    /// Every volume formula divides by the margin; zero or negative is undefined.
    #[error("{kind} contribution margin is zero or negative ({margin})")]
    NonPositiveMargin { kind: MarginKind, margin: Decimal },
    /// Input outside its valid domain.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// Campaign figures were requested for an input without a campaign.
    #[error("input has no campaign")]
    NoCampaign,
    /// A checked decimal operation overflowed.
    #[error("numeric overflow while computing {step}")]
    Overflow { step: &'static str },
}

pub(crate) fn add(a: Decimal, b: Decimal, step: &'static str) -> Result<Decimal, CvpError> {
    a.checked_add(b).ok_or(CvpError::Overflow { step })
}

pub(crate) fn sub(a: Decimal, b: Decimal, step: &'static str) -> Result<Decimal, CvpError> {
    a.checked_sub(b).ok_or(CvpError::Overflow { step })
}

pub(crate) fn mul(a: Decimal, b: Decimal, step: &'static str) -> Result<Decimal, CvpError> {
    a.checked_mul(b).ok_or(CvpError::Overflow { step })
}

// Callers guarantee a strictly positive divisor.
fn div(a: Decimal, b: Decimal, step: &'static str) -> Result<Decimal, CvpError> {
    a.checked_div(b).ok_or(CvpError::Overflow { step })
}

fn positive_margin(kind: MarginKind, margin: Decimal) -> Result<Decimal, CvpError> {
    if margin <= Decimal::ZERO {
        warn!(%kind, %margin, "rejecting non-positive contribution margin");
        return Err(CvpError::NonPositiveMargin { kind, margin });
    }
    Ok(margin)
}

/// Break-even and target-profit volumes and revenues at full price.
///
/// Fails with [`CvpError::NonPositiveMargin`] when the average price does not
/// exceed the variable cost; no partial figures are produced in that case.
pub fn compute_base(input: &CvpInput) -> Result<CvpResult, CvpError> {
    validate_base(input)?;
    let margin = positive_margin(MarginKind::Base, input.contribution_margin())?;

    let break_even_volume = div(input.fixed_costs, margin, "break-even volume")?;
    let target_volume = div(
        add(input.fixed_costs, input.target_profit, "target funding")?,
        margin,
        "target volume",
    )?;
    let break_even_revenue = mul(
        break_even_volume,
        input.avg_price_per_unit,
        "break-even revenue",
    )?;
    let target_revenue = mul(target_volume, input.avg_price_per_unit, "target revenue")?;

    debug!(
        %margin,
        %break_even_volume,
        %target_volume,
        %target_revenue,
        "base CVP computed"
    );
    Ok(CvpResult {
        contribution_margin: margin,
        break_even_volume,
        target_volume,
        break_even_revenue,
        target_revenue,
    })
}

/// Campaign-adjusted figures using target-deficit decomposition.
///
/// Converted customers contribute at the discounted margin; whatever part of
/// `fixed_costs + marketing_cost + target_profit` they leave uncovered is
/// filled by regular customers at the full-price margin. The uncovered part is
/// clamped at zero, so an over-performing campaign never yields negative
/// regular customers.
///
/// `base` must come from a successful [`compute_base`] on the same input.
pub fn compute_campaign(
    input: &CvpInput,
    base: &CvpResult,
    limits: &ValidationLimits,
) -> Result<CampaignResult, CvpError> {
    let margin = positive_margin(MarginKind::Base, base.contribution_margin)?;
    let campaign = input.campaign.as_ref().ok_or(CvpError::NoCampaign)?;
    validate_campaign(campaign, limits)?;

    let discounted_price = mul(
        input.avg_price_per_unit,
        Decimal::ONE - campaign.promotional_discount,
        "discounted price",
    )?;
    let messages = Decimal::from(campaign.messages_sent);
    let converted_customers = mul(
        mul(messages, campaign.delivery_rate, "delivered messages")?,
        campaign.conversion_rate,
        "converted customers",
    )?;
    let marketing_cost = mul(messages, campaign.cost_per_message, "marketing cost")?;

    let campaign_margin = positive_margin(
        MarginKind::Campaign,
        discounted_price - input.variable_cost_per_unit,
    )?;
    let campaign_contribution = mul(
        converted_customers,
        campaign_margin,
        "campaign contribution",
    )?;
    let campaign_revenue = mul(converted_customers, discounted_price, "campaign revenue")?;

    let fixed_with_marketing = add(input.fixed_costs, marketing_cost, "fixed plus marketing")?;
    let grand_total = add(fixed_with_marketing, input.target_profit, "grand total")?;
    let deficit = sub(grand_total, campaign_contribution, "remaining required")?;
    let remaining_required = if deficit < Decimal::ZERO {
        warn!(%deficit, "campaign covers the whole target; clamping remainder to zero");
        Decimal::ZERO
    } else {
        deficit
    };

    let regular_customers_needed = div(remaining_required, margin, "regular customers")?;
    let total_volume = add(
        regular_customers_needed,
        converted_customers,
        "total volume",
    )?;
    let total_revenue = add(
        mul(
            regular_customers_needed,
            input.avg_price_per_unit,
            "regular revenue",
        )?,
        campaign_revenue,
        "total revenue",
    )?;
    let adjusted_break_even_volume =
        div(fixed_with_marketing, margin, "adjusted break-even volume")?;

    debug!(
        %converted_customers,
        %marketing_cost,
        %grand_total,
        %remaining_required,
        %regular_customers_needed,
        %total_volume,
        "campaign CVP computed"
    );
    Ok(CampaignResult {
        discounted_price,
        converted_customers,
        marketing_cost,
        campaign_margin,
        campaign_contribution,
        campaign_revenue,
        grand_total,
        remaining_required,
        regular_customers_needed,
        total_volume,
        total_revenue,
        adjusted_break_even_volume,
    })
}

/// Outcome of one analysis run. The two sections fail independently.
#[derive(Clone, Debug, PartialEq)]
pub struct CvpReport {
    /// Snapshot the figures were derived from.
    pub input: CvpInput,
    pub base: Result<CvpResult, CvpError>,
    /// `None` when no campaign is modeled or the base section failed.
    pub campaign: Option<Result<CampaignResult, CvpError>>,
}

impl CvpReport {
    /// Chart specifications for every section that succeeded.
    pub fn charts(&self, display: &DisplayConfig) -> Result<Vec<ChartSpec>, CvpError> {
        let mut charts = Vec::new();
        if let Ok(base) = &self.base {
            charts.push(chart::base_chart(&self.input, base, display)?);
            if let Some(Ok(campaign)) = &self.campaign {
                charts.push(chart::campaign_chart(&self.input, campaign, display)?);
            }
        }
        Ok(charts)
    }
}

/// Run the base section, then the campaign section when one is modeled and
/// the base succeeded.
pub fn analyze(input: &CvpInput, limits: &ValidationLimits) -> CvpReport {
    let base = compute_base(input);
    let campaign = match (&base, &input.campaign) {
        (Ok(b), Some(_)) => Some(compute_campaign(input, b, limits)),
        _ => None,
    };
    CvpReport {
        input: input.clone(),
        base,
        campaign,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvp_core::CampaignInput;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn base_input() -> CvpInput {
        CvpInput {
            fixed_costs: dec!(10000),
            variable_cost_per_unit: dec!(30),
            avg_price_per_unit: dec!(80),
            target_profit: dec!(5000),
            campaign: None,
        }
    }

    fn campaign_input() -> CvpInput {
        CvpInput {
            campaign: Some(CampaignInput {
                messages_sent: 10_000,
                delivery_rate: dec!(0.85),
                conversion_rate: dec!(0.02),
                cost_per_message: dec!(0.10),
                promotional_discount: dec!(0.10),
            }),
            ..base_input()
        }
    }

    #[test]
    fn smartfoods_base_scenario() {
        let r = compute_base(&base_input()).unwrap();
        assert_eq!(r.contribution_margin, dec!(50));
        assert_eq!(r.break_even_volume, dec!(200));
        assert_eq!(r.target_volume, dec!(300));
        assert_eq!(r.break_even_revenue, dec!(16000));
        assert_eq!(r.target_revenue, dec!(24000));
    }

    #[test]
    fn smartfoods_campaign_scenario() {
        let input = campaign_input();
        let base = compute_base(&input).unwrap();
        let c = compute_campaign(&input, &base, &ValidationLimits::default()).unwrap();
        assert_eq!(c.converted_customers, dec!(170));
        assert_eq!(c.discounted_price, dec!(72));
        assert_eq!(c.marketing_cost, dec!(1000));
        assert_eq!(c.campaign_margin, dec!(42));
        assert_eq!(c.campaign_contribution, dec!(7140));
        assert_eq!(c.campaign_revenue, dec!(12240));
        assert_eq!(c.grand_total, dec!(16000));
        assert_eq!(c.remaining_required, dec!(8860));
        assert_eq!(c.regular_customers_needed, dec!(177.2));
        assert_eq!(c.total_volume, dec!(347.2));
        assert_eq!(c.total_revenue, dec!(26416));
        assert_eq!(c.adjusted_break_even_volume, dec!(220));
    }

    #[test]
    fn overperforming_campaign_clamps_remainder() {
        let mut input = campaign_input();
        if let Some(c) = input.campaign.as_mut() {
            c.messages_sent = 1_000_000;
            c.cost_per_message = dec!(0.001);
        }
        let base = compute_base(&input).unwrap();
        let c = compute_campaign(&input, &base, &ValidationLimits::default()).unwrap();
        assert!(c.campaign_contribution > c.grand_total);
        assert_eq!(c.remaining_required, Decimal::ZERO);
        assert_eq!(c.regular_customers_needed, Decimal::ZERO);
        assert_eq!(c.total_volume, c.converted_customers);
    }

    #[test]
    fn zero_fixed_costs_break_even_at_zero() {
        let input = CvpInput {
            fixed_costs: Decimal::ZERO,
            ..base_input()
        };
        let r = compute_base(&input).unwrap();
        assert_eq!(r.break_even_volume, Decimal::ZERO);
        assert_eq!(r.break_even_revenue, Decimal::ZERO);
    }

    #[test]
    fn non_positive_margin_rejected() {
        let mut input = base_input();
        input.avg_price_per_unit = dec!(30);
        assert_eq!(
            compute_base(&input),
            Err(CvpError::NonPositiveMargin {
                kind: MarginKind::Base,
                margin: Decimal::ZERO
            })
        );
        input.avg_price_per_unit = dec!(10);
        assert!(matches!(
            compute_base(&input),
            Err(CvpError::NonPositiveMargin {
                kind: MarginKind::Base,
                ..
            })
        ));
    }

    #[test]
    fn campaign_requires_successful_base() {
        let input = campaign_input();
        let forged = CvpResult {
            contribution_margin: Decimal::ZERO,
            break_even_volume: Decimal::ZERO,
            target_volume: Decimal::ZERO,
            break_even_revenue: Decimal::ZERO,
            target_revenue: Decimal::ZERO,
        };
        assert!(matches!(
            compute_campaign(&input, &forged, &ValidationLimits::default()),
            Err(CvpError::NonPositiveMargin {
                kind: MarginKind::Base,
                ..
            })
        ));
    }

    #[test]
    fn deep_discount_rejects_campaign_margin() {
        let mut input = campaign_input();
        if let Some(c) = input.campaign.as_mut() {
            c.promotional_discount = dec!(0.75);
        }
        let base = compute_base(&input).unwrap();
        assert_eq!(
            compute_campaign(&input, &base, &ValidationLimits::default()),
            Err(CvpError::NonPositiveMargin {
                kind: MarginKind::Campaign,
                margin: dec!(-10),
            })
        );
    }

    #[test]
    fn campaign_without_campaign_input() {
        let input = base_input();
        let base = compute_base(&input).unwrap();
        assert_eq!(
            compute_campaign(&input, &base, &ValidationLimits::default()),
            Err(CvpError::NoCampaign)
        );
    }

    #[test]
    fn negative_input_rejected_before_arithmetic() {
        let input = CvpInput {
            target_profit: dec!(-1),
            ..base_input()
        };
        assert!(matches!(compute_base(&input), Err(CvpError::Invalid(_))));
    }

    #[test]
    fn campaign_failure_keeps_base_result() {
        let mut input = campaign_input();
        if let Some(c) = input.campaign.as_mut() {
            c.conversion_rate = dec!(0.5);
        }
        let report = analyze(&input, &ValidationLimits::strict());
        assert_eq!(report.base, compute_base(&input));
        assert!(matches!(
            report.campaign,
            Some(Err(CvpError::Invalid(
                ValidationError::ConversionRateAboveCap { .. }
            )))
        ));
    }

    #[test]
    fn base_failure_skips_campaign() {
        let mut input = campaign_input();
        input.variable_cost_per_unit = dec!(90);
        let report = analyze(&input, &ValidationLimits::default());
        assert!(report.base.is_err());
        assert!(report.campaign.is_none());
        assert!(report.charts(&DisplayConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn analyze_is_idempotent() {
        let input = campaign_input();
        let a = analyze(&input, &ValidationLimits::default());
        let b = analyze(&input, &ValidationLimits::default());
        assert_eq!(a, b);
        assert_eq!(a.charts(&DisplayConfig::default()).unwrap().len(), 2);
    }

    #[test]
    fn overflow_is_reported_not_panicking() {
        let input = CvpInput {
            fixed_costs: Decimal::MAX,
            target_profit: Decimal::MAX,
            ..base_input()
        };
        assert!(matches!(
            compute_base(&input),
            Err(CvpError::Overflow { .. })
        ));
    }

    fn tolerance() -> Decimal {
        Decimal::new(1, 12)
    }

    proptest! {
        #[test]
        fn break_even_times_margin_recovers_fixed_costs(
            fixed in 0i64..100_000_000,
            vc in 0i64..50_000,
            extra in 1i64..50_000,
        ) {
            let input = CvpInput {
                fixed_costs: Decimal::new(fixed, 2),
                variable_cost_per_unit: Decimal::new(vc, 2),
                avg_price_per_unit: Decimal::new(vc + extra, 2),
                ..CvpInput::default()
            };
            let r = compute_base(&input).unwrap();
            let diff = (r.break_even_volume * r.contribution_margin - input.fixed_costs).abs();
            prop_assert!(diff <= tolerance());
        }

        #[test]
        fn target_never_below_break_even(
            fixed in 0i64..100_000_000,
            profit in 0i64..100_000_000,
            margin in 1i64..50_000,
        ) {
            let input = CvpInput {
                fixed_costs: Decimal::new(fixed, 2),
                variable_cost_per_unit: dec!(10),
                avg_price_per_unit: dec!(10) + Decimal::new(margin, 2),
                target_profit: Decimal::new(profit, 2),
                campaign: None,
            };
            let r = compute_base(&input).unwrap();
            prop_assert!(r.target_volume >= r.break_even_volume);
        }

        #[test]
        fn break_even_monotonic(
            fixed in 0i64..100_000_000,
            bump in 1i64..1_000_000,
            margin in 1i64..50_000,
        ) {
            let low = CvpInput {
                fixed_costs: Decimal::new(fixed, 2),
                variable_cost_per_unit: dec!(20),
                avg_price_per_unit: dec!(20) + Decimal::new(margin, 2),
                ..CvpInput::default()
            };
            let more_fixed = CvpInput { fixed_costs: low.fixed_costs + Decimal::new(bump, 2), ..low.clone() };
            let wider = CvpInput { avg_price_per_unit: low.avg_price_per_unit + Decimal::new(bump, 2), ..low.clone() };
            let r = compute_base(&low).unwrap();
            prop_assert!(compute_base(&more_fixed).unwrap().break_even_volume > r.break_even_volume);
            if fixed > 0 {
                prop_assert!(compute_base(&wider).unwrap().break_even_volume < r.break_even_volume);
            }
        }

        #[test]
        fn price_at_or_below_cost_always_rejected(vc in 0i64..100_000, below in 0i64..100_000) {
            let input = CvpInput {
                fixed_costs: dec!(1000),
                variable_cost_per_unit: Decimal::new(vc, 2),
                avg_price_per_unit: Decimal::new((vc - below).max(0), 2),
                ..CvpInput::default()
            };
            let is_margin_error = matches!(
                compute_base(&input),
                Err(CvpError::NonPositiveMargin { .. })
            );
            prop_assert!(is_margin_error);
        }

        #[test]
        fn campaign_revenue_identity(
            messages in 0u64..1_000_000,
            delivery in 0i64..=100,
            conversion in 0i64..=100,
            discount in 0i64..=50,
            cpm in 0i64..100,
        ) {
            let input = CvpInput {
                campaign: Some(CampaignInput {
                    messages_sent: messages,
                    delivery_rate: Decimal::new(delivery, 2),
                    conversion_rate: Decimal::new(conversion, 2),
                    cost_per_message: Decimal::new(cpm, 2),
                    promotional_discount: Decimal::new(discount, 2),
                }),
                ..base_input()
            };
            let base = compute_base(&input).unwrap();
            let c = compute_campaign(&input, &base, &ValidationLimits::default()).unwrap();
            prop_assert_eq!(
                c.total_revenue,
                c.regular_customers_needed * input.avg_price_per_unit
                    + c.converted_customers * c.discounted_price
            );
            prop_assert!(c.remaining_required >= Decimal::ZERO);
            prop_assert!(c.regular_customers_needed >= Decimal::ZERO);
            prop_assert_eq!(c.total_volume, c.regular_customers_needed + c.converted_customers);
        }
    }
}
