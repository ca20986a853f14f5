//! Number formatting shared by the text report and the currency axis.

use rust_decimal::{Decimal, RoundingStrategy};

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn sign(value: Decimal) -> &'static str {
    if value.is_sign_negative() && !value.is_zero() {
        "-"
    } else {
        ""
    }
}

/// Two decimals, half away from zero.
pub fn format_units(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{}{:.2}", sign(rounded), rounded.abs())
}

/// Two decimals with comma-grouped thousands, e.g. `24,000.00`.
pub fn format_amount(value: Decimal) -> String {
    let plain = format_units(value);
    let (sign, body) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    match body.split_once('.') {
        Some((int, frac)) => format!("{sign}{}.{frac}", group_digits(int)),
        None => format!("{sign}{}", group_digits(body)),
    }
}

/// Axis label in thousands of currency, truncated toward zero: `12,500` -> `12k ZAR`.
pub fn format_thousands(amount: Decimal, currency: &str) -> String {
    let k = (amount / Decimal::ONE_THOUSAND).trunc();
    let digits = k.abs().normalize().to_string();
    format!("{}{}k {currency}", sign(k), group_digits(&digits))
}
