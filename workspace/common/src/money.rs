//! Display formatting for decimal amounts.
//!
//! Amounts are always shown with exactly two fractional digits, grouped in
//! thousands, with separators chosen by the configured locale.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Locale controlling number separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// `1 234,56` (non-breaking space, comma)
    #[default]
    Ru,
    /// `1,234.56`
    En,
}

impl Locale {
    pub fn number_format(&self) -> NumberFormat {
        match self {
            Locale::Ru => NumberFormat {
                group_separator: '\u{a0}',
                decimal_separator: ',',
            },
            Locale::En => NumberFormat {
                group_separator: ',',
                decimal_separator: '.',
            },
        }
    }
}

/// Separators used when rendering an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub group_separator: char,
    pub decimal_separator: char,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Locale::default().number_format()
    }
}

/// Formats `value` with two decimals and locale separators, e.g. `-1 234,50`.
pub fn format_amount(value: Decimal, format: &NumberFormat) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut out = String::with_capacity(digits.len() + int_part.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(format.group_separator);
        }
        out.push(ch);
    }
    out.push(format.decimal_separator);
    out.push_str(frac_part);
    out
}

/// Formats the magnitude of `value` behind an explicit `+` or `-` sign.
pub fn format_signed(value: Decimal, positive: bool, format: &NumberFormat) -> String {
    let sign = if positive { '+' } else { '-' };
    format!("{}{}", sign, format_amount(value.abs(), format))
}

/// Formats a balance: `+` for zero and above, the usual `-` below zero.
pub fn format_balance(value: Decimal, format: &NumberFormat) -> String {
    if value.is_sign_negative() && !value.is_zero() {
        format_amount(value, format)
    } else {
        format!("+{}", format_amount(value, format))
    }
}
