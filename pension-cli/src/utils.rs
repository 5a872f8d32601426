use chrono::NaiveDate;
use pension_core::calculations::common::{round_half_up, round_percentage_for_display};
use rust_decimal::{Decimal, RoundingStrategy};

/// Formats an amount as Spanish euros, e.g. `1.234,56 €`.
///
/// Rounds half away from zero to cents; thousands are grouped with dots.
pub fn format_euros(amount: Decimal) -> String {
    let rounded = round_half_up(amount);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped},{cents} €")
}

/// Formats a percentage with one decimal, e.g. `97.8%`.
pub fn format_percentage(value: Decimal) -> String {
    format!("{:.1}%", round_percentage_for_display(value))
}

/// Formats a date as `dd/mm/yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Contribution days as years with one decimal, e.g. `36.0`.
pub fn days_as_years(days: i32) -> String {
    let years = Decimal::from(days) / Decimal::from(365);
    format!(
        "{:.1}",
        years.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    )
}
