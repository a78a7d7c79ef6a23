//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use chrono::{DateTime, Utc};

use aqua_dekor_core::{Price, StarFill, star_fills};

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(Utc::now().year())
}

/// Returns the content hash for main.css.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Format a price in rubles: `12 990 ₽`.
///
/// Accepts anything that displays as a decimal number; unparsable input is
/// passed through unchanged.
///
/// Usage in templates: `{{ product.price|rub }}`
#[askama::filter_fn]
pub fn rub(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let text = value.to_string();
    Ok(text
        .parse::<rust_decimal::Decimal>()
        .map_or(text, |amount| Price::new(amount).display()))
}

/// CSS classes for the five rating stars of a fractional rating.
///
/// Usage in templates: `{% for class in product.rating|stars %}`
#[askama::filter_fn]
pub fn stars(value: impl Display, _env: &dyn askama::Values) -> askama::Result<Vec<&'static str>> {
    let rating = value.to_string().parse::<f64>().unwrap_or(0.0);
    Ok(star_fills(rating)
        .into_iter()
        .map(StarFill::css_class)
        .collect())
}

/// Russian relative time ("5 минут назад"), falling back to a date after a
/// week.
///
/// Usage in templates: `{{ review.created_at|relative_time }}`
#[askama::filter_fn]
pub fn relative_time(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let text = value.to_string();
    Ok(DateTime::parse_from_rfc3339(&text)
        .or_else(|_| DateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f %z"))
        .map_or(text, |at| {
            format_relative(at.with_timezone(&Utc), Utc::now())
        }))
}

/// Relative description of `at` as seen from `now`.
pub(crate) fn format_relative(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds();
    if seconds < 60 {
        return "только что".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes} {} назад", plural(minutes, ["минуту", "минуты", "минут"]));
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours} {} назад", plural(hours, ["час", "часа", "часов"]));
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{days} {} назад", plural(days, ["день", "дня", "дней"]));
    }
    at.format("%d.%m.%Y").to_string()
}

/// Russian plural form for `n`: one / few / many.
const fn plural(n: i64, forms: [&'static str; 3]) -> &'static str {
    let [one, few, many] = forms;
    let tens = n % 100;
    let units = n % 10;
    if tens >= 11 && tens <= 14 {
        many
    } else if units == 1 {
        one
    } else if units >= 2 && units <= 4 {
        few
    } else {
        many
    }
}
