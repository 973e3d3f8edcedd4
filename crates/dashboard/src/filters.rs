//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// CSS class for a formatted amount: `amount negative` below zero.
///
/// Usage in templates: `<td class="{{ row.net|amount_class }}">`
#[askama::filter_fn]
pub fn amount_class(value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(sign_class(&value.to_string()))
}

fn sign_class(formatted: &str) -> &'static str {
    if formatted.trim_start().starts_with('-') {
        "amount negative"
    } else {
        "amount"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_class() {
        assert_eq!(sign_class("-1,200.00"), "amount negative");
        assert_eq!(sign_class("0.00"), "amount");
        assert_eq!(sign_class("1,200.00"), "amount");
    }
}
