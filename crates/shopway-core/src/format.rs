//! Presentation helpers for distances and durations.
//!
//! These are total: any `f64` yields a string. Non-finite or negative inputs
//! render as [`PLACEHOLDER`].

use serde::{Deserialize, Serialize};

/// Rendered in place of a value that cannot be displayed.
pub const PLACEHOLDER: &str = "--";

/// Display language of the widget, as carried by `settings.lang`.
///
/// Drives the decimal separator and the wording of user-facing texts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Lang {
    #[default]
    Fr,
    En,
}

impl From<String> for Lang {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<Lang> for String {
    fn from(lang: Lang) -> Self {
        lang.to_string()
    }
}

impl Lang {
    /// Accepts `"en"`, `"en_US"`, `"en-GB"` and friends as English; everything
    /// else falls back to French.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().to_ascii_lowercase().starts_with("en") {
            Lang::En
        } else {
            Lang::Fr
        }
    }

    #[must_use]
    pub fn decimal_separator(self) -> char {
        match self {
            Lang::Fr => ',',
            Lang::En => '.',
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lang::Fr => write!(f, "fr"),
            Lang::En => write!(f, "en"),
        }
    }
}

fn is_displayable(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Formats meters with the widget's default language.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    format_distance_in(meters, Lang::default())
}

/// `"999 m"` below one kilometer, `"1,5 km"` / `"1.5 km"` above.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_distance_in(meters: f64, lang: Lang) -> String {
    if !is_displayable(meters) {
        return PLACEHOLDER.to_string();
    }
    let rounded = meters.round();
    if rounded < 1000.0 {
        return format!("{} m", rounded as u64);
    }
    let km = format!("{:.1}", meters / 1000.0);
    let km = km.strip_suffix(".0").unwrap_or(&km);
    format!("{} km", km.replace('.', &lang.decimal_separator().to_string()))
}

/// `"45 s"`, `"12 min"`, `"1 h 05"` or `"2 h"`. Identical in every language.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_duration(seconds: f64) -> String {
    if !is_displayable(seconds) {
        return PLACEHOLDER.to_string();
    }
    let total = seconds.round() as u64;
    if total < 60 {
        return format!("{total} s");
    }
    let minutes = (seconds / 60.0).round() as u64;
    if minutes < 60 {
        return format!("{minutes} min");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        format!("{hours} h")
    } else {
        format!("{hours} h {rest:02}")
    }
}
