//! Utility functions

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::Value;
use url::Url;

/// Shown when a date is present but cannot be parsed
pub const INVALID_DATE_LABEL: &str = "Fecha inválida";

/// Shown when a record has no date at all
pub const MISSING_DATE_LABEL: &str = "Fecha no disponible";

/// Literal used by print outputs for missing values
pub const NOT_AVAILABLE: &str = "N/A";

/// Display pattern used by the reports (`dd/MM/yyyy HH:mm:ss`)
pub const REPORT_DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Parse the date shapes the backend emits
///
/// Accepts RFC 3339 (`2025-11-13T10:15:00Z`), Django's
/// `2025-11-13 10:15:00 -0400` and naive `2025-11-13T10:15:00[.fff]`.
pub fn parse_backend_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.naive_local());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Format a backend date for display, never failing
///
/// Missing input yields [`MISSING_DATE_LABEL`], unparseable input yields
/// [`INVALID_DATE_LABEL`] so one malformed record cannot break a listing.
pub fn format_display_datetime(raw: Option<&str>, pattern: &str) -> String {
    match raw.map(str::trim) {
        None | Some("") => MISSING_DATE_LABEL.to_string(),
        Some(value) => match parse_backend_datetime(value) {
            Some(dt) => dt.format(pattern).to_string(),
            None => {
                tracing::warn!("Unparseable date value: {}", value);
                INVALID_DATE_LABEL.to_string()
            }
        },
    }
}

/// Fixed two-decimal rendering used for currency columns
pub fn format_currency(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Numeric value of a JSON field; decimal fields arrive as strings
pub fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Resolve a dotted path (`profile.nombre`) inside a JSON row
pub fn json_path<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(row, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Page number referenced by a `next`/`previous` link
///
/// Links without a `page` parameter point at the first page. Relative links
/// are accepted.
pub fn page_from_link(link: &str) -> Option<u32> {
    let url = Url::parse(link)
        .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(link)))
        .ok()?;

    match url.query_pairs().find(|(key, _)| key == crate::PAGE_PARAM) {
        Some((_, value)) => value.parse::<u32>().ok().filter(|p| *p > 0),
        None => Some(1),
    }
}
