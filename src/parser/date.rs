use chrono::{NaiveDate, TimeZone, Utc};

/// Formats tried in order against export dates. Netflix-style exports use
/// two-digit US dates, so those come first; the order also decides
/// ambiguous day/month values.
const DATE_FORMATS: &[&str] = &[
    "%m/%d/%y", "%d/%m/%y", "%m/%d/%Y", "%d/%m/%Y", "%Y-%m-%d", "%m-%d-%Y", "%d-%m-%Y", "%m-%d-%y",
    "%d-%m-%y",
];

#[must_use]
pub fn parse_consumed_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.trim().trim_matches(['"', '\'']).trim();
    if cleaned.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
}

/// Storage form for consumption timestamps: midnight UTC in RFC 3339.
#[must_use]
pub fn parse_consumed_at(raw: &str) -> Option<String> {
    parse_consumed_date(raw)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt).to_rfc3339())
}
