//! Limit strings: "$50M", "$25M xs $25M", and their numeric forms.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::grid::CellValue;

const BILLION: f64 = 1_000_000_000.0;
const MILLION: f64 = 1_000_000.0;
const THOUSAND: f64 = 1_000.0;

static DOLLAR_EXCESS: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)(\$[\d,.]+[KMB]?)\s*(?:xs\.?|x/s|excess(?:\s+of)?)\s*(\$[\d,.]+[KMB]?)").ok()
});
static BARE_EXCESS: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)([\d,.]+[KMB])\s*(?:xs\.?|x/s|excess(?:\s+of)?)\s*([\d,.]+[KMB])").ok()
});
static DOLLAR_AMOUNT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(\$[\d,.]+[KMBkmb]?)").ok());

#[allow(clippy::cast_possible_truncation)]
fn truncate(value: f64) -> i64 {
    value.trunc() as i64
}

/// Format a number as a display limit: `$NM` from a million up, `$NK`
/// from a thousand, `$N` below. The figure is truncated, not rounded.
pub fn format_limit_number(value: f64) -> String {
    if value >= MILLION {
        format!("${}M", truncate(value / MILLION))
    } else if value >= THOUSAND {
        format!("${}K", truncate(value / THOUSAND))
    } else {
        format!("${}", truncate(value))
    }
}

/// Normalize a cell value to a display limit.
///
/// `$`-prefixed text is kept as written. Other text that parses as a number
/// once `$` and `,` are removed is reformatted; anything else is returned
/// unchanged. Blank and boolean cells have no limit.
pub fn parse_limit_value(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Number(n) => Some(format_limit_number(*n)),
        CellValue::Text(s) if s.starts_with('$') => Some(s.clone()),
        CellValue::Text(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ',' && *c != '$').collect();
            match cleaned.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Some(format_limit_number(n)),
                _ => Some(s.clone()),
            }
        }
        CellValue::Empty | CellValue::Bool(_) => None,
    }
}

fn with_dollar(amount: &str) -> String {
    let upper = amount.to_uppercase();
    if upper.starts_with('$') {
        upper
    } else {
        format!("${upper}")
    }
}

/// Split excess notation into `(limit, attachment)`.
///
/// "$25M xs. $25M", "10m x/s 5m" and "$5M excess of $1M" all parse. Without
/// excess notation the first dollar amount is returned as the limit alone.
pub fn parse_excess_notation(text: &str) -> (Option<String>, Option<String>) {
    for re in [&DOLLAR_EXCESS, &BARE_EXCESS] {
        let Some(caps) = re.as_ref().and_then(|r| r.captures(text)) else {
            continue;
        };
        if let (Some(limit), Some(attachment)) = (caps.get(1), caps.get(2)) {
            return (
                Some(with_dollar(limit.as_str())),
                Some(with_dollar(attachment.as_str())),
            );
        }
    }

    let limit = DOLLAR_AMOUNT
        .as_ref()
        .and_then(|r| r.find(text))
        .map(|m| m.as_str().to_uppercase());
    (limit, None)
}

/// Numeric value of a limit string for ordering; unparseable text sorts as 0.
pub fn parse_limit_for_sort(limit: &str) -> f64 {
    let cleaned: String = limit
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect::<String>()
        .to_uppercase();
    let (digits, multiplier) = if let Some(d) = cleaned.strip_suffix('M') {
        (d, MILLION)
    } else if let Some(d) = cleaned.strip_suffix('K') {
        (d, THOUSAND)
    } else if let Some(d) = cleaned.strip_suffix('B') {
        (d, BILLION)
    } else {
        (cleaned.as_str(), 1.0)
    };
    digits
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map_or(0.0, |n| n * multiplier)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn limit_patterns_compile() {
        for re in [&DOLLAR_EXCESS, &BARE_EXCESS, &DOLLAR_AMOUNT] {
            assert!(re.is_some());
        }
    }

    #[test_case(50_000_000.0, "$50M")]
    #[test_case(2_500_000.0, "$2M")]
    #[test_case(250_000.0, "$250K")]
    #[test_case(999.0, "$999")]
    fn formats_numbers(value: f64, expected: &str) {
        assert_eq!(format_limit_number(value), expected);
    }

    #[test]
    fn limit_values_from_cells() {
        assert_eq!(parse_limit_value(&"$50M".into()).as_deref(), Some("$50M"));
        assert_eq!(
            parse_limit_value(&"25,000,000".into()).as_deref(),
            Some("$25M")
        );
        assert_eq!(
            parse_limit_value(&"Umbrella".into()).as_deref(),
            Some("Umbrella")
        );
        assert_eq!(parse_limit_value(&CellValue::Empty), None);
    }

    #[test_case("Umbrella $50M xs. $50M", Some("$50M"), Some("$50M"))]
    #[test_case("$25M x/s $25M", Some("$25M"), Some("$25M"))]
    #[test_case("$5m excess of $1m", Some("$5M"), Some("$1M"))]
    #[test_case("10M xs 5M", Some("$10M"), Some("$5M"))]
    #[test_case("Layer $100M", Some("$100M"), None)]
    #[test_case("Chubb", None, None)]
    fn excess_notation(text: &str, limit: Option<&str>, attachment: Option<&str>) {
        let (l, a) = parse_excess_notation(text);
        assert_eq!(l.as_deref(), limit);
        assert_eq!(a.as_deref(), attachment);
    }

    #[test_case("$50M", 50_000_000.0)]
    #[test_case("$250k", 250_000.0)]
    #[test_case("$1.5B", 1_500_000_000.0)]
    #[test_case("1,000", 1_000.0)]
    #[test_case("TBD", 0.0)]
    #[test_case("", 0.0)]
    fn sort_values(text: &str, expected: f64) {
        assert_eq!(parse_limit_for_sort(text), expected);
    }
}
