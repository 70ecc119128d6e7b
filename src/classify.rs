//! Content classification: a block's value alone decides its field type.
//!
//! Numbers go through fixed magnitude bands. Text goes through
//! [`TEXT_RULES`], an ordered decision table where the first rule that
//! fires wins. Each rule is a plain function so it can be tested on its own
//! and the priority order stays visible in one place.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::carriers::CarrierMatcher;
use crate::grid::CellValue;

/// Semantic type assigned to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Zero,
    Percentage,
    PercentageOrNumber,
    LargeNumber,
    Currency,
    Number,
    LayerDescription,
    Limit,
    CurrencyString,
    PercentageString,
    Terms,
    Label,
    Status,
    PolicyNumber,
    Carrier,
    Text,
    Unknown,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::Percentage => "percentage",
            Self::PercentageOrNumber => "percentage_or_number",
            Self::LargeNumber => "large_number",
            Self::Currency => "currency",
            Self::Number => "number",
            Self::LayerDescription => "layer_description",
            Self::Limit => "limit",
            Self::CurrencyString => "currency_string",
            Self::PercentageString => "percentage_string",
            Self::Terms => "terms",
            Self::Label => "label",
            Self::Status => "status",
            Self::PolicyNumber => "policy_number",
            Self::Carrier => "carrier",
            Self::Text => "text",
            Self::Unknown => "unknown",
        }
    }

    /// Types that can fill participation.
    pub fn is_percentage(self) -> bool {
        matches!(self, Self::Percentage | Self::PercentageOrNumber)
    }

    /// Types that can fill premium or premium share.
    pub fn is_currency(self) -> bool {
        matches!(
            self,
            Self::Currency | Self::CurrencyString | Self::LargeNumber | Self::Zero
        )
    }

    /// Types collected as candidate data for a carrier entry.
    pub fn is_entry_data(self) -> bool {
        self.is_percentage()
            || self.is_currency()
            || matches!(self, Self::Terms | Self::LayerDescription)
    }
}

/// A field type and its confidence in [0, 1].
pub type Classification = (FieldType, f64);

const MILLION: f64 = 1_000_000.0;
const THOUSAND: f64 = 1_000.0;
/// Numbers above this are whole-number percentages ("25" means 25%).
pub const WHOLE_PERCENT_THRESHOLD: f64 = 1.0;
const MAX_WHOLE_PERCENT: f64 = 100.0;

const EXCESS_KEYWORDS: [&str; 4] = ["xs", "x/s", "p/o", "excess"];

const COVERAGE_PATTERNS: [&str; 16] = [
    "excl",
    "incl",
    "flood",
    "earthquake",
    "eq ",
    "wind",
    "terror",
    "blanket",
    "margin",
    "ded",
    "retention",
    "all risk",
    "dic",
    "aop",
    "named storm",
    "nws",
];

const LABEL_PATTERNS: [&str; 11] = [
    "carrier",
    "participation",
    "premium",
    "share",
    "layer",
    "limit",
    "policy",
    "terms",
    "coverage",
    "deductible",
    "total",
];

const STATUS_VALUES: [&str; 6] = ["tbd", "n/a", "pending", "incumbent", "new", "renewal"];

/// Substrings that mark a company name. Matched anywhere in the text.
pub(crate) const COMPANY_SUFFIXES: [&str; 12] = [
    "inc",
    "llc",
    "ltd",
    "co",
    "corp",
    "company",
    "ins",
    "insurance",
    "assurance",
    "specialty",
    "group",
    "re",
];

const MAX_POLICY_NUMBER_LENGTH: usize = 30;
const MIN_POLICY_NUMBER_DIGITS: usize = 4;
const MIN_PURE_NUMERIC_POLICY_LENGTH: usize = 6;

const MIN_CARRIER_NAME_LENGTH: usize = 3;
const MAX_CARRIER_NAME_LENGTH: usize = 100;
const MAX_SHORT_LABEL_LENGTH: usize = 3;

/// Classify a cell value. `None` means the value is empty.
pub fn classify(value: &CellValue, matcher: &CarrierMatcher) -> Option<Classification> {
    match value {
        CellValue::Empty => None,
        CellValue::Number(n) => Some(classify_number(*n)),
        CellValue::Text(s) => classify_text(s, matcher),
        CellValue::Bool(_) => Some((FieldType::Unknown, 0.0)),
    }
}

/// Magnitude bands for numeric cells.
pub fn classify_number(value: f64) -> Classification {
    if value == 0.0 {
        (FieldType::Zero, 0.5)
    } else if value > 0.0 && value <= WHOLE_PERCENT_THRESHOLD {
        (FieldType::Percentage, 0.9)
    } else if value > WHOLE_PERCENT_THRESHOLD && value <= MAX_WHOLE_PERCENT {
        (FieldType::PercentageOrNumber, 0.6)
    } else if value > MILLION {
        (FieldType::LargeNumber, 0.8)
    } else if value > THOUSAND {
        (FieldType::Currency, 0.7)
    } else {
        (FieldType::Number, 0.5)
    }
}

/// Trimmed text plus its lowercase form, shared by all rules.
pub struct TextProbe<'a> {
    pub text: &'a str,
    pub lower: String,
}

impl<'a> TextProbe<'a> {
    pub fn new(text: &'a str) -> Self {
        let text = text.trim();
        Self {
            text,
            lower: text.to_lowercase(),
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

type TextRule = fn(&TextProbe<'_>, &CarrierMatcher) -> Option<Classification>;

/// Text rules in priority order. First match wins.
pub const TEXT_RULES: &[(&str, TextRule)] = &[
    ("dollar_amount", rule_dollar_amount),
    ("percent_suffix", rule_percent_suffix),
    ("coverage_terms", rule_coverage_terms),
    ("column_label", rule_column_label),
    ("status", rule_status),
    ("percent_prefix", rule_percent_prefix),
    ("policy_number", rule_policy_number),
    ("non_carrier", rule_non_carrier),
    ("short_text", rule_short_text),
    ("known_carrier", rule_known_carrier),
    ("company_name", rule_company_name),
];

/// Classify text; blank text is `None`, unmatched text is `text` at 0.3.
pub fn classify_text(text: &str, matcher: &CarrierMatcher) -> Option<Classification> {
    let probe = TextProbe::new(text);
    if probe.text.is_empty() {
        return None;
    }
    let hit = TEXT_RULES
        .iter()
        .find_map(|(_, rule)| rule(&probe, matcher))
        .unwrap_or((FieldType::Text, 0.3));
    Some(hit)
}

/// `$`-prefixed: excess notation, a magnitude-suffixed limit, or a plain amount.
pub fn rule_dollar_amount(p: &TextProbe<'_>, _: &CarrierMatcher) -> Option<Classification> {
    let rest = p.text.strip_prefix('$')?;
    if EXCESS_KEYWORDS.iter().any(|k| p.lower.contains(k)) {
        return Some((FieldType::LayerDescription, 0.95));
    }
    let upper = p.text.to_uppercase();
    if ['M', 'K', 'B'].iter().any(|c| upper.contains(*c)) && p.text.matches('$').count() == 1 {
        return Some((FieldType::Limit, 0.9));
    }
    let digits: String = rest.chars().filter(|c| *c != ',' && *c != '.').collect();
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        return Some((FieldType::CurrencyString, 0.8));
    }
    None
}

pub fn rule_percent_suffix(p: &TextProbe<'_>, _: &CarrierMatcher) -> Option<Classification> {
    p.text
        .ends_with('%')
        .then_some((FieldType::PercentageString, 0.9))
}

pub fn rule_coverage_terms(p: &TextProbe<'_>, _: &CarrierMatcher) -> Option<Classification> {
    COVERAGE_PATTERNS
        .iter()
        .any(|pat| p.lower.contains(pat))
        .then_some((FieldType::Terms, 0.85))
}

pub fn rule_column_label(p: &TextProbe<'_>, _: &CarrierMatcher) -> Option<Classification> {
    LABEL_PATTERNS
        .iter()
        .any(|pat| p.lower.starts_with(pat))
        .then_some((FieldType::Label, 0.9))
}

pub fn rule_status(p: &TextProbe<'_>, _: &CarrierMatcher) -> Option<Classification> {
    STATUS_VALUES
        .contains(&p.lower.as_str())
        .then_some((FieldType::Status, 0.8))
}

pub fn rule_percent_prefix(p: &TextProbe<'_>, _: &CarrierMatcher) -> Option<Classification> {
    p.text.starts_with('%').then_some((FieldType::Label, 0.7))
}

pub fn rule_policy_number(p: &TextProbe<'_>, _: &CarrierMatcher) -> Option<Classification> {
    looks_like_policy_number(p.text).then_some((FieldType::PolicyNumber, 0.85))
}

pub fn rule_non_carrier(p: &TextProbe<'_>, m: &CarrierMatcher) -> Option<Classification> {
    m.is_non_carrier(p.text).then_some((FieldType::Label, 0.7))
}

pub fn rule_short_text(p: &TextProbe<'_>, m: &CarrierMatcher) -> Option<Classification> {
    (p.char_len() <= MAX_SHORT_LABEL_LENGTH && !m.is_known_carrier(p.text))
        .then_some((FieldType::Label, 0.6))
}

pub fn rule_known_carrier(p: &TextProbe<'_>, m: &CarrierMatcher) -> Option<Classification> {
    m.is_known_carrier(p.text).then_some((FieldType::Carrier, 0.9))
}

/// Name-shaped text: a company suffix anywhere gives 0.85, a leading
/// capital gives 0.6.
pub fn rule_company_name(p: &TextProbe<'_>, _: &CarrierMatcher) -> Option<Classification> {
    let len = p.char_len();
    let first = p.text.chars().next()?;
    let name_shaped = (MIN_CARRIER_NAME_LENGTH..=MAX_CARRIER_NAME_LENGTH).contains(&len)
        && !first.is_numeric()
        && first != '$'
        && p.text.chars().any(char::is_alphabetic);
    if !name_shaped {
        return None;
    }
    if COMPANY_SUFFIXES.iter().any(|s| p.lower.contains(s)) {
        return Some((FieldType::Carrier, 0.85));
    }
    first
        .is_uppercase()
        .then_some((FieldType::Carrier, 0.6))
}

static LETTERS_THEN_DIGITS: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,6}\d{5,}").ok());
static LETTERS_DASH_DIGITS: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,6}-?\d+").ok());
static DIGITS_LETTERS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\d+[A-Z]+\d*").ok());
static ALNUM_CODE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Z]+\d+[A-Z]*\d*$").ok());

fn matches(re: &Lazy<Option<Regex>>, text: &str) -> bool {
    re.as_ref().is_some_and(|r| r.is_match(text))
}

/// Alphanumeric codes such as "PG2507405", "ABC-12345" or "12345678".
pub fn looks_like_policy_number(value: &str) -> bool {
    if value.is_empty() || value.chars().count() > MAX_POLICY_NUMBER_LENGTH {
        return false;
    }

    let compact: String = value.chars().filter(|c| *c != '-' && *c != ' ').collect();
    if compact.chars().count() >= MIN_PURE_NUMERIC_POLICY_LENGTH
        && compact.chars().all(|c| c.is_ascii_digit())
    {
        return true;
    }

    let digits = value.chars().filter(char::is_ascii_digit).count();
    let letters = value.chars().filter(|c| c.is_alphabetic()).count();
    if digits >= MIN_POLICY_NUMBER_DIGITS && digits > letters {
        return true;
    }

    let upper = value.to_uppercase();
    matches(&LETTERS_THEN_DIGITS, &upper)
        || (matches(&LETTERS_DASH_DIGITS, &upper) && digits >= 5)
        || (matches(&DIGITS_LETTERS, &upper) && digits >= 5)
        || (matches(&ALNUM_CODE, &upper) && digits >= MIN_POLICY_NUMBER_DIGITS)
}
