//! Carrier registry configuration.
//!
//! The registry is YAML. Two layouts are accepted:
//!
//! ```yaml
//! match_rules:
//!   gate_short_aliases: true
//!   short_alias_max_len: 5
//! normalization:
//!   legal_suffixes: [inc, llc, ltd]
//!   normalize_terms: {ins: insurance}
//! carrier_entities:
//!   - canonical: Chubb
//!     aliases: [Chubb, ACE]
//! non_carriers:
//!   structural_labels: [primary]
//!   brokers_wholesalers: [amwins]
//! ```
//!
//! and the older flat form (`carriers: [..]`, `non_carriers: [..]`), where
//! each carrier is its own canonical name.

use serde::Deserialize;
use std::path::Path;
use tracing::warn;

use crate::classify::COMPANY_SUFFIXES;
use crate::error::Result;

/// Keywords that let a short alias match when found in nearby text.
pub const DEFAULT_SHORT_ALIAS_KEYWORDS: [&str; 12] = [
    "carrier",
    "insurer",
    "market",
    "underwriter",
    "syndicate",
    "layer",
    "xs",
    "excess",
    "limit",
    "attachment",
    "premium",
    "share",
];

const DEFAULT_SHORT_ALIAS_MAX_LEN: usize = 5;

/// Matching toggles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MatchRules {
    pub case_insensitive: bool,
    pub ignore_punctuation: bool,
    pub longest_alias_wins: bool,
    pub gate_short_aliases: bool,
    pub short_alias_max_len: usize,
    pub short_alias_keywords: Vec<String>,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            ignore_punctuation: true,
            longest_alias_wins: true,
            gate_short_aliases: true,
            short_alias_max_len: DEFAULT_SHORT_ALIAS_MAX_LEN,
            short_alias_keywords: DEFAULT_SHORT_ALIAS_KEYWORDS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// One canonical carrier and the spellings that resolve to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CarrierEntity {
    pub canonical: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Parsed registry. Immutable once built; compile it into a
/// [`CarrierMatcher`](super::CarrierMatcher) to query it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarrierConfig {
    pub match_rules: MatchRules,
    pub legal_suffixes: Vec<String>,
    /// Whole-word replacements applied in order, e.g. `ins` -> `insurance`.
    pub normalize_terms: Vec<(String, String)>,
    pub entities: Vec<CarrierEntity>,
    pub structural_labels: Vec<String>,
    pub brokers_wholesalers: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNormalization {
    legal_suffixes: Vec<String>,
    normalize_terms: serde_yaml::Mapping,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNonCarriers {
    Categorized {
        #[serde(default)]
        structural_labels: Vec<String>,
        #[serde(default)]
        brokers_wholesalers: Vec<String>,
    },
    Flat(Vec<String>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRegistry {
    match_rules: Option<MatchRules>,
    normalization: Option<RawNormalization>,
    carrier_entities: Option<Vec<CarrierEntity>>,
    non_carriers: Option<RawNonCarriers>,
    /// Flat carrier list of the older layout.
    carriers: Vec<String>,
}

impl CarrierConfig {
    /// Parse a registry document. An empty document is an empty registry.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: Option<RawRegistry> = serde_yaml::from_str(yaml)?;
        Ok(raw.map(Self::from_raw).unwrap_or_default())
    }

    /// Load a registry file. A missing file degrades to the empty registry;
    /// a file that exists but does not parse is an error.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "carrier registry not found, using empty registry");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    fn from_raw(raw: RawRegistry) -> Self {
        let (structural_labels, brokers_wholesalers) = match raw.non_carriers {
            Some(RawNonCarriers::Categorized {
                structural_labels,
                brokers_wholesalers,
            }) => (structural_labels, brokers_wholesalers),
            Some(RawNonCarriers::Flat(list)) => (list, Vec::new()),
            None => (Vec::new(), Vec::new()),
        };

        let Some(entities) = raw.carrier_entities else {
            // Older flat layout: every carrier names itself, and the company
            // suffix list doubles as the legal suffix list.
            return Self {
                match_rules: MatchRules::default(),
                legal_suffixes: COMPANY_SUFFIXES.iter().map(ToString::to_string).collect(),
                normalize_terms: Vec::new(),
                entities: raw
                    .carriers
                    .into_iter()
                    .map(|c| CarrierEntity {
                        aliases: vec![c.clone()],
                        canonical: c,
                    })
                    .collect(),
                structural_labels,
                brokers_wholesalers,
            };
        };

        let normalization = raw.normalization.unwrap_or_default();
        let normalize_terms = normalization
            .normalize_terms
            .iter()
            .filter_map(|(from, to)| Some((from.as_str()?.to_string(), to.as_str()?.to_string())))
            .collect();

        Self {
            match_rules: raw.match_rules.unwrap_or_default(),
            legal_suffixes: normalization.legal_suffixes,
            normalize_terms,
            entities,
            structural_labels,
            brokers_wholesalers,
        }
    }

    /// True when there is nothing to match against.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
            && self.structural_labels.is_empty()
            && self.brokers_wholesalers.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn parses_categorized_layout() {
        let config = CarrierConfig::from_yaml_str(
            r"
match_rules:
  short_alias_max_len: 3
normalization:
  legal_suffixes: [inc, ltd]
  normalize_terms:
    ins: insurance
    intl: international
carrier_entities:
  - canonical: Chubb
    aliases: [ACE, Chubb Bermuda]
non_carriers:
  structural_labels: [primary]
  brokers_wholesalers: [amwins]
",
        )
        .unwrap();
        assert_eq!(config.match_rules.short_alias_max_len, 3);
        assert!(config.match_rules.gate_short_aliases);
        assert_eq!(config.match_rules.short_alias_keywords.len(), 12);
        assert_eq!(config.legal_suffixes, vec!["inc", "ltd"]);
        assert_eq!(
            config.normalize_terms,
            vec![
                ("ins".to_string(), "insurance".to_string()),
                ("intl".to_string(), "international".to_string())
            ]
        );
        assert_eq!(config.entities[0].canonical, "Chubb");
        assert_eq!(config.brokers_wholesalers, vec!["amwins"]);
    }

    #[test]
    fn converts_flat_layout() {
        let config = CarrierConfig::from_yaml_str(
            r"
carriers: [Chubb, AIG]
non_carriers: [Primary, Total]
",
        )
        .unwrap();
        assert_eq!(config.entities.len(), 2);
        assert_eq!(config.entities[1].aliases, vec!["AIG"]);
        assert_eq!(config.structural_labels, vec!["Primary", "Total"]);
        assert!(config.legal_suffixes.contains(&"llc".to_string()));
    }

    #[test]
    fn empty_document_is_empty_registry() {
        assert!(CarrierConfig::from_yaml_str("").unwrap().is_empty());
        assert!(CarrierConfig::from_yaml_str("~").unwrap().is_empty());
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let config = CarrierConfig::from_path(Path::new("/nonexistent/carriers.yml")).unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = CarrierConfig::from_yaml_str("carrier_entities: {canonical: [").unwrap_err();
        assert!(matches!(err, crate::error::XltowerError::Config(_)));
    }
}
