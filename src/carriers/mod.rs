//! Carrier name matching.
//!
//! A [`CarrierMatcher`] is compiled once from a [`CarrierConfig`] and is
//! read-only afterwards, so one instance can be shared across threads behind
//! an `Arc`. [`CarrierMatcher::bundled`] returns the process-wide instance
//! built from the registry shipped with the crate.

mod config;

pub use config::{CarrierConfig, CarrierEntity, MatchRules, DEFAULT_SHORT_ALIAS_KEYWORDS};

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::error::{Result, XltowerError};

/// Phrases that mark descriptive or conditional text rather than a name.
pub const NON_CARRIER_PHRASES: [&str; 16] = [
    "subject to",
    "conditions",
    "terms &",
    "all terms",
    "tied to",
    "offer capacity",
    "no rp for",
    "loss rating",
    "increase in",
    "decrease in",
    "updated",
    "by year",
    "buy down",
    "all risk",
    "dic premium",
    "aggregate",
];

const BUNDLED_REGISTRY: &str = include_str!("carriers.yml");

static BUNDLED: Lazy<Arc<CarrierMatcher>> = Lazy::new(|| {
    let matcher = CarrierMatcher::from_yaml_str(BUNDLED_REGISTRY).unwrap_or_else(|e| {
        warn!(error = %e, "bundled carrier registry is invalid, using empty registry");
        CarrierMatcher::empty()
    });
    Arc::new(matcher)
});

static PUNCTUATION: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]").ok());

/// Compiled carrier registry.
#[derive(Debug, Clone)]
pub struct CarrierMatcher {
    rules: MatchRules,
    suffix_patterns: Vec<Regex>,
    term_patterns: Vec<(Regex, String)>,
    alias_to_canonical: HashMap<String, String>,
    /// Longest alias first.
    sorted_aliases: Vec<(String, String)>,
    non_carriers: HashSet<String>,
}

impl Default for CarrierMatcher {
    fn default() -> Self {
        Self::empty()
    }
}

impl CarrierMatcher {
    /// A matcher that knows no carriers and no non-carriers.
    pub fn empty() -> Self {
        Self {
            rules: MatchRules::default(),
            suffix_patterns: Vec::new(),
            term_patterns: Vec::new(),
            alias_to_canonical: HashMap::new(),
            sorted_aliases: Vec::new(),
            non_carriers: HashSet::new(),
        }
    }

    /// Shared matcher for the registry bundled with the crate.
    pub fn bundled() -> Arc<Self> {
        Arc::clone(&BUNDLED)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::from_config(&CarrierConfig::from_yaml_str(yaml)?)
    }

    /// Load a registry file; a missing file gives an empty matcher.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_config(&CarrierConfig::from_path(path)?)
    }

    pub fn from_config(config: &CarrierConfig) -> Result<Self> {
        let suffix_patterns = config
            .legal_suffixes
            .iter()
            .filter(|s| !s.is_empty())
            // Separator required, not optional: "Tesco" keeps its "co".
            .map(|suffix| compile(&format!(r"(?i)[\s,.]{}\.?$", regex::escape(suffix))))
            .collect::<Result<Vec<_>>>()?;

        let term_patterns = config
            .normalize_terms
            .iter()
            .filter(|(from, _)| !from.is_empty())
            .map(|(from, to)| Ok((compile(&format!(r"(?i)\b{}\b", regex::escape(from)))?, to.clone())))
            .collect::<Result<Vec<_>>>()?;

        let mut matcher = Self {
            rules: config.match_rules.clone(),
            suffix_patterns,
            term_patterns,
            alias_to_canonical: HashMap::new(),
            sorted_aliases: Vec::new(),
            non_carriers: HashSet::new(),
        };

        for entity in &config.entities {
            let names = std::iter::once(&entity.canonical).chain(entity.aliases.iter());
            for name in names {
                let alias = matcher.normalize(name);
                if alias.is_empty() {
                    continue;
                }
                // first entity to claim an alias keeps it
                matcher
                    .alias_to_canonical
                    .entry(alias)
                    .or_insert_with(|| entity.canonical.clone());
            }
        }

        let mut sorted: Vec<(String, String)> = matcher
            .alias_to_canonical
            .iter()
            .map(|(a, c)| (a.clone(), c.clone()))
            .collect();
        sorted.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        matcher.sorted_aliases = sorted;

        matcher.non_carriers = config
            .structural_labels
            .iter()
            .chain(config.brokers_wholesalers.iter())
            .map(|term| matcher.normalize(term))
            .filter(|term| !term.is_empty())
            .collect();

        debug!(
            aliases = matcher.alias_to_canonical.len(),
            non_carriers = matcher.non_carriers.len(),
            "compiled carrier registry"
        );
        Ok(matcher)
    }

    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    /// Number of distinct normalized aliases.
    pub fn alias_count(&self) -> usize {
        self.alias_to_canonical.len()
    }

    /// Trim, lowercase, strip one legal suffix per configured suffix, expand terms,
    /// drop punctuation, trim.
    pub fn normalize(&self, value: &str) -> String {
        let value = value.trim();
        let mut result = if self.rules.case_insensitive {
            value.to_lowercase()
        } else {
            value.to_string()
        };

        for pattern in &self.suffix_patterns {
            result = pattern.replace(&result, "").into_owned();
        }
        for (pattern, to) in &self.term_patterns {
            result = pattern.replace_all(&result, NoExpand(to)).into_owned();
        }
        if self.rules.ignore_punctuation {
            if let Some(re) = PUNCTUATION.as_ref() {
                result = re.replace_all(&result, "").into_owned();
            }
        }

        result.trim().to_string()
    }

    fn has_context_keyword(&self, context: &str) -> bool {
        if context.is_empty() {
            return false;
        }
        let lower = context.to_lowercase();
        self.rules
            .short_alias_keywords
            .iter()
            .any(|kw| lower.contains(kw.as_str()))
    }

    fn gated(&self, alias: &str, context: &str) -> bool {
        let gated = self.rules.gate_short_aliases
            && alias.chars().count() <= self.rules.short_alias_max_len
            && !self.has_context_keyword(context);
        if gated {
            trace!(alias, "short alias without carrier context");
        }
        gated
    }

    /// Resolve `value` to a canonical carrier name.
    ///
    /// An exact alias match is tried first, then (with `longest_alias_wins`)
    /// the longest alias contained in the value. Aliases no longer than
    /// `short_alias_max_len` only match when `context` holds a gating keyword.
    pub fn match_carrier(&self, value: &str, context: &str) -> Option<&str> {
        let normalized = self.normalize(value);
        if normalized.is_empty() {
            return None;
        }

        if let Some(canonical) = self.alias_to_canonical.get(&normalized) {
            return (!self.gated(&normalized, context)).then_some(canonical.as_str());
        }

        if !self.rules.longest_alias_wins {
            return None;
        }
        self.sorted_aliases
            .iter()
            .find(|(alias, _)| normalized.contains(alias.as_str()) && !self.gated(alias, context))
            .map(|(_, canonical)| canonical.as_str())
    }

    /// Exact lookup of a single alias, without gating.
    pub fn resolve_canonical(&self, alias: &str) -> Option<&str> {
        self.alias_to_canonical
            .get(&self.normalize(alias))
            .map(String::as_str)
    }

    /// Structural labels, brokers, descriptive phrases and `*`/`#` notes.
    ///
    /// Registry terms match exactly; multi-word terms also match as a prefix
    /// ("RT Layer 2" hits "rt layer"), single words never do, so
    /// "London - Fidelis" is not blocked by "london".
    pub fn is_non_carrier(&self, value: &str) -> bool {
        let normalized = self.normalize(value);
        if self.non_carriers.contains(&normalized) {
            return true;
        }
        if self
            .non_carriers
            .iter()
            .any(|term| term.contains(' ') && is_word_prefix(&normalized, term))
        {
            return true;
        }

        let lower = value.to_lowercase();
        if NON_CARRIER_PHRASES.iter().any(|p| lower.contains(p)) {
            return true;
        }
        value.starts_with('*') || value.starts_with('#')
    }

    /// Looser test used by classification: any alias inside the value, no
    /// gating. Lloyd's names count, as does "London" next to a percentage.
    pub fn is_known_carrier(&self, value: &str) -> bool {
        let normalized = self.normalize(value);
        if normalized.is_empty() {
            return false;
        }
        if self.alias_to_canonical.contains_key(&normalized)
            || self
                .sorted_aliases
                .iter()
                .any(|(alias, _)| normalized.contains(alias.as_str()))
        {
            return true;
        }
        normalized.contains("lloyd") || (normalized.contains("london") && value.contains('%'))
    }
}

fn is_word_prefix(text: &str, term: &str) -> bool {
    text.strip_prefix(term).is_some_and(|rest| rest.starts_with(' '))
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| XltowerError::Config(format!("bad pattern {pattern}: {e}")))
}
