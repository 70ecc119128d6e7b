//! Preflight: how likely is extraction to succeed on this sheet?
//!
//! Runs the block, classification and layer stages only, then reports what
//! was found with a weighted confidence and advisory issues. Missing
//! structure is never an error here.

use std::path::Path;

use serde::Serialize;

use crate::blocks::{classify_blocks, find_blocks, Block};
use crate::carriers::CarrierMatcher;
use crate::classify::FieldType;
use crate::error::Result;
use crate::extractor::ExtractOptions;
use crate::grid::{CellGrid, GridView};
use crate::layers::identify_layers;
use crate::parser::load_sheet;
use crate::scoring::{clamp_score, weighted_score};

const WEIGHTS: [(&str, f64); 5] = [
    ("layers", 0.3),
    ("carriers", 0.3),
    ("percentages", 0.2),
    ("currency", 0.1),
    ("terms", 0.1),
];

const HIGH_CARRIER_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreflightResult {
    pub file_name: String,
    pub sheet_name: String,
    pub can_extract: bool,
    pub confidence: f64,
    pub layers_found: usize,
    pub carriers_found: usize,
    pub has_percentages: bool,
    pub has_currency: bool,
    pub has_terms: bool,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

impl PreflightResult {
    fn advise(&mut self, issue: impl Into<String>, suggestion: &str) {
        self.issues.push(issue.into());
        self.suggestions.push(suggestion.to_string());
    }
}

/// Assess an already loaded grid. `file_name` is left empty.
pub fn preflight(grid: &dyn CellGrid, matcher: &CarrierMatcher) -> PreflightResult {
    let view = GridView::new(grid);
    let mut blocks = find_blocks(&view);
    classify_blocks(&mut blocks, matcher);
    let layers = identify_layers(&blocks, view.max_row(), &ExtractOptions::default());

    let count = |pred: fn(&Block) -> bool| blocks.iter().filter(|b| pred(b)).count();
    let carriers: Vec<&Block> = blocks.iter().filter(|b| b.is(FieldType::Carrier)).collect();
    let high_confidence = carriers
        .iter()
        .filter(|b| b.confidence >= HIGH_CARRIER_CONFIDENCE)
        .count();
    let percentages = count(|b| b.field_type.is_some_and(FieldType::is_percentage));
    let currency = count(|b| b.is(FieldType::Currency) || b.is(FieldType::CurrencyString));
    let terms = count(|b| b.is(FieldType::Terms));

    let mut result = PreflightResult {
        file_name: String::new(),
        sheet_name: grid.name().to_string(),
        can_extract: !layers.is_empty() && !carriers.is_empty(),
        confidence: 0.0,
        layers_found: layers.len(),
        carriers_found: carriers.len(),
        has_percentages: percentages > 0,
        has_currency: currency > 0,
        has_terms: terms > 0,
        issues: Vec::new(),
        suggestions: Vec::new(),
    };

    if layers.is_empty() {
        result.advise(
            "No layer limits detected (looking for $XXM patterns or large numbers)",
            "Ensure layer limits are visible as $XXM, $XXK, or numeric values > 1M",
        );
    }
    if carriers.is_empty() {
        result.advise(
            "No carrier names detected",
            "Carrier names should be text cells with company-like names",
        );
    } else if high_confidence * 2 < carriers.len() {
        result.advise(
            format!(
                "Low confidence on carrier detection ({high_confidence}/{} high confidence)",
                carriers.len()
            ),
            "Carrier names with 'Insurance', 'Inc', 'Lloyd's' etc. are detected with higher confidence",
        );
    }
    if !result.has_percentages {
        result.advise(
            "No participation percentages detected",
            "Percentages should be decimal (0.25) or whole numbers (25) or strings ('25%')",
        );
    }
    if !result.has_currency {
        result.advise(
            "No premium/currency values detected",
            "Currency values should be numbers > 1000 or strings starting with '$'",
        );
    }

    let present_flag = |found: bool| if found { 1.0 } else { 0.0 };
    #[allow(clippy::cast_precision_loss)]
    let carrier_confidence = if carriers.is_empty() {
        0.0
    } else {
        carriers.iter().map(|b| b.confidence).sum::<f64>() / carriers.len() as f64
    };
    let present = [
        ("layers", present_flag(!layers.is_empty())),
        ("carriers", carrier_confidence),
        ("percentages", present_flag(result.has_percentages)),
        ("currency", present_flag(result.has_currency)),
        ("terms", present_flag(result.has_terms)),
    ];
    result.confidence = clamp_score(weighted_score(&WEIGHTS, &present));

    tracing::debug!(
        "Preflight {}: {} layers, {} carriers, confidence {:.2}",
        result.sheet_name,
        result.layers_found,
        result.carriers_found,
        result.confidence
    );
    result
}

/// Load a sheet from disk and assess it with the bundled registry.
pub fn preflight_file(path: &Path, sheet_name: Option<&str>) -> Result<PreflightResult> {
    let sheet = load_sheet(path, sheet_name)?;
    let mut result = preflight(&sheet, &CarrierMatcher::bundled());
    result.file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(result)
}
