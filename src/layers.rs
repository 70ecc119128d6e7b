//! Layer boundaries from limit blocks in the leftmost columns.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::blocks::Block;
use crate::classify::FieldType;
use crate::extractor::ExtractOptions;
use crate::grid::CellValue;
use crate::types::format_limit_number;

/// Rows within which a limit to the left dominates.
const LAYER_ROW_PROXIMITY: u32 = 2;
const MIN_LIMIT_CONFIDENCE: f64 = 0.7;

static YEAR_PREFIX: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^20\d{2}\b").ok());

/// One coverage tier: the rows from its limit down to the next limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layer {
    pub limit: String,
    pub limit_row: u32,
    pub limit_col: u32,
    pub start_row: u32,
    pub end_row: u32,
}

impl Layer {
    pub fn contains_row(&self, row: u32) -> bool {
        (self.start_row..=self.end_row).contains(&row)
    }
}

/// Display form of a limit cell: text trimmed, numbers as `$NM`/`$NK`/`$N`.
pub fn format_limit(value: &CellValue) -> String {
    match value {
        CellValue::Text(s) => s.trim().to_string(),
        CellValue::Number(n) => format_limit_number(*n),
        other => other.to_text(),
    }
}

/// Another block says this row holds carrier data, not a layer limit.
fn has_conflicting_label(block: &Block, other: &Block) -> bool {
    if std::ptr::eq(block, other) {
        return false;
    }
    if other.row == block.row {
        if other.is(FieldType::Label) {
            let lower = other.text_lower();
            if lower.contains("premium") || lower == "limit" || lower.contains("policy") {
                return true;
            }
        }
        // "2019 Bound", "2018 Marketing": a historical row
        let text = other.value.to_text();
        if YEAR_PREFIX.as_ref().is_some_and(|re| re.is_match(&text)) {
            return true;
        }
    }
    if other.is(FieldType::Label) && other.row + 1 == block.row {
        let lower = other.text_lower();
        if lower.contains("premium") || lower.contains("participation") {
            return true;
        }
    }
    false
}

fn is_limit_candidate(block: &Block, blocks: &[Block], options: &ExtractOptions) -> bool {
    if !(block.is(FieldType::Limit) || block.is(FieldType::LargeNumber))
        || block.confidence < MIN_LIMIT_CONFIDENCE
        || block.col > options.max_limit_col
    {
        return false;
    }
    if let CellValue::Number(n) = block.value {
        if n > options.max_limit_value {
            tracing::trace!(cell = %block.cell_ref(), value = n, "limit above ceiling");
            return false;
        }
    }
    if block.is(FieldType::LargeNumber) && blocks.iter().any(|o| has_conflicting_label(block, o)) {
        tracing::trace!(cell = %block.cell_ref(), "limit candidate on a data row");
        return false;
    }
    true
}

/// Limit blocks that survive the candidate filter and the dominance filter,
/// in row order.
pub fn primary_limits<'a>(blocks: &'a [Block], options: &ExtractOptions) -> Vec<&'a Block> {
    let mut candidates: Vec<&Block> = blocks
        .iter()
        .filter(|b| is_limit_candidate(b, blocks, options))
        .collect();
    candidates.sort_by_key(|b| b.row);

    let mut primary: Vec<&Block> = Vec::new();
    for block in candidates {
        let dominated = primary
            .iter()
            .any(|p| block.row.abs_diff(p.row) <= LAYER_ROW_PROXIMITY && block.col > p.col);
        if dominated {
            tracing::trace!(cell = %block.cell_ref(), "limit dominated by a limit to its left");
        } else {
            primary.push(block);
        }
    }
    primary
}

/// Partition the sheet into layers. Each layer ends one row above the next
/// layer's limit; the last one ends at `max_row`.
pub fn identify_layers(blocks: &[Block], max_row: u32, options: &ExtractOptions) -> Vec<Layer> {
    let limits = primary_limits(blocks, options);
    let layers: Vec<Layer> = limits
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let end_row = limits
                .get(i + 1)
                .map_or(max_row.max(block.row), |next| next.row.saturating_sub(1).max(block.row));
            Layer {
                limit: format_limit(&block.value),
                limit_row: block.row,
                limit_col: block.col,
                start_row: block.row,
                end_row,
            }
        })
        .collect();
    tracing::debug!("Identified {} layers", layers.len());
    layers
}
