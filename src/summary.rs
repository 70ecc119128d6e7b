//! Summary columns: sheet-wide aggregate columns that must not feed
//! per-carrier matching, and the per-layer totals read from them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::cell_ref::cell_ref;
use crate::grid::{CellValue, GridView};
use crate::layers::Layer;
use crate::types::LayerSummary;

const MAX_HEADER_SCAN_ROW: u32 = 10;
const MAX_HEADER_SCAN_COL: u32 = 30;
/// Columns after a year-premium header that may hold its fees/taxes/total.
const YEAR_PREMIUM_TRAILING_COLS: u32 = 4;

const SUMMARY_COLUMN_PATTERNS: [&str; 6] = [
    "annualized",
    "layer rate",
    "bound premium",
    "layer target",
    "total premium",
    "aggregate",
];

static YEAR_LAYER_PREMIUM: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^\d{4}\s+layer\s+premium").ok());
static YEAR_LAYER_RATE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^\d{4}\s+layer\s+rate").ok());

fn is_match(re: &Lazy<Option<Regex>>, text: &str) -> bool {
    re.as_ref().is_some_and(|r| r.is_match(text))
}

/// Columns excluded from carrier matching, plus the ones read for totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryColumnInfo {
    pub columns: BTreeSet<u32>,
    pub bound_premium_col: Option<u32>,
    pub layer_target_col: Option<u32>,
    pub layer_rate_col: Option<u32>,
}

impl SummaryColumnInfo {
    pub fn contains(&self, col: u32) -> bool {
        self.columns.contains(&col)
    }

    fn has_value_columns(&self) -> bool {
        self.bound_premium_col.is_some()
            || self.layer_target_col.is_some()
            || self.layer_rate_col.is_some()
    }
}

/// Scan the header area (first 10 rows, first 30 columns) for summary
/// headers. Reads raw cells: a merged header counts at its anchor only.
pub fn detect_summary_columns(view: &GridView<'_>) -> SummaryColumnInfo {
    let grid = view.grid();
    let mut info = SummaryColumnInfo::default();
    let last_col = view.max_col().min(MAX_HEADER_SCAN_COL);

    for row in 1..=MAX_HEADER_SCAN_ROW {
        for col in 1..=last_col {
            let Some(text) = grid.cell(row, col).as_text() else {
                continue;
            };
            let lower = text
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if lower.is_empty() {
                continue;
            }

            if is_match(&YEAR_LAYER_PREMIUM, &lower) {
                info.columns.insert(col);
                let trailing_end = (col + YEAR_PREMIUM_TRAILING_COLS).min(view.max_col());
                for extra in (col + 1)..=trailing_end {
                    let Some(extra_text) = grid.cell(row, extra).as_text() else {
                        continue;
                    };
                    let extra_lower = extra_text.trim().to_lowercase();
                    if extra_lower == "fees" || extra_lower == "total" || extra_lower.contains("tax") {
                        info.columns.insert(extra);
                    }
                    if is_match(&YEAR_LAYER_RATE, &extra_lower) {
                        info.columns.insert(extra);
                        info.layer_rate_col = Some(extra);
                    }
                }
                continue;
            }

            if SUMMARY_COLUMN_PATTERNS.iter().any(|p| lower.contains(p)) {
                info.columns.insert(col);
                if lower.contains("bound premium") {
                    info.bound_premium_col = Some(col);
                } else if lower.contains("target") {
                    info.layer_target_col = Some(col);
                } else if lower.contains("rate") && !lower.contains("annualized") {
                    info.layer_rate_col = Some(col);
                }
            }
        }
    }

    tracing::debug!("Summary columns: {:?}", info.columns);
    info
}

/// Layer totals from the summary columns. Within the layer's rows the last
/// positive bound premium and target win, as does the last numeric rate
/// (rates are small fractions and may be zero).
pub fn extract_layer_summary(
    view: &GridView<'_>,
    layer: &Layer,
    info: &SummaryColumnInfo,
) -> Option<LayerSummary> {
    if !info.has_value_columns() {
        return None;
    }

    let mut summary = LayerSummary::new(layer.limit.clone());
    for row in layer.start_row..=layer.end_row {
        if let Some(col) = info.bound_premium_col {
            if let CellValue::Number(n) = view.value(row, col) {
                if *n > 0.0 {
                    summary.layer_bound_premium = Some(*n);
                    summary.excel_range = Some(cell_ref(row, col));
                }
            }
        }
        if let Some(col) = info.layer_target_col {
            if let CellValue::Number(n) = view.value(row, col) {
                if *n > 0.0 {
                    summary.layer_target = Some(*n);
                }
            }
        }
        if let Some(col) = info.layer_rate_col {
            if let CellValue::Number(n) = view.value(row, col) {
                summary.layer_rate = Some(*n);
            }
        }
    }

    summary.has_data().then_some(summary)
}
