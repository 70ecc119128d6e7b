//! Spatial matching of data blocks to a carrier block.
//!
//! Candidates are ranked column-aligned first, then by row distance, and
//! each slot of the entry is filled by the first eligible candidate.

use crate::blocks::Block;
use crate::classify::WHOLE_PERCENT_THRESHOLD;
use crate::grid::CellValue;
use crate::headers::{ColumnHeaders, RowLabels};

/// Columns away a non-aligned block may sit and still be considered.
pub const MAX_COLUMN_DISTANCE: u32 = 3;

/// Sort key: `(not column aligned, row distance)`, smaller is closer.
pub fn proximity_key(block: &Block, carrier: &Block) -> (bool, u32) {
    (!block.columns_overlap(carrier), block.row.abs_diff(carrier.row))
}

/// Order candidates by [`proximity_key`]; ties keep scan order.
pub fn rank_by_proximity<'a>(candidates: &[&'a Block], carrier: &Block) -> Vec<&'a Block> {
    let mut ranked = candidates.to_vec();
    ranked.sort_by_key(|b| proximity_key(b, carrier));
    ranked
}

/// Column-aligned, or on an adjacent row within a few columns.
pub fn is_relevant(block: &Block, carrier: &Block) -> bool {
    block.columns_overlap(carrier)
        || (block.row.abs_diff(carrier.row) <= 1
            && block.col.abs_diff(carrier.col) <= MAX_COLUMN_DISTANCE)
}

/// Participation on the 0-1 scale; values above 1 are whole percentages.
pub fn normalize_percentage(value: &CellValue) -> Option<f64> {
    let n = match value {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => s.replace('%', "").trim().parse::<f64>().ok()?,
        CellValue::Empty | CellValue::Bool(_) => return None,
    };
    Some(if n > WHOLE_PERCENT_THRESHOLD { n / 100.0 } else { n })
}

/// Amount of a currency cell, with `$` and `,` stripped from text.
pub fn parse_currency(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => s
            .chars()
            .filter(|c| *c != '$' && *c != ',')
            .collect::<String>()
            .trim()
            .parse::<f64>()
            .ok(),
        CellValue::Empty | CellValue::Bool(_) => None,
    }
}

fn on_or_below(row: u32, label_row: Option<u32>) -> bool {
    label_row.is_some_and(|r| row == r || row == r + 1)
}

/// Participation from a percentage block, or `None` if the block is in the
/// rate column or off the participation row (when one is labelled).
pub fn match_participation(block: &Block, labels: &RowLabels, rate_col: Option<u32>) -> Option<f64> {
    if rate_col == Some(block.col) {
        return None;
    }
    if labels.participation_row.is_some() && !on_or_below(block.row, labels.participation_row) {
        return None;
    }
    normalize_percentage(&block.value)
}

/// Premium slots being filled for one carrier.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CurrencySlots {
    pub premium: Option<f64>,
    pub premium_share: Option<f64>,
}

impl CurrencySlots {
    fn fill_premium(&mut self, value: f64) {
        self.premium.get_or_insert(value);
    }

    fn fill_share(&mut self, value: f64) {
        self.premium_share.get_or_insert(value);
    }

    /// Offer a currency block. Row labels are consulted first, then column
    /// headers, then a positional fallback (first amount is the premium,
    /// the next the share).
    pub fn offer(&mut self, block: &Block, headers: &ColumnHeaders, labels: &RowLabels) {
        if headers.tiv_col == Some(block.col) || headers.tiv_data_col == Some(block.col) {
            return;
        }
        let Some(value) = parse_currency(&block.value) else {
            return;
        };
        if labels.policy_row == Some(block.row) || headers.limit_col == Some(block.col) {
            return;
        }

        // % Premium row: the carrier's own premium.
        if on_or_below(block.row, labels.percent_premium_row) {
            self.fill_premium(value);
            return;
        }
        // Premium row holds layer totals when a % Premium row exists.
        if on_or_below(block.row, labels.premium_row) {
            if labels.percent_premium_row.is_none() {
                self.fill_premium(value);
            }
            return;
        }
        if labels.limit_row == Some(block.row) {
            self.fill_premium(value);
            return;
        }

        if let Some(premium_col) = headers.premium_col {
            if block.col == premium_col {
                self.fill_premium(value);
            }
            return;
        }

        if headers.premium_share_col == Some(block.col) {
            self.fill_share(value);
        } else if self.premium.is_none() {
            self.premium = Some(value);
        } else if self.premium_share.is_none() {
            self.premium_share = Some(value);
        }
    }
}
