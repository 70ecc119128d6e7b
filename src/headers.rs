//! Column headers and row labels for one layer.
//!
//! Both are small structs of optional positions. Every slot is written at
//! most once through [`set_if_unset`]: the first label found for a slot
//! wins and later ones are ignored.

use serde::Serialize;

use crate::blocks::Block;
use crate::classify::FieldType;
use crate::layers::Layer;

/// Rows above a layer's first row searched for column headers.
const HEADER_ROWS_ABOVE: u32 = 5;
/// Rows below a layer's first row searched for column headers.
const HEADER_ROWS_BELOW: u32 = 3;
/// Columns that hold row labels rather than carrier data.
const ROW_LABEL_COLS: u32 = 2;

/// Store `value` in `slot` unless it already holds one.
pub fn set_if_unset(slot: &mut Option<u32>, value: u32) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

/// Column positions of the data columns named by header labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ColumnHeaders {
    pub premium_col: Option<u32>,
    pub premium_share_col: Option<u32>,
    pub limit_col: Option<u32>,
    pub participation_col: Option<u32>,
    pub rate_col: Option<u32>,
    pub tiv_col: Option<u32>,
    /// Column right of the TIV header, where its values sit.
    pub tiv_data_col: Option<u32>,
}

impl ColumnHeaders {
    fn set_tiv(&mut self, col: u32) {
        if self.tiv_col.is_none() {
            self.tiv_col = Some(col);
            set_if_unset(&mut self.tiv_data_col, col + 1);
        }
    }

    /// File a header label by its lowercased text.
    pub fn classify(&mut self, lower: &str, col: u32) {
        if lower.contains("premium") && !lower.contains("limit") {
            if lower.contains("% premium") || lower.contains("share") {
                set_if_unset(&mut self.premium_share_col, col);
            } else {
                set_if_unset(&mut self.premium_col, col);
            }
        } else if lower.contains("limit") {
            set_if_unset(&mut self.limit_col, col);
        } else if lower.contains("participation") || lower.contains("% share") || lower == "share" {
            set_if_unset(&mut self.participation_col, col);
        } else if lower == "rate" {
            set_if_unset(&mut self.rate_col, col);
        } else if lower.contains("tiv") {
            self.set_tiv(col);
        }
    }

    /// In-layer sub-headers repeat only a few exact words.
    fn classify_sub_header(&mut self, lower: &str, col: u32) {
        if lower == "rate" && self.rate_col.is_none() {
            self.rate_col = Some(col);
        } else if lower == "premium" {
            set_if_unset(&mut self.premium_col, col);
        } else if lower.contains("tiv") {
            self.set_tiv(col);
        }
    }
}

/// Row positions of the data rows named by row labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowLabels {
    /// "% Premium": the carrier's share of premium.
    pub percent_premium_row: Option<u32>,
    /// "Premium", "Share Premium", "Layer Premium": layer totals.
    pub premium_row: Option<u32>,
    /// A bare "LIMIT" label; its row carries per-carrier amounts.
    pub limit_row: Option<u32>,
    pub participation_row: Option<u32>,
    pub carrier_row: Option<u32>,
    pub layer_row: Option<u32>,
    pub terms_row: Option<u32>,
    pub policy_row: Option<u32>,
}

impl RowLabels {
    /// File a row label by its lowercased text.
    pub fn classify(&mut self, lower: &str, row: u32) {
        if lower.contains("premium") {
            if lower.contains("% premium") || lower.starts_with('%') {
                set_if_unset(&mut self.percent_premium_row, row);
            } else if lower == "premium" || lower == "share premium" || lower.contains("layer premium")
            {
                set_if_unset(&mut self.premium_row, row);
            }
        } else if lower == "limit" {
            set_if_unset(&mut self.limit_row, row);
        } else if lower.contains("participation") || lower.contains("% share") || lower == "share" {
            set_if_unset(&mut self.participation_row, row);
        } else if lower.contains("carrier") {
            set_if_unset(&mut self.carrier_row, row);
        } else if lower.contains("layer") {
            set_if_unset(&mut self.layer_row, row);
        } else if lower.contains("terms") {
            set_if_unset(&mut self.terms_row, row);
        } else if lower.contains("policy") {
            set_if_unset(&mut self.policy_row, row);
        }
    }
}

fn labels(blocks: &[Block]) -> impl Iterator<Item = &Block> {
    blocks.iter().filter(|b| b.is(FieldType::Label))
}

/// Column headers near the top of the layer, then sub-headers inside it.
pub fn find_column_headers(blocks: &[Block], layer: &Layer) -> ColumnHeaders {
    let mut headers = ColumnHeaders::default();

    let search_start = layer.start_row.saturating_sub(HEADER_ROWS_ABOVE).max(1);
    let search_end = layer.start_row + HEADER_ROWS_BELOW;
    for block in labels(blocks).filter(|b| (search_start..=search_end).contains(&b.row)) {
        headers.classify(&block.text_lower(), block.col);
    }

    for block in labels(blocks).filter(|b| layer.contains_row(b.row) && b.col > ROW_LABEL_COLS) {
        headers.classify_sub_header(&block.text_lower(), block.col);
    }

    headers
}

/// Row labels in the label columns of the layer. When the premium or
/// participation row is still unknown, labels in any column are used too,
/// for layouts that repeat labels per carrier column.
pub fn find_row_labels(blocks: &[Block], layer: &Layer) -> RowLabels {
    let mut row_labels = RowLabels::default();
    let in_layer = || labels(blocks).filter(|b| layer.contains_row(b.row));

    for block in in_layer().filter(|b| b.col <= ROW_LABEL_COLS) {
        row_labels.classify(&block.text_lower(), block.row);
    }

    if row_labels.premium_row.is_none() || row_labels.participation_row.is_none() {
        for block in in_layer() {
            row_labels.classify(&block.text_lower(), block.row);
        }
    }

    row_labels
}
