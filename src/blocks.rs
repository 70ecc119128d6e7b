//! Visual blocks: a merged region or a single non-blank cell.

use crate::carriers::CarrierMatcher;
use crate::cell_ref::cell_ref;
use crate::classify::{classify, FieldType};
use crate::grid::{CellValue, GridView};

/// One visual block, anchored at its top-left cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
    pub row_span: u32,
    pub col_span: u32,
    /// `None` until classified, and for blank values.
    pub field_type: Option<FieldType>,
    pub confidence: f64,
}

impl Block {
    /// An unclassified 1x1 block.
    pub fn new(row: u32, col: u32, value: impl Into<CellValue>) -> Self {
        Self {
            row,
            col,
            value: value.into(),
            row_span: 1,
            col_span: 1,
            field_type: None,
            confidence: 0.0,
        }
    }

    #[must_use]
    pub fn with_span(mut self, row_span: u32, col_span: u32) -> Self {
        self.row_span = row_span.max(1);
        self.col_span = col_span.max(1);
        self
    }

    #[must_use]
    pub fn with_type(mut self, field_type: FieldType, confidence: f64) -> Self {
        self.field_type = Some(field_type);
        self.confidence = confidence;
        self
    }

    pub fn is(&self, field_type: FieldType) -> bool {
        self.field_type == Some(field_type)
    }

    /// Last column covered, inclusive.
    pub fn end_col(&self) -> u32 {
        self.col + self.col_span.saturating_sub(1)
    }

    /// Column spans share at least one column.
    pub fn columns_overlap(&self, other: &Block) -> bool {
        self.col <= other.end_col() && other.col <= self.end_col()
    }

    /// Lowercased, trimmed text of the value.
    pub fn text_lower(&self) -> String {
        self.value.to_text().trim().to_lowercase()
    }

    /// A1 reference of the anchor cell.
    pub fn cell_ref(&self) -> String {
        cell_ref(self.row, self.col)
    }
}

/// Scan the grid row by row, left to right, emitting one block per merged
/// region (at its top-left) and one per non-merged non-blank cell.
pub fn find_blocks(view: &GridView<'_>) -> Vec<Block> {
    let mut blocks = Vec::new();
    for row in 1..=view.max_row() {
        for col in 1..=view.max_col() {
            let merge = view.merge_at(row, col);
            if merge.is_some_and(|m| !m.is_top_left(row, col)) {
                continue;
            }
            let value = view.value(row, col);
            if value.is_blank() {
                continue;
            }
            let block = Block::new(row, col, value.clone());
            blocks.push(match merge {
                Some(m) => block.with_span(m.row_span(), m.col_span()),
                None => block,
            });
        }
    }
    blocks
}

/// Assign a field type and confidence to every block.
pub fn classify_blocks(blocks: &mut [Block], matcher: &CarrierMatcher) {
    for block in blocks.iter_mut() {
        let (field_type, confidence) = classify(&block.value, matcher)
            .map_or((None, 0.0), |(t, c)| (Some(t), c));
        block.field_type = field_type;
        block.confidence = confidence;
    }
}
