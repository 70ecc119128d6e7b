//! Cell grid abstraction consumed by the inference pipeline.
//!
//! A [`CellGrid`] is anything that can answer "what is at (row, col)",
//! enumerate its merge ranges, and report a raw fill color. [`Sheet`] is the
//! in-memory implementation produced by the XLSX parser and used directly in
//! tests. [`GridView`] layers merge awareness on top: it indexes merges once
//! so per-cell lookups stay O(1).

use std::collections::HashMap;

use serde::Serialize;

use crate::cell_ref::{parse_cell_range, parse_cell_ref};
use crate::error::{Result, XltowerError};

/// A single cell payload.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    /// True for `Empty` and for text that is only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) | Self::Bool(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Display form used when a label or value is compared as text.
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.clone(),
            Self::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        }
    }
}

/// Integral floats print without a fractional part ("2019", not "2019.0").
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A merged region, 1-indexed and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeRange {
    pub min_row: u32,
    pub min_col: u32,
    pub max_row: u32,
    pub max_col: u32,
}

impl MergeRange {
    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.min_row..=self.max_row).contains(&row) && (self.min_col..=self.max_col).contains(&col)
    }

    pub fn row_span(&self) -> u32 {
        self.max_row - self.min_row + 1
    }

    pub fn col_span(&self) -> u32 {
        self.max_col - self.min_col + 1
    }

    pub fn is_top_left(&self, row: u32, col: u32) -> bool {
        row == self.min_row && col == self.min_col
    }
}

/// Read access to one worksheet.
pub trait CellGrid {
    /// Sheet name, used in reports.
    fn name(&self) -> &str;

    /// Raw value at a 1-indexed position. Cells covered by a merge but not at
    /// its top-left are normally `Empty`.
    fn cell(&self, row: u32, col: u32) -> &CellValue;

    fn merge_ranges(&self) -> &[MergeRange];

    fn max_row(&self) -> u32;

    fn max_col(&self) -> u32;

    /// Raw ARGB of the cell's pattern-fill foreground, as stored.
    fn raw_fill(&self, row: u32, col: u32) -> Option<&str>;
}

static EMPTY: CellValue = CellValue::Empty;

/// In-memory worksheet.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    name: String,
    cells: HashMap<(u32, u32), CellValue>,
    fills: HashMap<(u32, u32), String>,
    merges: Vec<MergeRange>,
    max_row: u32,
    max_col: u32,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn grow(&mut self, row: u32, col: u32) {
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
    }

    /// Store a value at a 1-indexed position. Empty values still extend the
    /// sheet bounds, the way a styled but blank cell does in a workbook.
    pub fn set_value(&mut self, row: u32, col: u32, value: CellValue) {
        if row == 0 || col == 0 {
            return;
        }
        self.grow(row, col);
        if value == CellValue::Empty {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    pub fn set_fill_at(&mut self, row: u32, col: u32, argb: impl Into<String>) {
        if row == 0 || col == 0 {
            return;
        }
        self.grow(row, col);
        self.fills.insert((row, col), argb.into());
    }

    pub fn add_merge(&mut self, range: MergeRange) {
        self.grow(range.max_row, range.max_col);
        self.merges.push(range);
    }

    /// Set a value by A1 reference.
    pub fn set(&mut self, cell: &str, value: impl Into<CellValue>) -> Result<()> {
        let (row, col) =
            parse_cell_ref(cell).ok_or_else(|| XltowerError::CellRef(cell.to_string()))?;
        self.set_value(row, col, value.into());
        Ok(())
    }

    /// Set a fill color (ARGB hex) by A1 reference.
    pub fn set_fill(&mut self, cell: &str, argb: &str) -> Result<()> {
        let (row, col) =
            parse_cell_ref(cell).ok_or_else(|| XltowerError::CellRef(cell.to_string()))?;
        self.set_fill_at(row, col, argb);
        Ok(())
    }

    /// Add a merge by range reference such as "A1:A5".
    pub fn merge(&mut self, range: &str) -> Result<()> {
        let (min_row, min_col, max_row, max_col) =
            parse_cell_range(range).ok_or_else(|| XltowerError::CellRef(range.to_string()))?;
        self.add_merge(MergeRange {
            min_row,
            min_col,
            max_row,
            max_col,
        });
        Ok(())
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

impl CellGrid for Sheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn cell(&self, row: u32, col: u32) -> &CellValue {
        self.cells.get(&(row, col)).unwrap_or(&EMPTY)
    }

    fn merge_ranges(&self) -> &[MergeRange] {
        &self.merges
    }

    fn max_row(&self) -> u32 {
        self.max_row
    }

    fn max_col(&self) -> u32 {
        self.max_col
    }

    fn raw_fill(&self, row: u32, col: u32) -> Option<&str> {
        self.fills.get(&(row, col)).map(String::as_str)
    }
}

/// Merge-aware view over a grid.
pub struct GridView<'a> {
    grid: &'a dyn CellGrid,
    merge_at: HashMap<(u32, u32), MergeRange>,
}

impl<'a> GridView<'a> {
    /// Index every member cell of every merge. Later ranges never override an
    /// earlier one if a workbook declares overlapping merges.
    pub fn new(grid: &'a dyn CellGrid) -> Self {
        let mut merge_at = HashMap::new();
        for range in grid.merge_ranges() {
            for row in range.min_row..=range.max_row {
                for col in range.min_col..=range.max_col {
                    merge_at.entry((row, col)).or_insert(*range);
                }
            }
        }
        Self { grid, merge_at }
    }

    pub fn grid(&self) -> &'a dyn CellGrid {
        self.grid
    }

    pub fn max_row(&self) -> u32 {
        self.grid.max_row()
    }

    pub fn max_col(&self) -> u32 {
        self.grid.max_col()
    }

    pub fn merge_at(&self, row: u32, col: u32) -> Option<&MergeRange> {
        self.merge_at.get(&(row, col))
    }

    /// The position holding the value for (row, col): the merge's top-left
    /// if the cell is merged, the cell itself otherwise.
    fn anchor(&self, row: u32, col: u32) -> (u32, u32) {
        self.merge_at(row, col)
            .map_or((row, col), |m| (m.min_row, m.min_col))
    }

    /// Value at (row, col), reading through merges.
    pub fn value(&self, row: u32, col: u32) -> &'a CellValue {
        let (r, c) = self.anchor(row, col);
        self.grid.cell(r, c)
    }

    /// Fill color at (row, col), reading through merges. All-zero ARGB is
    /// how an unset color is stored and is reported as no fill.
    pub fn fill_color(&self, row: u32, col: u32) -> Option<&'a str> {
        let (r, c) = self.anchor(row, col);
        self.grid
            .raw_fill(r, c)
            .filter(|rgb| !rgb.is_empty() && *rgb != "00000000" && *rgb != "000000")
    }
}
