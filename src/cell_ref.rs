//! Utilities for Excel-style cell references.
//!
//! Everything here is 1-indexed: `A1` is row 1, column 1. That is the
//! convention of the whole inference pipeline and of `excel_range` in the
//! output records.

/// Parse a cell reference like "B7" (or "$B$7") into (row, col), 1-indexed.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    parse_cell_ref_bytes(cell_ref.trim().as_bytes())
}

/// Bytes variant of [`parse_cell_ref`] for raw quick-xml attribute values.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            // Letters after digits ("1A") are not a reference.
            if saw_row {
                return None;
            }
            let upper = b.to_ascii_uppercase();
            col = col
                .checked_mul(26)?
                .checked_add(u32::from(upper - b'A') + 1)?;
        } else if b.is_ascii_digit() {
            row = row.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
            saw_row = true;
        } else {
            return None;
        }
    }

    if col == 0 || row == 0 {
        return None;
    }
    Some((row, col))
}

/// Parse a range like "A1:B10" (or a single cell) into
/// `(min_row, min_col, max_row, max_col)`, normalizing reversed corners.
pub fn parse_cell_range(range: &str) -> Option<(u32, u32, u32, u32)> {
    let (start, end) = range.split_once(':').unwrap_or((range, range));
    let (r1, c1) = parse_cell_ref(start)?;
    let (r2, c2) = parse_cell_ref(end)?;
    Some((r1.min(r2), c1.min(c2), r1.max(r2), c1.max(c2)))
}

/// Column number to letters: 1 -> "A", 26 -> "Z", 27 -> "AA".
pub fn column_letter(col: u32) -> String {
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        // rem < 26, so the narrowing is exact
        letters.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Format a 1-indexed (row, col) as an A1 reference.
pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{row}", column_letter(col))
}
