//! XLSX reader
//!
//! Reads one worksheet out of a workbook package into an in-memory
//! [`Sheet`]: cell values, merge ranges, and the pattern-fill foreground of
//! each cell. Nothing else in the package is needed for tower extraction.

mod relationships;
mod styles;
mod worksheet;

use std::io::Cursor;
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use crate::error::{Result, XltowerError};
use crate::grid::Sheet;

use relationships::{get_workbook_info, parse_shared_strings, parse_workbook_relationships};
use styles::parse_cell_fills;
use worksheet::parse_sheet;

/// File extensions accepted at the load boundary.
const SUPPORTED_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];

/// Load a worksheet from a file on disk.
///
/// `sheet_name` of `None` selects the workbook's active sheet (falling back
/// to the first sheet). Errors are the three load-boundary outcomes:
/// [`XltowerError::FileNotFound`], [`XltowerError::InvalidFormat`] and
/// [`XltowerError::SheetNotFound`].
pub fn load_sheet(path: &Path, sheet_name: Option<&str>) -> Result<Sheet> {
    if !path.exists() {
        return Err(XltowerError::FileNotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(XltowerError::InvalidFormat(format!(
            "{}: expected .xlsx or .xlsm",
            path.display()
        )));
    }

    let data = std::fs::read(path)?;
    read_sheet(&data, sheet_name)
}

/// Read a worksheet from XLSX bytes.
pub fn read_sheet(data: &[u8], sheet_name: Option<&str>) -> Result<Sheet> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| XltowerError::InvalidFormat(format!("not a zip package: {e}")))?;

    let relationships = parse_workbook_relationships(&mut archive);
    let workbook = get_workbook_info(&mut archive, &relationships.worksheets)
        .map_err(|e| XltowerError::InvalidFormat(format!("unreadable workbook.xml: {e}")))?;

    let info = match sheet_name {
        Some(name) => workbook
            .sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| XltowerError::SheetNotFound(name.to_string()))?,
        None => workbook
            .sheets
            .get(workbook.active_tab)
            .or_else(|| workbook.sheets.first())
            .ok_or_else(|| XltowerError::InvalidFormat("workbook has no sheets".to_string()))?,
    };

    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref());
    let fills = parse_cell_fills(&mut archive, relationships.styles.as_deref());

    let sheet = parse_sheet(&mut archive, info, &shared_strings, &fills).map_err(|e| {
        XltowerError::InvalidFormat(format!("unreadable worksheet {}: {e}", info.path))
    })?;
    debug!(
        sheet = %info.name,
        cells = sheet.cell_count(),
        shared_strings = shared_strings.len(),
        "worksheet loaded"
    );
    Ok(sheet)
}

/// Names of all sheets in workbook order.
pub fn sheet_names(data: &[u8]) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| XltowerError::InvalidFormat(format!("not a zip package: {e}")))?;
    let relationships = parse_workbook_relationships(&mut archive);
    let workbook = get_workbook_info(&mut archive, &relationships.worksheets)
        .map_err(|e| XltowerError::InvalidFormat(format!("unreadable workbook.xml: {e}")))?;
    Ok(workbook.sheets.into_iter().map(|s| s.name).collect())
}
