//! Test fixtures for generating tower workbooks in memory.
//!
//! Only the package parts the reader consumes are written: workbook and
//! relationships, shared strings, a styles part with solid fills, and one
//! worksheet per sheet with cells and merges.
//!
//! # Example
//!
//! ```rust
//! use fixtures::{SheetBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("Tower")
//!             .cell("A1", "$50M")
//!             .filled("B2", "Test Insurance Co", "#FFFF00")
//!             .merge("A1:A4"),
//!     )
//!     .build();
//!
//! let sheet = xltower::parser::read_sheet(&xlsx, None).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::FileOptions;
use zip::ZipWriter;

// ============================================================================
// Cell Value
// ============================================================================

/// A cell value as it will be stored in the worksheet XML.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Shared string (`t="s"`).
    String(String),
    Number(f64),
    Boolean(bool),
    /// Error literal such as "#N/A" (`t="e"`).
    Error(String),
    /// Inline string (`t="inlineStr"`).
    InlineString(String),
    /// Style-only cell.
    Empty,
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: CellValue,
    /// Solid fill foreground as ARGB.
    pub fill: Option<String>,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub merges: Vec<String>,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cell<V: Into<CellValue>>(mut self, cell_ref: &str, value: V) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            fill: None,
        });
        self
    }

    /// Add a cell with a solid background (#RRGGBB or AARRGGBB).
    #[must_use]
    pub fn filled<V: Into<CellValue>>(mut self, cell_ref: &str, value: V, color: &str) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            fill: Some(normalize_color(color)),
        });
        self
    }

    #[must_use]
    pub fn inline(self, cell_ref: &str, text: &str) -> Self {
        self.cell(cell_ref, CellValue::InlineString(text.to_string()))
    }

    #[must_use]
    pub fn error(self, cell_ref: &str, literal: &str) -> Self {
        self.cell(cell_ref, CellValue::Error(literal.to_string()))
    }

    /// Add a merge range (e.g., "A1:A5").
    #[must_use]
    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for complete XLSX packages.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    active_tab: Option<usize>,
    overrides: Vec<(String, Option<String>)>,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Mark the 0-based sheet index as active in `workbookView`.
    #[must_use]
    pub fn active_tab(mut self, index: usize) -> Self {
        self.active_tab = Some(index);
        self
    }

    /// Replace a generated part with `body`, or leave it out when `None`.
    #[must_use]
    pub fn override_part(mut self, path: &str, body: Option<&str>) -> Self {
        self.overrides
            .push((path.to_string(), body.map(ToString::to_string)));
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut fills = FillCollector::new();
        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let Some(ref color) = cell.fill {
                    fills.add(color);
                }
                if let CellValue::String(ref s) = cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let overrides = &self.overrides;
        let mut write = |path: &str, body: String| {
            let body = match overrides.iter().find(|(p, _)| p == path) {
                Some((_, Some(replacement))) => replacement.clone(),
                Some((_, None)) => return,
                None => body,
            };
            zip.start_file(path, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        };

        write("[Content_Types].xml", generate_content_types(self.sheets.len()));
        write("_rels/.rels", generate_rels());
        write(
            "xl/_rels/workbook.xml.rels",
            generate_workbook_rels(self.sheets.len()),
        );
        write("xl/workbook.xml", generate_workbook(&self.sheets, self.active_tab));
        write("xl/styles.xml", fills.generate_styles_xml());
        if !shared_strings.is_empty() {
            write("xl/sharedStrings.xml", generate_shared_strings(&shared_strings));
        }
        for (i, sheet) in self.sheets.iter().enumerate() {
            write(
                &format!("xl/worksheets/sheet{}.xml", i + 1),
                generate_sheet_xml(sheet, &shared_strings, &fills),
            );
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }

    /// Build and write to `dir/name`, returning the path.
    pub fn write_to(self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

// ============================================================================
// Fill Collector
// ============================================================================

/// Deduplicates solid fills. Fill 0/1 and xf 0 are the required defaults,
/// so fill `n` (n >= 2) is used by cell format `n - 1`.
#[derive(Debug)]
struct FillCollector {
    colors: Vec<String>,
}

impl FillCollector {
    fn new() -> Self {
        Self { colors: Vec::new() }
    }

    fn add(&mut self, color: &str) {
        if !self.colors.iter().any(|c| c == color) {
            self.colors.push(color.to_string());
        }
    }

    /// `s` attribute for a fill color.
    fn style_index(&self, color: &str) -> u32 {
        self.colors
            .iter()
            .position(|c| c == color)
            .map_or(0, |i| i as u32 + 1)
    }

    fn generate_styles_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        xml.push_str(r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#);

        xml.push_str(&format!(r#"<fills count="{}">"#, self.colors.len() + 2));
        xml.push_str(r#"<fill><patternFill patternType="none"/></fill>"#);
        xml.push_str(r#"<fill><patternFill patternType="gray125"/></fill>"#);
        for color in &self.colors {
            xml.push_str(&format!(
                r#"<fill><patternFill patternType="solid"><fgColor rgb="{color}"/><bgColor indexed="64"/></patternFill></fill>"#
            ));
        }
        xml.push_str("</fills>");

        xml.push_str(r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#);
        xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);

        xml.push_str(&format!(r#"<cellXfs count="{}">"#, self.colors.len() + 1));
        xml.push_str(r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#);
        for i in 0..self.colors.len() {
            xml.push_str(&format!(
                r#"<xf numFmtId="0" fontId="0" fillId="{}" borderId="0" xfId="0" applyFill="1"/>"#,
                i + 2
            ));
        }
        xml.push_str("</cellXfs>");

        xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
        xml.push_str("</styleSheet>");
        xml
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Normalize color to ARGB format (without #).
fn normalize_color(color: &str) -> String {
    let color = color.trim_start_matches('#');
    if color.len() == 8 {
        color.to_uppercase()
    } else {
        format!("FF{}", color.to_uppercase())
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn generate_rels() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    xml.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#);
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    let rid = sheet_count + 1;
    xml.push_str(&format!(
        r#"<Relationship Id="rId{rid}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#
    ));
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        rid + 1
    ));
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder], active_tab: Option<usize>) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    if let Some(tab) = active_tab {
        xml.push_str(&format!(
            r#"<bookViews><workbookView activeTab="{tab}"/></bookViews>"#
        ));
    }
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets>");
    xml.push_str("</workbook>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
        strings.len(),
        strings.len()
    ));
    for s in strings {
        xml.push_str(&format!(
            r#"<si><t xml:space="preserve">{}</t></si>"#,
            escape_xml(s)
        ));
    }
    xml.push_str("</sst>");
    xml
}

fn generate_sheet_xml(sheet: &SheetBuilder, shared_strings: &[String], fills: &FillCollector) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );
    xml.push_str("<sheetData>");

    let mut rows: BTreeMap<u32, Vec<&CellEntry>> = BTreeMap::new();
    for cell in &sheet.cells {
        let (_, row) = parse_cell_ref(&cell.cell_ref);
        rows.entry(row).or_default().push(cell);
    }

    for (row_num, cells) in rows {
        xml.push_str(&format!(r#"<row r="{row_num}">"#));
        for cell in cells {
            let mut attrs = format!(r#"r="{}""#, cell.cell_ref);
            if let Some(ref color) = cell.fill {
                attrs.push_str(&format!(r#" s="{}""#, fills.style_index(color)));
            }
            match &cell.value {
                CellValue::String(s) => {
                    let idx = shared_strings.iter().position(|x| x == s).unwrap_or(0);
                    xml.push_str(&format!(r#"<c {attrs} t="s"><v>{idx}</v></c>"#));
                }
                CellValue::Number(n) => {
                    xml.push_str(&format!(r#"<c {attrs}><v>{n}</v></c>"#));
                }
                CellValue::Boolean(b) => {
                    let v = if *b { "1" } else { "0" };
                    xml.push_str(&format!(r#"<c {attrs} t="b"><v>{v}</v></c>"#));
                }
                CellValue::Error(e) => {
                    xml.push_str(&format!(r#"<c {attrs} t="e"><v>{}</v></c>"#, escape_xml(e)));
                }
                CellValue::InlineString(s) => {
                    xml.push_str(&format!(
                        r#"<c {attrs} t="inlineStr"><is><t>{}</t></is></c>"#,
                        escape_xml(s)
                    ));
                }
                CellValue::Empty => {
                    xml.push_str(&format!(r#"<c {attrs}/>"#));
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, sheet.merges.len()));
        for merge in &sheet.merges {
            xml.push_str(&format!(r#"<mergeCell ref="{merge}"/>"#));
        }
        xml.push_str("</mergeCells>");
    }

    xml.push_str("</worksheet>");
    xml
}

/// Parse a cell reference like "A1" into (col, row) as 1-indexed.
fn parse_cell_ref(cell_ref: &str) -> (u32, u32) {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut in_letters = true;

    for c in cell_ref.chars() {
        if in_letters && c.is_ascii_alphabetic() {
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        } else {
            in_letters = false;
            if let Some(d) = c.to_digit(10) {
                row = row * 10 + d;
            }
        }
    }

    (col, row)
}

// ============================================================================
// Tower Scenarios
// ============================================================================

/// One $50M layer, one carrier with 25% and $25,000, highlighted yellow.
#[must_use]
pub fn single_layer_tower() -> SheetBuilder {
    SheetBuilder::new("Tower")
        .cell("A1", "$50M")
        .filled("B2", "Test Insurance Co", "FFFFFF00")
        .cell("B3", 0.25)
        .cell("B4", 25_000.0)
}

/// Three layers: $25M at row 1, $50M at row 5, $100M at row 10.
#[must_use]
pub fn three_layer_tower() -> SheetBuilder {
    SheetBuilder::new("Tower")
        .cell("A1", "$25M")
        .cell("B2", "Alpha Insurance Co")
        .cell("B3", 0.5)
        .cell("A5", "$50M")
        .cell("B6", "Beta Specialty Inc")
        .cell("B7", 0.4)
        .cell("A10", "$100M")
        .cell("B11", "Gamma Assurance Ltd")
        .cell("B12", 1.0)
}

/// A tower with the given sheets, written to `dir`.
pub fn write_workbook(dir: &Path, name: &str, sheets: Vec<SheetBuilder>) -> PathBuf {
    sheets
        .into_iter()
        .fold(XlsxBuilder::new(), XlsxBuilder::sheet)
        .write_to(dir, name)
}
