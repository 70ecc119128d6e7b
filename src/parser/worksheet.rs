//! Worksheet parsing - cell values, fills and merge ranges into a [`Sheet`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::{parse_cell_range, parse_cell_ref_bytes};
use crate::error::Result;
use crate::grid::{CellValue, MergeRange, Sheet};
use crate::xml_helpers::attr_string;

/// Sheet metadata from workbook.xml
#[derive(Debug, Clone)]
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    if value.is_empty() {
        return None;
    }
    value.iter().try_fold(0u32, |acc, &b| {
        if b.is_ascii_digit() {
            Some(acc.saturating_mul(10).saturating_add(u32::from(b - b'0')))
        } else {
            None
        }
    })
}

/// Turn the raw `<v>`/`<t>` text of a cell into a value.
///
/// Error cells (`#N/A`, `#DIV/0!`) are kept as their text. Numbers that fail
/// to parse are kept as text rather than dropped.
pub(super) fn resolve_cell_value(
    raw: Option<&str>,
    tag: CellTypeTag,
    shared_strings: &[String],
) -> CellValue {
    let Some(raw) = raw else {
        return CellValue::Empty;
    };
    match tag {
        CellTypeTag::Shared => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|idx| shared_strings.get(idx))
            .map_or(CellValue::Empty, |s| CellValue::Text(s.clone())),
        CellTypeTag::Inline | CellTypeTag::Str | CellTypeTag::Error => {
            CellValue::Text(raw.to_string())
        }
        CellTypeTag::Bool => CellValue::Bool(matches!(raw.trim(), "1" | "true" | "TRUE")),
        CellTypeTag::Default => match raw.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) if raw.trim().is_empty() => CellValue::Empty,
            Err(_) => CellValue::Text(raw.to_string()),
        },
    }
}

/// Parse a merge range like "A1:B2"
fn parse_merge_ref(ref_str: &str) -> Option<MergeRange> {
    let (min_row, min_col, max_row, max_col) = parse_cell_range(ref_str)?;
    Some(MergeRange {
        min_row,
        min_col,
        max_row,
        max_col,
    })
}

/// Read the text content of the element just opened, up to its end tag.
fn read_text<R: std::io::BufRead>(
    xml: &mut Reader<R>,
    end: &[u8],
    buf: &mut Vec<u8>,
) -> Option<String> {
    let mut out: Option<String> = None;
    loop {
        buf.clear();
        match xml.read_event_into(buf) {
            Ok(Event::Text(text)) => {
                if let Ok(s) = text.unescape() {
                    out.get_or_insert_with(String::new).push_str(&s);
                }
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == end => break,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    out
}

/// Attributes of a `<c>` element.
struct CellAttrs {
    pos: Option<(u32, u32)>,
    tag: CellTypeTag,
    style: Option<u32>,
}

fn cell_attrs(e: &BytesStart) -> CellAttrs {
    let mut attrs = CellAttrs {
        pos: None,
        tag: CellTypeTag::Default,
        style: None,
    };
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"r" => attrs.pos = parse_cell_ref_bytes(&attr.value),
            b"t" => attrs.tag = parse_cell_type_tag(&attr.value),
            b"s" => attrs.style = parse_u32_bytes(&attr.value),
            _ => {}
        }
    }
    attrs
}

/// Parse a single worksheet
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    shared_strings: &[String],
    fills: &[Option<String>],
) -> Result<Sheet> {
    let file = archive.by_name(&info.path)?;

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut sheet = Sheet::new(info.name.clone());
    let mut buf = Vec::new();
    let mut cell_buf = Vec::new();
    let mut text_buf = Vec::new();
    let mut current_row: u32 = 0;
    let mut last_col: u32 = 0;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(_) | Event::Empty(_))) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start_event = matches!(event, Event::Start(_));

                match e.local_name().as_ref() {
                    b"row" => {
                        current_row = attr_string(e, b"r")
                            .and_then(|r| r.parse().ok())
                            .unwrap_or(current_row + 1);
                        last_col = 0;
                    }

                    b"c" => {
                        let attrs = cell_attrs(e);
                        // `r` may be omitted: the cell follows the previous one.
                        let (row, col) = attrs.pos.unwrap_or((current_row, last_col + 1));
                        last_col = col;

                        let mut raw: Option<String> = None;
                        if is_start_event {
                            loop {
                                cell_buf.clear();
                                match xml.read_event_into(&mut cell_buf) {
                                    Ok(Event::Start(ref inner)) => {
                                        match inner.local_name().as_ref() {
                                            b"v" => raw = read_text(&mut xml, b"v", &mut text_buf),
                                            // <t> directly under <c>, or inside <is> (possibly in <r> runs)
                                            b"t" => {
                                                if let Some(t) =
                                                    read_text(&mut xml, b"t", &mut text_buf)
                                                {
                                                    raw.get_or_insert_with(String::new)
                                                        .push_str(&t);
                                                }
                                            }
                                            _ => {}
                                        }
                                    }
                                    Ok(Event::End(ref inner))
                                        if inner.local_name().as_ref() == b"c" =>
                                    {
                                        break
                                    }
                                    Ok(Event::Eof) | Err(_) => break,
                                    _ => {}
                                }
                            }
                        }

                        let value = resolve_cell_value(raw.as_deref(), attrs.tag, shared_strings);
                        sheet.set_value(row, col, value);

                        let fill = attrs
                            .style
                            .and_then(|s| usize::try_from(s).ok())
                            .and_then(|idx| fills.get(idx))
                            .and_then(Option::as_deref);
                        if let Some(argb) = fill {
                            sheet.set_fill_at(row, col, argb);
                        }
                    }

                    b"mergeCell" => {
                        if let Some(range) =
                            attr_string(e, b"ref").as_deref().and_then(parse_merge_ref)
                        {
                            sheet.add_merge(range);
                        }
                    }

                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheet)
}
