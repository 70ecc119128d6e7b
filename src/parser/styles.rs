//! Cell fills from xl/styles.xml.
//!
//! Only the pattern-fill foreground RGB is kept, resolved per cell format
//! (`cellXfs` index) so the worksheet parser can look it up by a cell's `s`
//! attribute. Theme and indexed colors are not resolved.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

use crate::xml_helpers::{attr_string, attr_u32};

/// Fill color per `cellXfs` index; `None` where the format has no RGB fill.
pub(super) fn parse_cell_fills<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Vec<Option<String>> {
    let styles_path = path.unwrap_or("xl/styles.xml");
    let Ok(file) = archive.by_name(styles_path) else {
        return Vec::new();
    };
    read_cell_fills(BufReader::new(file))
}

pub(super) fn read_cell_fills<B: BufRead>(reader: B) -> Vec<Option<String>> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut fills: Vec<Option<String>> = Vec::new();
    let mut xf_fill_ids: Vec<Option<u32>> = Vec::new();

    let mut in_fills = false;
    let mut in_fill = false;
    let mut in_cell_xfs = false;
    let mut current_fill: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"fills" => in_fills = !is_empty,
                    b"fill" if in_fills => {
                        current_fill = None;
                        if is_empty {
                            fills.push(None);
                        } else {
                            in_fill = true;
                        }
                    }
                    b"fgColor" if in_fill => {
                        current_fill = attr_string(e, b"rgb");
                    }
                    b"cellXfs" => in_cell_xfs = !is_empty,
                    b"xf" if in_cell_xfs => {
                        xf_fill_ids.push(attr_u32(e, b"fillId"));
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"fills" => in_fills = false,
                b"fill" if in_fill => {
                    fills.push(current_fill.take());
                    in_fill = false;
                }
                b"cellXfs" => in_cell_xfs = false,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    xf_fill_ids
        .into_iter()
        .map(|fill_id| {
            fill_id
                .and_then(|id| fills.get(usize::try_from(id).ok()?).cloned())
                .flatten()
        })
        .collect()
}
