//! Carrier entries for one layer.

use crate::blocks::Block;
use crate::carriers::CarrierMatcher;
use crate::classify::{looks_like_policy_number, FieldType};
use crate::extractor::ExtractOptions;
use crate::grid::{CellValue, GridView};
use crate::headers::{find_column_headers, find_row_labels, ColumnHeaders, RowLabels};
use crate::layers::Layer;
use crate::proximity::{is_relevant, match_participation, rank_by_proximity, CurrencySlots};
use crate::summary::SummaryColumnInfo;
use crate::types::{parse_excess_notation, CarrierEntry};

/// Split a cell listing several carriers on separate lines into one block
/// per line. Line `i` is placed at `row + i` so proximity matching lines up
/// with the data beside it. Policy numbers and non-carrier lines are
/// dropped; if nothing survives, the block is returned as is.
pub fn split_multiline_carrier(carrier: &Block, matcher: &CarrierMatcher) -> Vec<Block> {
    let CellValue::Text(text) = &carrier.value else {
        return vec![carrier.clone()];
    };
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() <= 1 {
        return vec![carrier.clone()];
    }

    let split: Vec<Block> = (0u32..)
        .zip(lines)
        .filter(|(_, line)| !looks_like_policy_number(line) && !matcher.is_non_carrier(line))
        .map(|(i, line)| Block {
            row: carrier.row + i,
            col: carrier.col,
            value: CellValue::Text(line.to_string()),
            row_span: 1,
            col_span: carrier.col_span,
            field_type: Some(FieldType::Carrier),
            confidence: carrier.confidence,
        })
        .collect();

    if split.is_empty() {
        vec![carrier.clone()]
    } else {
        split
    }
}

/// Everything entry building needs about one layer.
pub struct LayerScope<'a> {
    pub view: &'a GridView<'a>,
    pub layer: &'a Layer,
    pub headers: ColumnHeaders,
    pub labels: RowLabels,
    /// Candidate data blocks, summary columns already removed.
    pub data: Vec<&'a Block>,
    /// Label blocks of the layer, for short-alias context.
    pub context_labels: Vec<&'a Block>,
    pub matcher: &'a CarrierMatcher,
    pub options: &'a ExtractOptions,
}

impl LayerScope<'_> {
    /// Layer limit plus label text near `row`, used to gate short aliases.
    fn context_text(&self, row: u32) -> String {
        let radius = self.options.context_row_radius;
        std::iter::once(self.layer.limit.clone())
            .chain(
                self.context_labels
                    .iter()
                    .filter(|b| b.row.abs_diff(row) <= radius)
                    .map(|b| b.value.to_text()),
            )
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build the entry for `carrier`, a block or one line split from
    /// `source`. Cell reference and fill always come from `source`.
    pub fn build_entry(&self, carrier: &Block, source: &Block) -> CarrierEntry {
        let mut participation: Option<f64> = None;
        let mut slots = CurrencySlots::default();
        let mut terms: Option<String> = None;
        let mut layer_desc: Option<String> = None;

        for block in rank_by_proximity(&self.data, carrier) {
            if !is_relevant(block, carrier) {
                continue;
            }
            let Some(field_type) = block.field_type else {
                continue;
            };
            if field_type.is_percentage() {
                if participation.is_none() {
                    participation = match_participation(block, &self.labels, self.headers.rate_col);
                }
            } else if field_type.is_currency() {
                slots.offer(block, &self.headers, &self.labels);
            } else if field_type == FieldType::Terms {
                terms.get_or_insert_with(|| block.value.to_text().trim().to_string());
            } else if field_type == FieldType::LayerDescription {
                layer_desc.get_or_insert_with(|| block.value.to_text().trim().to_string());
            }
        }

        let name = carrier.value.to_text().trim().to_string();
        let attachment_point = parse_excess_notation(&name)
            .1
            .or_else(|| layer_desc.as_deref().and_then(|d| parse_excess_notation(d).1));
        let canonical_carrier = self
            .matcher
            .match_carrier(&name, &self.context_text(carrier.row))
            .map(ToString::to_string);

        CarrierEntry {
            layer_limit: self.layer.limit.clone(),
            layer_description: layer_desc.unwrap_or_default(),
            carrier: name,
            canonical_carrier,
            participation_pct: participation,
            premium: slots.premium,
            premium_share: slots.premium_share,
            terms,
            policy_number: None,
            excel_range: source.cell_ref(),
            col_span: carrier.col_span,
            row_span: carrier.row_span,
            fill_color: self.view.fill_color(source.row, source.col).map(ToString::to_string),
            attachment_point,
        }
    }
}

/// Entries for every carrier block in the layer, in scan order.
pub fn extract_layer_data(
    view: &GridView<'_>,
    blocks: &[Block],
    layer: &Layer,
    summary: &SummaryColumnInfo,
    matcher: &CarrierMatcher,
    options: &ExtractOptions,
) -> Vec<CarrierEntry> {
    let in_layer: Vec<&Block> = blocks.iter().filter(|b| layer.contains_row(b.row)).collect();

    let carriers = in_layer.iter().copied().filter(|b| {
        b.is(FieldType::Carrier)
            && b.confidence >= options.min_carrier_confidence
            && !summary.contains(b.col)
    });

    let scope = LayerScope {
        view,
        layer,
        headers: find_column_headers(blocks, layer),
        labels: find_row_labels(blocks, layer),
        data: in_layer
            .iter()
            .copied()
            .filter(|b| b.field_type.is_some_and(FieldType::is_entry_data) && !summary.contains(b.col))
            .collect(),
        context_labels: in_layer
            .iter()
            .copied()
            .filter(|b| b.is(FieldType::Label))
            .collect(),
        matcher,
        options,
    };

    let entries: Vec<CarrierEntry> = carriers
        .flat_map(|source| {
            split_multiline_carrier(source, matcher)
                .into_iter()
                .map(|line| scope.build_entry(&line, source))
                .collect::<Vec<_>>()
        })
        .collect();

    tracing::debug!(
        "Layer {} (rows {}-{}): {} entries",
        layer.limit,
        layer.start_row,
        layer.end_row,
        entries.len()
    );
    entries
}
