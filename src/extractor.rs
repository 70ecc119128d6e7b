//! Pipeline orchestration.
//!
//! ```text
//! grid -> blocks -> classified blocks -> layers -> summary columns
//!                                          |
//!                                          +-> per layer: entries + layer summary
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::blocks::{classify_blocks, find_blocks};
use crate::carriers::CarrierMatcher;
use crate::entries::extract_layer_data;
use crate::error::Result;
use crate::grid::{CellGrid, GridView};
use crate::layers::identify_layers;
use crate::parser::load_sheet;
use crate::summary::{detect_summary_columns, extract_layer_summary};
use crate::types::{CarrierEntry, LayerSummary};

/// Thresholds the caller may tune.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractOptions {
    /// Numeric limit candidates above this are sheet totals.
    pub max_limit_value: f64,
    /// Last column that may hold a layer limit.
    pub max_limit_col: u32,
    /// Carrier blocks below this confidence produce no entry.
    pub min_carrier_confidence: f64,
    /// Rows around a carrier whose labels count as short-alias context.
    pub context_row_radius: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_limit_value: 1_000_000_000.0,
            max_limit_col: 2,
            min_carrier_confidence: 0.5,
            context_row_radius: 2,
        }
    }
}

/// Output of one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    pub entries: Vec<CarrierEntry>,
    pub summaries: Vec<LayerSummary>,
}

impl Extraction {
    /// No carrier entries were found; callers should stop here.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs the inference pipeline over a grid.
#[derive(Debug, Clone)]
pub struct Extractor {
    matcher: Arc<CarrierMatcher>,
    options: ExtractOptions,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(CarrierMatcher::bundled())
    }
}

impl Extractor {
    pub fn new(matcher: Arc<CarrierMatcher>) -> Self {
        Self {
            matcher,
            options: ExtractOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn matcher(&self) -> &CarrierMatcher {
        &self.matcher
    }

    /// Extract carrier entries and layer summaries. Never fails: a sheet
    /// with no recognizable structure yields an empty [`Extraction`].
    pub fn extract(&self, grid: &dyn CellGrid) -> Extraction {
        let view = GridView::new(grid);

        let mut blocks = find_blocks(&view);
        classify_blocks(&mut blocks, &self.matcher);
        tracing::debug!("Sheet {}: {} blocks", grid.name(), blocks.len());

        let layers = identify_layers(&blocks, view.max_row(), &self.options);
        let summary_info = detect_summary_columns(&view);

        let mut extraction = Extraction::default();
        for layer in &layers {
            extraction.entries.extend(extract_layer_data(
                &view,
                &blocks,
                layer,
                &summary_info,
                &self.matcher,
                &self.options,
            ));
            extraction
                .summaries
                .extend(extract_layer_summary(&view, layer, &summary_info));
        }

        tracing::debug!(
            "Extracted {} entries and {} layer summaries from {} layers",
            extraction.entries.len(),
            extraction.summaries.len(),
            layers.len()
        );
        extraction
    }
}

/// Carrier entries from a workbook on disk, using the bundled registry.
pub fn extract_schematic(path: &Path, sheet_name: Option<&str>) -> Result<Vec<CarrierEntry>> {
    Ok(extract_schematic_with_summaries(path, sheet_name)?.0)
}

/// Carrier entries and layer summaries from a workbook on disk.
pub fn extract_schematic_with_summaries(
    path: &Path,
    sheet_name: Option<&str>,
) -> Result<(Vec<CarrierEntry>, Vec<LayerSummary>)> {
    let sheet = load_sheet(path, sheet_name)?;
    let Extraction { entries, summaries } = Extractor::default().extract(&sheet);
    Ok((entries, summaries))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::grid::Sheet;

    fn extractor() -> Extractor {
        let matcher = CarrierMatcher::from_yaml_str(
            r"
carrier_entities:
  - canonical: Travelers
    aliases: [Travelers, St. Paul]
",
        )
        .unwrap();
        Extractor::new(Arc::new(matcher))
    }

    #[test]
    fn empty_sheet_is_empty() {
        let extraction = extractor().extract(&Sheet::new("Blank"));
        assert!(extraction.is_empty());
        assert!(extraction.summaries.is_empty());
    }

    #[test]
    fn text_without_limits_has_no_entries() {
        let mut sheet = Sheet::new("Notes");
        sheet.set("C3", "Travelers Insurance").unwrap();
        sheet.set("C4", 0.5).unwrap();
        assert!(extractor().extract(&sheet).is_empty());
    }

    #[test]
    fn two_layers_in_row_order() {
        let mut sheet = Sheet::new("Tower");
        sheet.set("A1", "$10M").unwrap();
        sheet.set("C1", "$10M xs $5M").unwrap();
        sheet.set("B2", "Travelers Insurance Company").unwrap();
        sheet.set("B3", 1.0).unwrap();
        sheet.set("A5", "$5M").unwrap();
        sheet.set("B6", "Primary Carrier Inc").unwrap();
        sheet.set("B7", 100).unwrap();

        let extraction = extractor().extract(&sheet);
        assert_eq!(extraction.entries.len(), 2);
        let first = &extraction.entries[0];
        assert_eq!(first.layer_limit, "$10M");
        assert_eq!(first.attachment_point.as_deref(), Some("$5M"));
        assert_eq!(first.canonical_carrier.as_deref(), Some("Travelers"));
        assert_eq!(first.participation_pct, Some(1.0));
        assert_eq!(extraction.entries[1].layer_limit, "$5M");
        assert_eq!(extraction.entries[1].participation_pct, Some(1.0));
    }

    #[test]
    fn low_confidence_carriers_are_dropped_by_option() {
        let mut sheet = Sheet::new("Tower");
        sheet.set("A1", "$10M").unwrap();
        sheet.set("B2", "Primary Carrier Inc").unwrap();

        assert_eq!(extractor().extract(&sheet).entries.len(), 1);
        let strict = extractor().with_options(ExtractOptions {
            min_carrier_confidence: 0.95,
            ..ExtractOptions::default()
        });
        assert!(strict.extract(&sheet).is_empty());
    }

    #[test]
    fn summaries_follow_layers() {
        let mut sheet = Sheet::new("Tower");
        sheet.set("E1", "Bound Premium").unwrap();
        sheet.set("A2", "$25M").unwrap();
        sheet.set("B3", "Travelers").unwrap();
        sheet.set("E3", 420_000.0).unwrap();

        let extraction = extractor().extract(&sheet);
        assert_eq!(extraction.summaries.len(), 1);
        assert_eq!(extraction.summaries[0].layer_limit, "$25M");
        assert_eq!(extraction.summaries[0].layer_bound_premium, Some(420_000.0));
    }
}
