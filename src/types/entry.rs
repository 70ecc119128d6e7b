use serde::{Deserialize, Serialize};

/// One carrier's participation in one layer.
///
/// Every field is always serialized, with `null` for unresolved slots, so
/// downstream consumers see a fixed set of keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierEntry {
    /// Display limit of the layer, e.g. "$50M".
    pub layer_limit: String,
    /// Verbatim excess-notation text found near the carrier, or "".
    pub layer_description: String,
    /// Carrier text as written (one line of a split cell).
    pub carrier: String,
    /// Registry name the carrier text resolved to.
    pub canonical_carrier: Option<String>,
    /// Share of the layer, always on the 0-1 scale.
    pub participation_pct: Option<f64>,
    pub premium: Option<f64>,
    pub premium_share: Option<f64>,
    pub terms: Option<String>,
    pub policy_number: Option<String>,
    /// A1 reference of the source cell. For a split multi-line cell this is
    /// the original cell, not the per-line row.
    pub excel_range: String,
    pub col_span: u32,
    pub row_span: u32,
    /// ARGB hex of the carrier cell's fill.
    pub fill_color: Option<String>,
    pub attachment_point: Option<String>,
}

/// Layer totals read from summary columns, for cross-checking carrier
/// premiums against the layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub layer_limit: String,
    pub layer_target: Option<f64>,
    pub layer_rate: Option<f64>,
    pub layer_bound_premium: Option<f64>,
    /// Cell the bound premium was read from.
    pub excel_range: Option<String>,
}

impl LayerSummary {
    pub fn new(layer_limit: impl Into<String>) -> Self {
        Self {
            layer_limit: layer_limit.into(),
            layer_target: None,
            layer_rate: None,
            layer_bound_premium: None,
            excel_range: None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.layer_target.is_some() || self.layer_rate.is_some() || self.layer_bound_premium.is_some()
    }
}
