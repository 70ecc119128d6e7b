//! xltower - insurance tower extraction from XLSX schematics
//!
//! Infers the structure of a free-form tower spreadsheet and emits one
//! record per carrier participation:
//! - Merge-aware block reading and content classification
//! - Registry-driven carrier matching with canonical names
//! - Layer boundaries, summary columns, headers and row labels
//! - Proximity matching of participation, premium and terms to carriers
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! let entries = xltower::extract_schematic(Path::new("tower.xlsx"), None)?;
//! for entry in &entries {
//!     println!("{} {} {:?}", entry.layer_limit, entry.carrier, entry.participation_pct);
//! }
//! # Ok::<(), xltower::XltowerError>(())
//! ```

// Reading
pub mod cell_ref;
pub mod error;
pub mod grid;
pub mod parser;
pub mod xml_helpers;

// Inference stages
pub mod blocks;
pub mod carriers;
pub mod classify;
pub mod entries;
pub mod headers;
pub mod layers;
pub mod proximity;
pub mod summary;

// Output and orchestration
pub mod extractor;
pub mod preflight;
pub mod scoring;
pub mod types;

pub use carriers::CarrierMatcher;
pub use error::{Result, XltowerError};
pub use extractor::{
    extract_schematic, extract_schematic_with_summaries, ExtractOptions, Extraction, Extractor,
};
pub use grid::{CellGrid, CellValue, GridView, MergeRange, Sheet};
pub use preflight::{preflight, preflight_file, PreflightResult};
pub use types::*;

/// Library version.
#[must_use]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
