//! Output records and limit-string helpers.

mod entry;
mod limits;

pub use entry::*;
pub use limits::*;
