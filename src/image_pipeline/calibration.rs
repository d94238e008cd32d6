//! Calibration module
//!
//! Loads the color to temperature sample table and answers nearest-color
//! queries against it.

mod kd_tree;
mod lookup;
mod npz_loader;
pub mod table;

pub use lookup::{BruteForceLookup, CalibrationIndex, ColorLookup};
pub use npz_loader::load_npz_table;
pub use table::CalibrationTable;
