use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::image_pipeline::calibration::kd_tree::{squared_distance, KdTree};
use crate::image_pipeline::calibration::npz_loader::load_npz_table;
use crate::image_pipeline::calibration::table::CalibrationTable;
use crate::image_pipeline::common::error::Result;

/// Color to temperature lookup.
///
/// Implementations return one temperature per input color, taken from the
/// nearest calibration sample by Euclidean distance in RGB space. Equidistant
/// samples resolve to the lowest table ordinal.
pub trait ColorLookup: Send + Sync {
    fn nearest(&self, colors: &[[u8; 3]]) -> Vec<f32>;
}

/// k-d tree backed calibration index.
///
/// The tree stores table ordinals, so `temperatures[ordinal]` is always the
/// temperature of the matched sample.
#[derive(Debug, Clone)]
pub struct CalibrationIndex {
    tree: KdTree,
    temperatures: Vec<f32>,
}

impl CalibrationIndex {
    pub fn build(table: CalibrationTable) -> Self {
        let (colors, temperatures) = table.into_parts();
        let tree = KdTree::build(&colors);
        debug!(samples = tree.len(), "Calibration index built");
        Self { tree, temperatures }
    }

    /// Loads an `.npz` calibration table from disk and indexes it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let table = load_npz_table(path)?;
        info!(
            path = %path.display(),
            samples = table.len(),
            "Calibration table loaded"
        );
        Ok(Self::build(table))
    }

    pub fn len(&self) -> usize {
        self.temperatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperatures.is_empty()
    }

    /// Ordinal of the calibration sample nearest to `color`.
    pub fn nearest_index(&self, color: [u8; 3]) -> usize {
        // Construction goes through CalibrationTable, which is never empty.
        self.tree.nearest(color).unwrap_or(0)
    }
}

impl ColorLookup for CalibrationIndex {
    fn nearest(&self, colors: &[[u8; 3]]) -> Vec<f32> {
        // False-color imagery reuses a small palette; query each distinct color once.
        let mut memo: HashMap<[u8; 3], f32> = HashMap::new();
        colors
            .iter()
            .map(|&color| {
                *memo
                    .entry(color)
                    .or_insert_with(|| self.temperatures[self.nearest_index(color)])
            })
            .collect()
    }
}

/// Linear-scan lookup. Fine for tiny tables.
#[derive(Debug, Clone)]
pub struct BruteForceLookup {
    colors: Vec<[u8; 3]>,
    temperatures: Vec<f32>,
}

impl BruteForceLookup {
    pub fn new(table: CalibrationTable) -> Self {
        let (colors, temperatures) = table.into_parts();
        Self {
            colors,
            temperatures,
        }
    }

    fn nearest_one(&self, color: [u8; 3]) -> f32 {
        let mut best = 0;
        let mut best_distance = u32::MAX;
        for (i, &candidate) in self.colors.iter().enumerate() {
            let distance = squared_distance(color, candidate);
            if distance < best_distance {
                best_distance = distance;
                best = i;
                if distance == 0 {
                    break;
                }
            }
        }
        self.temperatures[best]
    }
}

impl ColorLookup for BruteForceLookup {
    fn nearest(&self, colors: &[[u8; 3]]) -> Vec<f32> {
        colors.iter().map(|&color| self.nearest_one(color)).collect()
    }
}
