//! Tunable parameters of the analysis pipeline.
//!
//! Every threshold is empirical and tied to the image scale the defaults were
//! tuned for, so all of them live here instead of inline in the stages.
//!
//! ```no_run
//! use karyotype_analyzer::AnalyzerConfig;
//! use std::path::Path;
//!
//! let config = AnalyzerConfig::from_json_file(Path::new("karyotype.json"))?;
//! # Ok::<(), karyotype_analyzer::AnalysisError>(())
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub preprocessing: PreprocessingConfig,
    pub morphology: MorphologyConfig,
    pub segmentation: SegmentationConfig,
    pub filter: CandidateFilter,
    pub report: ReportConfig,
}

/// Contrast-limited adaptive histogram equalization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Contrast limit relative to a flat histogram. Values `<= 0` disable clipping.
    pub clip_limit: f32,
    /// Number of tiles along x and y.
    pub tile_grid: [u32; 2],
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            clip_limit: 2.0,
            tile_grid: [8, 8],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologyConfig {
    /// Chebyshev radius of the square structuring element; 1 gives a 3x3 square.
    pub radius: u8,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self { radius: 1 }
    }
}

/// How the distance-to-background map is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Two-pass 5x5 chamfer approximation of the Euclidean distance.
    #[default]
    Chamfer5,
    /// Exact Euclidean distance.
    Exact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Seeds are pixels whose distance exceeds this fraction of the maximum distance.
    pub seed_fraction: f32,
    pub distance: DistanceMetric,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            seed_fraction: 0.5,
            distance: DistanceMetric::Chamfer5,
        }
    }
}

/// Acceptance criteria for chromosome candidates.
///
/// Both bounds are exclusive: a contour is kept when
/// `min_area < area < max_area` and `height / width > min_aspect_ratio`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateFilter {
    pub min_area: f64,
    pub max_area: f64,
    pub min_aspect_ratio: f64,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self {
            min_area: 20.0,
            max_area: 10_000.0,
            min_aspect_ratio: 1.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Chromosome count of a normal karyotype (human diploid).
    pub expected_count: usize,
    /// Directory the output images are written to.
    pub output_dir: PathBuf,
    /// Line width of the contours drawn on the overlay.
    pub line_thickness: u32,
    /// Multiplier applied to labels in `watershed.png`.
    pub watershed_scale: u8,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            expected_count: 46,
            output_dir: PathBuf::from("."),
            line_thickness: 2,
            watershed_scale: 10,
        }
    }
}

impl AnalyzerConfig {
    /// Loads a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| AnalysisError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|source| AnalysisError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable by the pipeline.
    pub fn validate(&self) -> Result<()> {
        let [tiles_x, tiles_y] = self.preprocessing.tile_grid;
        if tiles_x == 0 || tiles_y == 0 {
            return Err(AnalysisError::InvalidConfig(
                "tile_grid must be positive in both directions".into(),
            ));
        }
        if !self.preprocessing.clip_limit.is_finite() {
            return Err(AnalysisError::InvalidConfig(
                "clip_limit must be finite".into(),
            ));
        }
        let seed = self.segmentation.seed_fraction;
        if !(0.0..1.0).contains(&seed) {
            return Err(AnalysisError::InvalidConfig(format!(
                "seed_fraction must be in [0, 1), got {seed}"
            )));
        }
        let filter = &self.filter;
        if !(filter.min_area.is_finite() && filter.max_area.is_finite())
            || filter.min_area >= filter.max_area
        {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_area ({}) must be below max_area ({})",
                filter.min_area, filter.max_area
            )));
        }
        if !filter.min_aspect_ratio.is_finite() {
            return Err(AnalysisError::InvalidConfig(
                "min_aspect_ratio must be finite".into(),
            ));
        }
        if self.report.line_thickness == 0 {
            return Err(AnalysisError::InvalidConfig(
                "line_thickness must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
