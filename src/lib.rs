//! Chromosome counting for karyotype spread images, built on [imageproc].
//!
//! The pipeline is a fixed sequence of stages: grayscale conversion and CLAHE,
//! inverted Otsu binarization, opening and closing, a distance transform whose
//! cores seed a marker-controlled watershed, and finally per-region contour
//! tracing with area and shape filters. The surviving contours are counted and
//! compared with the expected diploid count.
//!
//! ```no_run
//! use karyotype_analyzer::KaryotypeAnalyzer;
//! use std::path::Path;
//!
//! let analyzer = KaryotypeAnalyzer::default();
//! let analysis = analyzer.analyze(Path::new("spread.png"))?;
//! println!("{}", analysis.summary());
//! analyzer.write_images(&analysis)?;
//! # Ok::<(), karyotype_analyzer::AnalysisError>(())
//! ```

pub mod config;
pub mod contours;
pub mod distance;
pub mod drawing;
mod error;
pub mod morphology;
pub mod pipeline;
pub mod preprocess;
pub mod rect;
pub mod region_labelling;
pub mod report;
pub mod threshold;
pub mod watershed;

pub use config::{AnalyzerConfig, CandidateFilter, DistanceMetric};
pub use contours::Candidate;
pub use error::{AnalysisError, LOAD_ERROR_MESSAGE, Result};
pub use pipeline::{Analysis, KaryotypeAnalyzer, analyze_karyotype};
pub use region_labelling::LabelMap;
pub use report::Classification;
