use std::path::Path;
use std::time::Instant;

use image::{GrayImage, RgbImage};
use tracing::{debug, info};

use crate::{
    config::AnalyzerConfig,
    contours::{Candidate, extract_candidates},
    distance::{distance_to_background, sure_foreground},
    error::{AnalysisError, Result},
    morphology::clean_mask,
    preprocess::preprocess,
    region_labelling::{LabelMap, seed_markers},
    report::{self, Classification},
    threshold::otsu_inverted,
    watershed::watershed,
};

/// Everything one run produces, kept so the caller can inspect or render it.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The decoded input.
    pub original: RgbImage,
    /// Equalized grayscale.
    pub gray: GrayImage,
    /// Otsu level used to binarize `gray`.
    pub threshold: u8,
    /// Foreground mask after opening and closing.
    pub binary: GrayImage,
    /// Seed cores of the distance transform.
    pub sure_fg: GrayImage,
    /// Number of connected seed regions.
    pub seed_regions: usize,
    /// Label map after the watershed.
    pub markers: LabelMap,
    /// Contours that passed both filters.
    pub candidates: Vec<Candidate>,
    /// Count a normal karyotype is expected to have.
    pub expected_count: usize,
}

impl Analysis {
    pub fn count(&self) -> usize {
        self.candidates.len()
    }

    pub fn classification(&self) -> Classification {
        Classification::from_count(self.count(), self.expected_count)
    }

    pub fn summary(&self) -> String {
        report::summary(self.count(), self.expected_count)
    }
}

/// Runs the fixed chromosome-counting pipeline.
#[derive(Debug, Clone, Default)]
pub struct KaryotypeAnalyzer {
    config: AnalyzerConfig,
}

impl KaryotypeAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Decodes an image file into 8-bit RGB.
    pub fn load(path: &Path) -> Result<RgbImage> {
        match image::open(path) {
            Ok(image) => Ok(image.to_rgb8()),
            Err(source) => {
                debug!(path = %path.display(), error = %source, "could not load image");
                Err(AnalysisError::ImageLoad {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    /// Loads `path` and analyzes it without writing anything.
    pub fn analyze(&self, path: &Path) -> Result<Analysis> {
        let image = Self::load(path)?;
        Ok(self.analyze_image(&image))
    }

    /// Runs every stage on an already decoded image.
    pub fn analyze_image(&self, image: &RgbImage) -> Analysis {
        let start = Instant::now();
        let config = &self.config;

        let gray = preprocess(image, &config.preprocessing);

        let (binary, threshold) = otsu_inverted(&gray);
        let binary = clean_mask(&binary, config.morphology.radius);
        debug!(threshold, "binarized");

        let dist = distance_to_background(&binary, config.segmentation.distance);
        let sure_fg = sure_foreground(&dist, config.segmentation.seed_fraction);
        let (mut markers, seed_regions) = seed_markers(&sure_fg, &binary);
        watershed(image, &mut markers);
        debug!(seed_regions, "segmented");

        let mut candidates = extract_candidates(&markers);
        let traced = candidates.len();
        config.filter.apply(&mut candidates);
        debug!(traced, kept = candidates.len(), "filtered contours");

        info!(
            count = candidates.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "analysis finished"
        );

        Analysis {
            original: image.clone(),
            gray,
            threshold,
            binary,
            sure_fg,
            seed_regions,
            markers,
            candidates,
            expected_count: config.report.expected_count,
        }
    }

    /// Writes the overlay and intermediate images for `analysis`.
    pub fn write_images(&self, analysis: &Analysis) -> Result<()> {
        report::write_images(analysis, &self.config.report)?;
        Ok(())
    }

    /// Analyzes `path`, writes all output images and returns the report line.
    ///
    /// Nothing is written when the image cannot be loaded.
    pub fn run(&self, path: &Path) -> Result<String> {
        let analysis = self.analyze(path)?;
        self.write_images(&analysis)?;
        Ok(analysis.summary())
    }
}

/// Runs the default pipeline on `path`, writing the images into the current
/// directory, and returns either the report line or the error message.
pub fn analyze_karyotype(path: impl AsRef<Path>) -> String {
    match KaryotypeAnalyzer::default().run(path.as_ref()) {
        Ok(summary) => summary,
        Err(err) => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LOAD_ERROR_MESSAGE;
    use crate::report::OUTPUT_FILES;
    use image::Rgb;

    const PAPER: Rgb<u8> = Rgb([235, 235, 235]);
    const INK: Rgb<u8> = Rgb([40, 40, 40]);

    /// Light background with dark axis-aligned blocks `(x, y, width, height)`.
    fn spread(width: u32, height: u32, blocks: &[(u32, u32, u32, u32)]) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let inside = blocks
                .iter()
                .any(|&(bx, by, bw, bh)| (bx..bx + bw).contains(&x) && (by..by + bh).contains(&y));
            if inside { INK } else { PAPER }
        })
    }

    fn analyzer_writing_to(dir: &Path) -> KaryotypeAnalyzer {
        let mut config = AnalyzerConfig::default();
        config.report.output_dir = dir.to_path_buf();
        KaryotypeAnalyzer::new(config).unwrap()
    }

    #[test]
    fn separated_rods_are_counted() {
        let image = spread(
            160,
            120,
            &[(20, 30, 10, 40), (70, 30, 10, 40), (120, 30, 10, 40)],
        );
        let analysis = KaryotypeAnalyzer::default().analyze_image(&image);

        assert_eq!(analysis.count(), 3);
        assert_eq!(analysis.classification(), Classification::Loss);
        assert!(analysis.summary().starts_with("Detected 3 chromosomes."));
        for candidate in &analysis.candidates {
            assert!(candidate.aspect_ratio().unwrap() > 1.02);
        }
    }

    #[test]
    fn specks_squares_and_large_blobs_are_rejected() {
        let image = spread(
            240,
            240,
            &[
                (10, 10, 1, 1),     // single-pixel speck
                (30, 200, 20, 20),  // square
                (80, 60, 150, 120), // far above the area limit
            ],
        );
        let analysis = KaryotypeAnalyzer::default().analyze_image(&image);
        assert_eq!(analysis.count(), 0);
    }

    #[test]
    fn horizontal_rods_are_rejected() {
        let image = spread(160, 120, &[(30, 40, 60, 12)]);
        let analysis = KaryotypeAnalyzer::default().analyze_image(&image);
        assert_eq!(analysis.count(), 0);
    }

    #[test]
    fn blank_image_yields_zero() {
        let image = RgbImage::from_pixel(64, 64, PAPER);
        let analysis = KaryotypeAnalyzer::default().analyze_image(&image);
        assert_eq!(analysis.count(), 0);
        assert_eq!(analysis.markers.dimensions(), (64, 64));
    }

    #[test]
    fn unreadable_path_returns_message_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = analyzer_writing_to(dir.path());

        let err = analyzer
            .run(&dir.path().join("does-not-exist.png"))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ImageLoad { .. }));
        assert_eq!(err.to_string(), LOAD_ERROR_MESSAGE);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        assert_eq!(
            analyze_karyotype(dir.path().join("does-not-exist.png")),
            LOAD_ERROR_MESSAGE
        );
    }

    #[test]
    fn undecodable_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = KaryotypeAnalyzer::default().analyze(&path).unwrap_err();
        assert_eq!(err.to_string(), LOAD_ERROR_MESSAGE);
    }

    #[test]
    fn run_writes_all_outputs() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let input = input_dir.path().join("spread.png");
        spread(120, 100, &[(30, 20, 10, 40), (80, 25, 12, 36)])
            .save(&input)
            .unwrap();

        let summary = analyzer_writing_to(output_dir.path()).run(&input).unwrap();
        assert!(summary.starts_with("Detected 2 chromosomes."));

        for name in OUTPUT_FILES {
            assert!(output_dir.path().join(name).is_file(), "{name} missing");
        }

        let watershed = image::open(output_dir.path().join("watershed.png"))
            .unwrap()
            .to_luma8();
        assert!(watershed.pixels().all(|p| p.0[0] % 10 == 0));

        let overlay = image::open(output_dir.path().join("detected_chromosomes.png"))
            .unwrap()
            .to_rgb8();
        assert!(overlay.pixels().any(|p| *p == Rgb([0, 255, 0])));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let input_dir = tempfile::tempdir().unwrap();
        let input = input_dir.path().join("spread.png");
        let image = RgbImage::from_fn(96, 96, |x, y| {
            let rod = (x / 12) % 2 == 1 && (10..80).contains(&y);
            let shade = ((x * 3 + y * 5) % 40) as u8;
            if rod {
                Rgb([50 + shade, 40 + shade, 60 + shade])
            } else {
                Rgb([200 + shade, 210 + shade / 2, 205])
            }
        });
        image.save(&input).unwrap();

        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let a = analyzer_writing_to(first.path()).run(&input).unwrap();
        let b = analyzer_writing_to(second.path()).run(&input).unwrap();
        assert_eq!(a, b);

        for name in OUTPUT_FILES {
            let left = std::fs::read(first.path().join(name)).unwrap();
            let right = std::fs::read(second.path().join(name)).unwrap();
            assert_eq!(left, right, "{name} differs between runs");
        }
    }
}
