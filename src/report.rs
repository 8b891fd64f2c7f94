//! Classification of the count and the images written after a run.

use std::fmt;
use std::path::{Path, PathBuf};

use image::{ImageBuffer, Pixel, PixelWithColorType, Rgb, RgbImage};
use tracing::debug;

use crate::{
    config::ReportConfig,
    drawing::draw_contours_mut,
    error::{AnalysisError, Result},
    pipeline::Analysis,
    region_labelling::scale_labels,
};

pub const OVERLAY_FILE: &str = "detected_chromosomes.png";
pub const GRAY_FILE: &str = "gray.png";
pub const BINARY_FILE: &str = "binary.png";
pub const SURE_FG_FILE: &str = "sure_fg.png";
pub const WATERSHED_FILE: &str = "watershed.png";

/// Every file written by [`write_images`], overlay first.
pub const OUTPUT_FILES: [&str; 5] = [
    OVERLAY_FILE,
    GRAY_FILE,
    BINARY_FILE,
    SURE_FG_FILE,
    WATERSHED_FILE,
];

pub const CONTOUR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// How a chromosome count compares with the expected count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Normal,
    Loss,
    Gain,
}

impl Classification {
    pub fn from_count(count: usize, expected: usize) -> Self {
        match count.cmp(&expected) {
            std::cmp::Ordering::Equal => Self::Normal,
            std::cmp::Ordering::Less => Self::Loss,
            std::cmp::Ordering::Greater => Self::Gain,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Normal => write!(f, "This appears to be a normal human karyotype."),
            Classification::Loss => {
                write!(f, "This may indicate chromosomal deletion or loss.")
            }
            Classification::Gain => {
                write!(f, "This may indicate chromosomal duplication or gain.")
            }
        }
    }
}

/// The one-line report: count followed by its classification.
pub fn summary(count: usize, expected: usize) -> String {
    format!(
        "Detected {count} chromosomes. {}",
        Classification::from_count(count, expected)
    )
}

/// The original image with every candidate outlined.
pub fn render_overlay(analysis: &Analysis, thickness: u32) -> RgbImage {
    let mut canvas = analysis.original.clone();
    draw_contours_mut(
        &mut canvas,
        analysis.candidates.iter().map(|c| &c.contour),
        CONTOUR_COLOR,
        thickness,
    );
    canvas
}

/// Writes the overlay and the intermediate images into `config.output_dir`.
///
/// Returns the written paths in the order of [`OUTPUT_FILES`].
pub fn write_images(analysis: &Analysis, config: &ReportConfig) -> Result<Vec<PathBuf>> {
    let dir = config.output_dir.as_path();
    let overlay = render_overlay(analysis, config.line_thickness);
    let watershed = scale_labels(&analysis.markers, config.watershed_scale);

    let overlay_path = save(&overlay, dir, OVERLAY_FILE)?;
    let mut written = vec![overlay_path];
    for (image, name) in [
        (&analysis.gray, GRAY_FILE),
        (&analysis.binary, BINARY_FILE),
        (&analysis.sure_fg, SURE_FG_FILE),
        (&watershed, WATERSHED_FILE),
    ] {
        written.push(save(image, dir, name)?);
    }
    Ok(written)
}

fn save<P>(image: &ImageBuffer<P, Vec<u8>>, dir: &Path, name: &str) -> Result<PathBuf>
where
    P: Pixel<Subpixel = u8> + PixelWithColorType,
{
    let path = dir.join(name);
    image
        .save(&path)
        .map_err(|source| AnalysisError::ImageWrite {
            path: path.clone(),
            source,
        })?;
    debug!(path = %path.display(), "wrote image");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_boundaries() {
        assert_eq!(Classification::from_count(46, 46), Classification::Normal);
        assert_eq!(Classification::from_count(45, 46), Classification::Loss);
        assert_eq!(Classification::from_count(0, 46), Classification::Loss);
        assert_eq!(Classification::from_count(47, 46), Classification::Gain);
    }

    #[test]
    fn summaries_are_mutually_exclusive() {
        let normal = summary(46, 46);
        let loss = summary(45, 46);
        let gain = summary(47, 46);

        assert_eq!(
            normal,
            "Detected 46 chromosomes. This appears to be a normal human karyotype."
        );
        assert!(loss.starts_with("Detected 45 chromosomes."));
        assert!(loss.contains("deletion or loss"));
        assert!(gain.starts_with("Detected 47 chromosomes."));
        assert!(gain.contains("duplication or gain"));

        for (text, others) in [
            (&normal, ["deletion or loss", "duplication or gain"]),
            (&loss, ["normal human karyotype", "duplication or gain"]),
            (&gain, ["normal human karyotype", "deletion or loss"]),
        ] {
            assert!(others.iter().all(|phrase| !text.contains(phrase)));
        }
    }

    #[test]
    fn summary_follows_configured_expectation() {
        assert!(summary(23, 23).contains("normal human karyotype"));
        assert!(summary(46, 23).contains("duplication or gain"));
    }

    #[test]
    fn save_writes_gray_and_rgb_buffers() {
        let dir = tempfile::tempdir().unwrap();
        let gray = image::GrayImage::from_fn(4, 3, |x, _| image::Luma([(x * 60) as u8]));
        let rgb = RgbImage::from_pixel(4, 3, CONTOUR_COLOR);

        let gray_path = save(&gray, dir.path(), GRAY_FILE).unwrap();
        let rgb_path = save(&rgb, dir.path(), OVERLAY_FILE).unwrap();

        assert_eq!(image::open(&gray_path).unwrap().to_luma8(), gray);
        assert_eq!(image::open(&rgb_path).unwrap().to_rgb8(), rgb);
    }

    #[test]
    fn save_into_missing_directory_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let gray = image::GrayImage::new(2, 2);

        let err = save(&gray, &missing, GRAY_FILE).unwrap_err();
        match err {
            AnalysisError::ImageWrite { path, .. } => assert_eq!(path, missing.join(GRAY_FILE)),
            other => panic!("unexpected error: {other}"),
        }
    }
}
