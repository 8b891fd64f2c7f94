//! Label maps: seed markers for the watershed and their visualizations.

use std::collections::HashMap;

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::{
    definitions::Image,
    region_labelling::{Connectivity, connected_components},
};
use palette::{FromColor, Hsl, Srgb};

/// Per-pixel region ids. `0` is unknown, `-1` a watershed line, positive values are regions.
pub type LabelMap = Image<Luma<i32>>;

pub const UNKNOWN: i32 = 0;
pub const WATERSHED_BOUNDARY: i32 = -1;

/// Builds the watershed markers from the seed mask and the cleaned foreground mask.
///
/// Seed regions are labeled with 8-connectivity and every id is shifted by one,
/// so the seed background becomes region `1` and seeds are `2, 3, ...`. Pixels
/// that are foreground in `mask` but not seeds are set to [`UNKNOWN`].
///
/// Returns the markers and the number of seed regions.
///
/// # Panics
///
/// Panics if the two masks have different dimensions.
pub fn seed_markers(sure_fg: &GrayImage, mask: &GrayImage) -> (LabelMap, usize) {
    assert_eq!(
        sure_fg.dimensions(),
        mask.dimensions(),
        "seed and foreground masks must have the same dimensions"
    );

    let components = connected_components(sure_fg, Connectivity::Eight, Luma([0u8]));
    let seeds = components.pixels().map(|p| p.0[0]).max().unwrap_or(0) as usize;

    let markers = LabelMap::from_fn(sure_fg.width(), sure_fg.height(), |x, y| {
        let unknown = mask.get_pixel(x, y).0[0] > 0 && sure_fg.get_pixel(x, y).0[0] == 0;
        if unknown {
            Luma([UNKNOWN])
        } else {
            Luma([components.get_pixel(x, y).0[0] as i32 + 1])
        }
    });

    (markers, seeds)
}

/// Renders labels as gray levels `label * scale`.
///
/// Values saturate at the largest multiple of `scale` that fits in a byte, so
/// every output value stays a multiple of `scale`. [`UNKNOWN`] and
/// [`WATERSHED_BOUNDARY`] render as 0.
pub fn scale_labels(labels: &LabelMap, scale: u8) -> GrayImage {
    let ceiling = if scale == 0 {
        0
    } else {
        (u8::MAX / scale) as i64 * scale as i64
    };
    GrayImage::from_fn(labels.width(), labels.height(), |x, y| {
        let label = labels.get_pixel(x, y).0[0] as i64;
        Luma([(label.max(0) * scale as i64).min(ceiling) as u8])
    })
}

/// Colours the `n` largest regions with visually distinct colours.
///
/// Regions are ranked by pixel count (ties by ascending label). Everything
/// else, including unknown and boundary pixels, gets `background`.
pub fn draw_principal_regions(labels: &LabelMap, n: usize, background: Rgb<u8>) -> RgbImage {
    let mut areas: HashMap<i32, usize> = HashMap::new();
    for pixel in labels.pixels() {
        let label = pixel.0[0];
        if label > 0 {
            *areas.entry(label).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(i32, usize)> = areas.into_iter().collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(n);

    let colors = distinct_colors(ranked.len());
    let palette: HashMap<i32, Rgb<u8>> = ranked
        .iter()
        .zip(colors)
        .map(|(&(label, _), color)| (label, color))
        .collect();

    RgbImage::from_fn(labels.width(), labels.height(), |x, y| {
        palette
            .get(&labels.get_pixel(x, y).0[0])
            .copied()
            .unwrap_or(background)
    })
}

/// `n` colours evenly spaced around the hue circle.
fn distinct_colors(n: usize) -> Vec<Rgb<u8>> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 * 360.0) / n as f32;
            let rgb: Srgb<f32> = Srgb::from_color(Hsl::new(hue, 0.9, 0.5));
            let rgb: Srgb<u8> = rgb.into_format();
            Rgb([rgb.red, rgb.green, rgb.blue])
        })
        .collect()
}
