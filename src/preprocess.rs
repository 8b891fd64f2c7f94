//! Grayscale conversion and contrast-limited adaptive histogram equalization.

use image::{GrayImage, Luma, RgbImage};

use crate::config::PreprocessingConfig;

const HIST_SIZE: usize = 256;

/// Converts an RGB image to 8-bit luma with the Rec. 601 weights
/// (0.299, 0.587, 0.114), evaluated in 14-bit fixed point.
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    const SHIFT: u32 = 14;
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let luma = (r as u32 * R + g as u32 * G + b as u32 * B + (1 << (SHIFT - 1))) >> SHIFT;
        Luma([luma as u8])
    })
}

/// Contrast-limited adaptive histogram equalization over a fixed tile grid.
///
/// Each tile gets its own clipped, equalized lookup table; every output pixel
/// is a bilinear blend of the tables of the four tiles whose centres surround it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clahe {
    clip_limit: f32,
    tiles_x: u32,
    tiles_y: u32,
}

impl Clahe {
    /// # Panics
    ///
    /// Panics if either tile count is zero.
    pub fn new(clip_limit: f32, tile_grid: [u32; 2]) -> Self {
        assert!(
            tile_grid[0] > 0 && tile_grid[1] > 0,
            "tile grid must be positive in both directions"
        );
        Self {
            clip_limit,
            tiles_x: tile_grid[0],
            tiles_y: tile_grid[1],
        }
    }

    pub fn from_config(config: &PreprocessingConfig) -> Self {
        Self::new(config.clip_limit, config.tile_grid)
    }

    pub fn apply(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return image.clone();
        }

        let (tx, ty) = (self.tiles_x, self.tiles_y);
        // Histograms are taken over an image padded up to a multiple of the grid.
        let (padded_w, padded_h) = if width % tx == 0 && height % ty == 0 {
            (width, height)
        } else {
            (width + tx - width % tx, height + ty - height % ty)
        };
        let tile_w = padded_w / tx;
        let tile_h = padded_h / ty;

        let luts = self.tile_luts(image, tile_w, tile_h);
        let lut = |tile_x: usize, tile_y: usize| &luts[tile_y * tx as usize + tile_x];

        let inv_tw = 1.0f32 / tile_w as f32;
        let inv_th = 1.0f32 / tile_h as f32;
        let column_weights: Vec<(usize, usize, f32)> = (0..width)
            .map(|x| interpolation_weights(x as f32 * inv_tw - 0.5, tx as usize))
            .collect();

        let mut out = GrayImage::new(width, height);
        for y in 0..height {
            let (ty1, ty2, ya) = interpolation_weights(y as f32 * inv_th - 0.5, ty as usize);
            for x in 0..width {
                let (tx1, tx2, xa) = column_weights[x as usize];
                let v = image.get_pixel(x, y).0[0] as usize;

                let top = lut(tx1, ty1)[v] as f32 * (1.0 - xa) + lut(tx2, ty1)[v] as f32 * xa;
                let bottom = lut(tx1, ty2)[v] as f32 * (1.0 - xa) + lut(tx2, ty2)[v] as f32 * xa;
                let value = top * (1.0 - ya) + bottom * ya;

                out.put_pixel(x, y, Luma([saturate_u8(value)]));
            }
        }
        out
    }

    fn tile_luts(&self, image: &GrayImage, tile_w: u32, tile_h: u32) -> Vec<[u8; HIST_SIZE]> {
        let (width, height) = image.dimensions();
        let tile_area = tile_w as usize * tile_h as usize;
        let lut_scale = (HIST_SIZE - 1) as f32 / tile_area as f32;

        let clip = if self.clip_limit > 0.0 {
            let limit = (self.clip_limit as f64 * tile_area as f64 / HIST_SIZE as f64) as usize;
            limit.max(1)
        } else {
            0
        };

        let mut luts = Vec::with_capacity((self.tiles_x * self.tiles_y) as usize);
        for tile_y in 0..self.tiles_y {
            for tile_x in 0..self.tiles_x {
                let mut hist = [0usize; HIST_SIZE];
                for py in tile_y * tile_h..(tile_y + 1) * tile_h {
                    let sy = reflect_101(py, height);
                    for px in tile_x * tile_w..(tile_x + 1) * tile_w {
                        let sx = reflect_101(px, width);
                        hist[image.get_pixel(sx, sy).0[0] as usize] += 1;
                    }
                }

                if clip > 0 {
                    clip_histogram(&mut hist, clip);
                }

                let mut lut = [0u8; HIST_SIZE];
                let mut sum = 0usize;
                for (entry, count) in lut.iter_mut().zip(hist) {
                    sum += count;
                    *entry = saturate_u8(sum as f32 * lut_scale);
                }
                luts.push(lut);
            }
        }
        luts
    }
}

impl Default for Clahe {
    fn default() -> Self {
        Self::from_config(&PreprocessingConfig::default())
    }
}

/// Converts and equalizes in one step.
pub fn preprocess(image: &RgbImage, config: &PreprocessingConfig) -> GrayImage {
    Clahe::from_config(config).apply(&to_grayscale(image))
}

/// Caps every bin at `clip` and spreads the excess back over the histogram.
fn clip_histogram(hist: &mut [usize; HIST_SIZE], clip: usize) {
    let mut clipped = 0;
    for count in hist.iter_mut() {
        if *count > clip {
            clipped += *count - clip;
            *count = clip;
        }
    }

    let batch = clipped / HIST_SIZE;
    let mut residual = clipped - batch * HIST_SIZE;
    for count in hist.iter_mut() {
        *count += batch;
    }

    if residual > 0 {
        let step = (HIST_SIZE / residual).max(1);
        let mut i = 0;
        while i < HIST_SIZE && residual > 0 {
            hist[i] += 1;
            i += step;
            residual -= 1;
        }
    }
}

/// Returns the two neighbouring tile indices and the weight of the second one.
fn interpolation_weights(position: f32, tiles: usize) -> (usize, usize, f32) {
    let lower = position.floor();
    let weight = position - lower;
    let first = (lower as i64).max(0) as usize;
    let second = ((lower as i64 + 1).max(0) as usize).min(tiles - 1);
    (first.min(tiles - 1), second, weight)
}

/// Mirrors an out-of-range coordinate without repeating the edge pixel.
fn reflect_101(i: u32, len: u32) -> u32 {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let i = i % period;
    if i < len { i } else { period - i }
}

fn saturate_u8(value: f32) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}
