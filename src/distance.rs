//! Distance-to-background maps and seed extraction.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::{definitions::Image, distance_transform::euclidean_squared_distance_transform};

use crate::config::DistanceMetric;

pub type DistanceMap = Image<Luma<f32>>;

// Local step costs of the 5x5 chamfer mask: axial, diagonal, knight's move.
const AXIAL: f32 = 1.0;
const DIAGONAL: f32 = 1.4;
const KNIGHT: f32 = 2.1969;

/// Neighbours already visited by a raster-order scan, as `(dx, dy, cost)`.
const FORWARD_MASK: [(i64, i64, f32); 8] = [
    (-1, -2, KNIGHT),
    (1, -2, KNIGHT),
    (-2, -1, KNIGHT),
    (-1, -1, DIAGONAL),
    (0, -1, AXIAL),
    (1, -1, DIAGONAL),
    (2, -1, KNIGHT),
    (-1, 0, AXIAL),
];

/// For every non-zero pixel of `mask`, the distance to the nearest zero pixel.
///
/// Zero pixels map to `0.0`. Pixels outside the image do not count as
/// background, so a mask without any zero pixel maps to `f32::INFINITY`.
pub fn distance_to_background(mask: &GrayImage, metric: DistanceMetric) -> DistanceMap {
    match metric {
        DistanceMetric::Chamfer5 => chamfer_5x5(mask),
        DistanceMetric::Exact => exact_euclidean(mask),
    }
}

fn chamfer_5x5(mask: &GrayImage) -> DistanceMap {
    let (width, height) = mask.dimensions();
    let (w, h) = (width as i64, height as i64);
    let mut dist: Vec<f32> = mask
        .pixels()
        .map(|p| if p.0[0] == 0 { 0.0 } else { f32::INFINITY })
        .collect();

    let mut relax = |x: i64, y: i64, sign: i64| {
        let index = (y * w + x) as usize;
        if dist[index] == 0.0 {
            return;
        }
        let mut best = dist[index];
        for &(dx, dy, cost) in &FORWARD_MASK {
            let (nx, ny) = (x + sign * dx, y + sign * dy);
            if nx < 0 || ny < 0 || nx >= w || ny >= h {
                continue;
            }
            best = best.min(dist[(ny * w + nx) as usize] + cost);
        }
        dist[index] = best;
    };

    for y in 0..h {
        for x in 0..w {
            relax(x, y, 1);
        }
    }
    for y in (0..h).rev() {
        for x in (0..w).rev() {
            relax(x, y, -1);
        }
    }

    ImageBuffer::from_raw(width, height, dist).unwrap_or_else(|| DistanceMap::new(width, height))
}

fn exact_euclidean(mask: &GrayImage) -> DistanceMap {
    let background = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if mask.get_pixel(x, y).0[0] == 0 {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    let squared = euclidean_squared_distance_transform(&background);
    DistanceMap::from_fn(mask.width(), mask.height(), |x, y| {
        Luma([squared.get_pixel(x, y).0[0].sqrt() as f32])
    })
}

/// Largest finite distance in the map, or `None` when there is none.
pub fn max_distance(dist: &DistanceMap) -> Option<f32> {
    dist.pixels()
        .map(|p| p.0[0])
        .filter(|d| d.is_finite())
        .fold(None, |max, d| Some(max.map_or(d, |m: f32| m.max(d))))
}

/// Marks pixels whose distance is strictly greater than `fraction` of the
/// largest finite distance. These are the "sure foreground" cores of each blob.
pub fn sure_foreground(dist: &DistanceMap, fraction: f32) -> GrayImage {
    let cutoff = max_distance(dist).map(|max| fraction * max);
    GrayImage::from_fn(dist.width(), dist.height(), |x, y| {
        let d = dist.get_pixel(x, y).0[0];
        match cutoff {
            Some(cutoff) if d.is_finite() && d > cutoff => Luma([255]),
            _ => Luma([0]),
        }
    })
}
