//! Marker-controlled watershed flooding guided by colour differences.

use std::collections::VecDeque;

use image::RgbImage;

use crate::region_labelling::{LabelMap, UNKNOWN, WATERSHED_BOUNDARY};

const IN_QUEUE: i32 = -2;
const LEVELS: usize = 256;

/// Grows the positive labels of `markers` through the unknown (`0`) pixels.
///
/// Pixels are flooded in order of the colour difference to the neighbour that
/// reached them, lowest first, first in first out within a level. A pixel whose
/// labeled neighbours disagree becomes [`WATERSHED_BOUNDARY`]. The outermost
/// rows and columns are always set to [`WATERSHED_BOUNDARY`]; unknown pixels no
/// seed can reach stay [`UNKNOWN`].
///
/// # Panics
///
/// Panics if `image` and `markers` have different dimensions.
pub fn watershed(image: &RgbImage, markers: &mut LabelMap) {
    assert_eq!(
        image.dimensions(),
        markers.dimensions(),
        "image and markers must have the same dimensions"
    );

    let (width, height) = markers.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let (w, h) = (width as usize, height as usize);
    let pixels = image.as_raw();
    let labels: &mut [i32] = markers;

    for x in 0..w {
        labels[x] = WATERSHED_BOUNDARY;
        labels[(h - 1) * w + x] = WATERSHED_BOUNDARY;
    }
    for y in 0..h {
        labels[y * w] = WATERSHED_BOUNDARY;
        labels[y * w + w - 1] = WATERSHED_BOUNDARY;
    }

    let colour_diff = |a: usize, b: usize| -> usize {
        (0..3)
            .map(|c| pixels[3 * a + c].abs_diff(pixels[3 * b + c]))
            .max()
            .unwrap_or(0) as usize
    };
    let neighbours = |i: usize| [i - 1, i + 1, i - w, i + w];

    let mut queues: Vec<VecDeque<usize>> = vec![VecDeque::new(); LEVELS];

    for y in 1..h.saturating_sub(1) {
        for x in 1..w - 1 {
            let i = y * w + x;
            if labels[i] < 0 {
                labels[i] = UNKNOWN;
            }
            if labels[i] != UNKNOWN {
                continue;
            }
            let level = neighbours(i)
                .into_iter()
                .filter(|&n| labels[n] > 0)
                .map(|n| colour_diff(i, n))
                .min();
            if let Some(level) = level {
                queues[level].push_back(i);
                labels[i] = IN_QUEUE;
            }
        }
    }

    let mut active = 0;
    loop {
        if queues[active].is_empty() {
            match (active + 1..LEVELS).find(|&q| !queues[q].is_empty()) {
                Some(q) => active = q,
                None => break,
            }
        }
        let Some(i) = queues[active].pop_front() else {
            continue;
        };

        let mut label = UNKNOWN;
        for n in neighbours(i) {
            let t = labels[n];
            if t > 0 {
                if label == UNKNOWN {
                    label = t;
                } else if t != label {
                    label = WATERSHED_BOUNDARY;
                }
            }
        }
        debug_assert!(label != UNKNOWN, "queued pixel without labeled neighbour");
        labels[i] = label;
        if label == WATERSHED_BOUNDARY {
            continue;
        }

        for n in neighbours(i) {
            if labels[n] == UNKNOWN {
                let level = colour_diff(n, i);
                queues[level].push_back(n);
                active = active.min(level);
                labels[n] = IN_QUEUE;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    fn markers_from_rows(rows: &[&[i32]]) -> LabelMap {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        LabelMap::from_fn(width, height, |x, y| Luma([rows[y as usize][x as usize]]))
    }

    fn row(labels: &LabelMap, y: u32) -> Vec<i32> {
        (0..labels.width()).map(|x| labels.get_pixel(x, y).0[0]).collect()
    }

    #[test]
    fn equal_fronts_meet_in_a_boundary_line() {
        let image = RgbImage::from_pixel(7, 5, Rgb([100, 100, 100]));
        let mut markers = markers_from_rows(&[
            &[1, 1, 1, 1, 1, 1, 1],
            &[1, 2, 0, 0, 0, 3, 1],
            &[1, 2, 0, 0, 0, 3, 1],
            &[1, 2, 0, 0, 0, 3, 1],
            &[1, 1, 1, 1, 1, 1, 1],
        ]);

        watershed(&image, &mut markers);

        for y in 1..4 {
            assert_eq!(row(&markers, y), vec![-1, 2, 2, -1, 3, 3, -1]);
        }
        assert!(row(&markers, 0).iter().all(|&l| l == WATERSHED_BOUNDARY));
        assert!(row(&markers, 4).iter().all(|&l| l == WATERSHED_BOUNDARY));
    }

    #[test]
    fn colour_edges_hold_back_the_flood() {
        // Black on the left, white from column 7 on; seeds at columns 1 and 8.
        let image = RgbImage::from_fn(10, 3, |x, _| {
            if x < 7 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let mut markers = markers_from_rows(&[
            &[0; 10],
            &[0, 2, 0, 0, 0, 0, 0, 0, 3, 0],
            &[0; 10],
        ]);

        watershed(&image, &mut markers);

        assert_eq!(row(&markers, 1), vec![-1, 2, 2, 2, 2, 2, -1, 3, 3, -1]);
    }

    #[test]
    fn unreachable_pixels_stay_unknown() {
        let image = RgbImage::from_pixel(5, 5, Rgb([10, 20, 30]));
        let mut markers = LabelMap::new(5, 5);

        watershed(&image, &mut markers);

        assert_eq!(row(&markers, 2), vec![-1, 0, 0, 0, -1]);
        assert_eq!(row(&markers, 0), vec![-1; 5]);
    }

    #[test]
    fn interior_boundary_markers_are_reset_before_flooding() {
        let image = RgbImage::from_pixel(5, 3, Rgb([0, 0, 0]));
        let mut markers = markers_from_rows(&[&[0; 5], &[0, 4, -1, 0, 0], &[0; 5]]);

        watershed(&image, &mut markers);

        assert_eq!(row(&markers, 1), vec![-1, 4, 4, 4, -1]);
    }

    #[test]
    fn tiny_images_are_all_boundary() {
        let image = RgbImage::from_pixel(2, 1, Rgb([0, 0, 0]));
        let mut markers = LabelMap::from_pixel(2, 1, Luma([5]));
        watershed(&image, &mut markers);
        assert_eq!(row(&markers, 0), vec![-1, -1]);
    }
}
