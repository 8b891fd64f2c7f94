use std::collections::BTreeMap;

use image::{GrayImage, Luma, math::Rect};
use imageproc::{
    contours::{BorderType, Contour, find_contours},
    point::Point,
};
use num::{Num, NumCast};
use num_traits::AsPrimitive;

use crate::{
    config::CandidateFilter,
    rect::{aspect_ratio, bounding_rect},
    region_labelling::{LabelMap, UNKNOWN, WATERSHED_BOUNDARY},
};

/// An outer region boundary together with the measurements the filters use.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Id of the watershed region the contour was traced from.
    pub label: i32,
    pub contour: Contour<i32>,
    /// Area enclosed by the contour polygon.
    pub area: f64,
    /// Inclusive axis-aligned bounds; `None` for an empty contour.
    pub bounds: Option<Rect>,
}

impl Candidate {
    pub fn new(label: i32, contour: Contour<i32>) -> Self {
        let area = contour_area(&contour.points);
        let bounds = bounding_rect(&contour.points);
        Self {
            label,
            contour,
            area,
            bounds,
        }
    }

    /// Height over width of the bounds, `None` when the width is zero.
    pub fn aspect_ratio(&self) -> Option<f64> {
        self.bounds.as_ref().and_then(aspect_ratio)
    }
}

/// Calculates the area enclosed by a closed polygon with the shoelace formula.
///
/// The polygon is closed implicitly from the last point back to the first. The
/// result is non-negative regardless of orientation; polygons with fewer than
/// three points enclose nothing.
///
/// # Type Parameters
///
/// * `T`: coordinate type, converted to `f64` for the computation.
pub fn contour_area<T>(points: &[Point<T>]) -> f64
where
    T: Num + NumCast + Copy + PartialEq + Eq + AsPrimitive<f64>,
{
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p1, p2)| {
            let (x1, y1): (f64, f64) = (p1.x.as_(), p1.y.as_());
            let (x2, y2): (f64, f64) = (p2.x.as_(), p2.y.as_());
            x1 * y2 - x2 * y1
        })
        .sum();
    twice_area.abs() / 2.0
}

/// Traces the outer contour of every region in a label map.
///
/// Labels are visited in ascending order; [`UNKNOWN`] and
/// [`WATERSHED_BOUNDARY`] are skipped. For each label a binary mask is built
/// over the label's bounding box plus a one-pixel empty margin and only
/// top-level outer borders are kept, so
/// holes inside a region never become candidates. Contour points are in image
/// coordinates.
pub fn extract_candidates(labels: &LabelMap) -> Vec<Candidate> {
    let mut extents: BTreeMap<i32, (u32, u32, u32, u32)> = BTreeMap::new();
    for (x, y, pixel) in labels.enumerate_pixels() {
        let label = pixel.0[0];
        if label == UNKNOWN || label == WATERSHED_BOUNDARY {
            continue;
        }
        extents
            .entry(label)
            .and_modify(|(min_x, min_y, max_x, max_y)| {
                *min_x = (*min_x).min(x);
                *min_y = (*min_y).min(y);
                *max_x = (*max_x).max(x);
                *max_y = (*max_y).max(y);
            })
            .or_insert((x, y, x, y));
    }

    let mut candidates = Vec::new();
    for (label, (min_x, min_y, max_x, max_y)) in extents {
        // One pixel of zero margin so borders on the crop edge are traced.
        let mask = GrayImage::from_fn(max_x - min_x + 3, max_y - min_y + 3, |x, y| {
            let inside =
                (1..=max_x - min_x + 1).contains(&x) && (1..=max_y - min_y + 1).contains(&y);
            if inside && labels.get_pixel(x + min_x - 1, y + min_y - 1).0[0] == label {
                Luma([255])
            } else {
                Luma([0])
            }
        });

        let (dx, dy) = (min_x as i32 - 1, min_y as i32 - 1);
        candidates.extend(
            find_contours::<i32>(&mask)
                .into_iter()
                .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
                .map(|mut contour| {
                    for p in &mut contour.points {
                        p.x += dx;
                        p.y += dy;
                    }
                    Candidate::new(label, contour)
                }),
        );
    }
    candidates
}

/// Keeps candidates whose area lies strictly between `min_area` and `max_area`.
pub fn retain_by_area_in_place(candidates: &mut Vec<Candidate>, min_area: f64, max_area: f64) {
    candidates.retain(|c| min_area < c.area && c.area < max_area);
}

/// Keeps candidates whose bounds are taller than wide by more than `min_ratio`.
///
/// Candidates without a usable width fail the test.
pub fn retain_by_aspect_ratio_in_place(candidates: &mut Vec<Candidate>, min_ratio: f64) {
    candidates.retain(|c| c.aspect_ratio().is_some_and(|ratio| ratio > min_ratio));
}

impl CandidateFilter {
    /// Applies the area filter, then the shape filter.
    pub fn apply(&self, candidates: &mut Vec<Candidate>) {
        retain_by_area_in_place(candidates, self.min_area, self.max_area);
        retain_by_aspect_ratio_in_place(candidates, self.min_aspect_ratio);
    }
}
