use image::math::Rect;
use imageproc::point::Point;
use num_traits::{Num, ToPrimitive};

/// Calculates the axis-aligned bounding box of a set of pixel coordinates.
///
/// Extents are inclusive: a single point yields a `1 x 1` box, and a horizontal
/// run of `n` pixels yields an `n x 1` box. Negative coordinates are clamped to
/// zero. Returns `None` for an empty slice.
///
/// # Examples
///
/// ```
/// use imageproc::point::Point;
/// use karyotype_analyzer::rect::bounding_rect;
///
/// let points = [Point::new(4, 2), Point::new(6, 9), Point::new(5, 3)];
/// let rect = bounding_rect(&points).unwrap();
///
/// assert_eq!((rect.x, rect.y), (4, 2));
/// assert_eq!((rect.width, rect.height), (3, 8));
/// ```
pub fn bounding_rect<T>(points: &[Point<T>]) -> Option<Rect>
where
    T: Copy + PartialOrd + Num + ToPrimitive,
{
    let (first, rest) = points.split_first()?;
    let mut min_x = first.x;
    let mut max_x = first.x;
    let mut min_y = first.y;
    let mut max_y = first.y;

    // `T` is only `PartialOrd`, so there is no `min`/`max` to lean on.
    for p in rest {
        if p.x < min_x {
            min_x = p.x;
        }
        if p.x > max_x {
            max_x = p.x;
        }
        if p.y < min_y {
            min_y = p.y;
        }
        if p.y > max_y {
            max_y = p.y;
        }
    }

    let x = min_x.to_u32().unwrap_or(0);
    let y = min_y.to_u32().unwrap_or(0);
    let width = max_x.to_u32().unwrap_or(0).saturating_sub(x) + 1;
    let height = max_y.to_u32().unwrap_or(0).saturating_sub(y) + 1;

    Some(Rect {
        x,
        y,
        width,
        height,
    })
}

/// Height divided by width, or `None` for a zero-width box.
pub fn aspect_ratio(rect: &Rect) -> Option<f64> {
    if rect.width == 0 {
        return None;
    }
    Some(rect.height as f64 / rect.width as f64)
}
