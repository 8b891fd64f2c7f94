use image::{Rgb, RgbImage};
use imageproc::{contours::Contour, drawing::draw_line_segment_mut};

/// Draws each contour as a closed polyline `thickness` pixels wide.
///
/// Thick lines are drawn as parallel one-pixel segments offset around the
/// contour; segments falling outside the canvas are clipped.
pub fn draw_contours_mut<'a>(
    canvas: &mut RgbImage,
    contours: impl IntoIterator<Item = &'a Contour<i32>>,
    color: Rgb<u8>,
    thickness: u32,
) {
    let thickness = thickness.max(1) as i32;
    let low = -(thickness / 2);
    let high = low + thickness;

    for contour in contours {
        let points = &contour.points;
        for i in 0..points.len() {
            let p1 = points[i];
            let p2 = points[(i + 1) % points.len()];
            for oy in low..high {
                for ox in low..high {
                    draw_line_segment_mut(
                        canvas,
                        ((p1.x + ox) as f32, (p1.y + oy) as f32),
                        ((p2.x + ox) as f32, (p2.y + oy) as f32),
                        color,
                    );
                }
            }
        }
    }
}
