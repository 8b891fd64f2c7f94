use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;

/// Binarizes with an automatically selected Otsu level, inverted so that dark
/// objects on a light background become foreground.
///
/// Pixels at or below the level become 255, all others 0. Returns the mask
/// together with the level that was used.
pub fn otsu_inverted(image: &GrayImage) -> (GrayImage, u8) {
    let level = otsu_level(image);

    let mut mask = image.clone();
    for pixel in mask.pixels_mut() {
        *pixel = if pixel.0[0] <= level {
            Luma([255])
        } else {
            Luma([0])
        };
    }

    (mask, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_pixels_become_foreground() {
        let image = GrayImage::from_fn(20, 10, |x, _| if x < 5 { Luma([30]) } else { Luma([220]) });
        let (mask, level) = otsu_inverted(&image);

        assert!((30..220).contains(&level), "level {level} should separate the classes");
        for (x, _, pixel) in mask.enumerate_pixels() {
            let expected = if x < 5 { 255 } else { 0 };
            assert_eq!(pixel.0[0], expected);
        }
    }

    #[test]
    fn mask_is_strictly_binary() {
        let image = GrayImage::from_fn(16, 16, |x, y| Luma([((x * 16 + y) % 256) as u8]));
        let (mask, _) = otsu_inverted(&image);
        assert!(mask.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }
}
