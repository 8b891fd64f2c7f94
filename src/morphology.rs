use image::GrayImage;
use imageproc::{
    distance_transform::Norm,
    morphology::{close, open},
};

/// Removes specks smaller than the structuring element, then fills small gaps.
///
/// The structuring element is a square of side `2 * radius + 1`. Opening runs
/// before closing so that noise is discarded before it can be merged into blobs.
pub fn clean_mask(mask: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    let opened = open(mask, Norm::LInf, radius);
    close(&opened, Norm::LInf, radius)
}
