use std::path::Path;

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use lesionprep::{BoundingBox, Catalog};

/// RGB image whose pixels encode their own coordinates, so crops can be
/// located exactly.
pub fn coordinate_image(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8]))
}

/// Grayscale image with a horizontal ramp.
pub fn ramp_mask(width: u32, height: u32) -> GrayImage {
    ImageBuffer::from_fn(width, height, |x, _| Luma([(x % 256) as u8]))
}

/// All-zero plane with one filled rectangle `[x0, x1) x [y0, y1)`.
pub fn block_plane(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

pub fn save_rgb(img: &RgbImage, path: &Path) {
    img.save_with_format(path, image::ImageFormat::Png)
        .expect("Failed to save test image");
}

pub fn save_gray(img: &GrayImage, path: &Path) {
    img.save_with_format(path, image::ImageFormat::Png)
        .expect("Failed to save test mask");
}

/// Box with a label looked up by name in the standard catalog.
pub fn make_box(name: &str, x_min: i64, y_min: i64, x_max: i64, y_max: i64) -> BoundingBox {
    let label = Catalog::default()
        .index_of(name)
        .expect("test box uses a known category");
    BoundingBox::new(label, x_min, y_min, x_max, y_max)
}
