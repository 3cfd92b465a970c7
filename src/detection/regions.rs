use std::collections::HashMap;

use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};

/// Adjacency used when growing foreground regions. Diagonal neighbours merge.
pub const CONNECTIVITY: Connectivity = Connectivity::Eight;

/// A connected foreground region with its inclusive pixel extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl Region {
    /// Extent as `(x_min, y_min, x_max, y_max)` with exclusive max.
    pub fn half_open_extent(&self) -> (i64, i64, i64, i64) {
        (
            self.min_x as i64,
            self.min_y as i64,
            self.max_x as i64 + 1,
            self.max_y as i64 + 1,
        )
    }
}

/// Label the nonzero pixels of `plane` and return one region per component,
/// in raster-scan order of each region's first pixel.
pub fn find_regions(plane: &GrayImage) -> Vec<Region> {
    let (width, height) = plane.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    // Any nonzero value is foreground; resampled masks carry soft edges.
    let binary = GrayImage::from_fn(width, height, |x, y| {
        if plane.get_pixel(x, y)[0] > 0 {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });

    let labeled = connected_components(&binary, CONNECTIVITY, Luma([0u8]));

    let mut index: HashMap<u32, usize> = HashMap::new();
    let mut regions: Vec<Region> = Vec::new();
    for (x, y, label) in labeled.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue; // background
        }

        match index.get(&label) {
            Some(&i) => {
                let r = &mut regions[i];
                r.min_x = r.min_x.min(x);
                r.min_y = r.min_y.min(y);
                r.max_x = r.max_x.max(x);
                r.max_y = r.max_y.max(y);
            }
            None => {
                index.insert(label, regions.len());
                regions.push(Region {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                });
            }
        }
    }

    regions
}
