pub mod regions;

use image::GrayImage;
use log::debug;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::models::{BoundingBox, BoxList, Category};

pub use regions::{CONNECTIVITY, Region, find_regions};

/// One binary mask plane per catalog category, all the same size.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskStack {
    planes: Vec<GrayImage>,
}

impl MaskStack {
    /// Build a stack whose plane `i` holds category `i` of `catalog`.
    pub fn new(planes: Vec<GrayImage>, catalog: &Catalog) -> Result<Self> {
        if planes.len() != catalog.len() {
            return Err(Error::MaskShape(format!(
                "expected {} planes, got {}",
                catalog.len(),
                planes.len()
            )));
        }

        if let Some(first) = planes.first() {
            let dims = first.dimensions();
            if let Some((i, plane)) = planes
                .iter()
                .enumerate()
                .find(|(_, p)| p.dimensions() != dims)
            {
                return Err(Error::MaskShape(format!(
                    "plane {} is {}x{}, plane 0 is {}x{}",
                    i,
                    plane.width(),
                    plane.height(),
                    dims.0,
                    dims.1
                )));
            }
        }

        Ok(Self { planes })
    }

    /// Build a stack from a flat `(category, row, column)` byte array.
    pub fn from_raw(catalog: &Catalog, width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let plane_len = width as usize * height as usize;
        let expected = plane_len * catalog.len();
        if data.len() != expected {
            return Err(Error::MaskShape(format!(
                "expected {} bytes for {}x{}x{}, got {}",
                expected,
                catalog.len(),
                height,
                width,
                data.len()
            )));
        }

        let planes = (0..catalog.len())
            .map(|i| {
                let start = i * plane_len;
                GrayImage::from_raw(width, height, data[start..start + plane_len].to_vec())
                    .ok_or_else(|| Error::MaskShape("plane buffer size mismatch".to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(planes, catalog)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.planes.first().map(|p| p.dimensions()).unwrap_or((0, 0))
    }

    pub fn planes(&self) -> &[GrayImage] {
        &self.planes
    }

    pub fn plane(&self, category: Category) -> Option<&GrayImage> {
        self.planes.get(category.index())
    }
}

/// Turn every connected region of every plane into a labelled box.
///
/// Boxes come out in category order, then in raster-scan order of each
/// region's first pixel. Several disjoint regions on one plane give several
/// boxes of the same category.
pub fn extract_boxes(masks: &MaskStack, catalog: &Catalog) -> Result<BoxList> {
    let mut boxes = Vec::new();

    for (index, plane) in masks.planes.iter().enumerate() {
        let label = catalog.category(index as i64)?;
        let regions = find_regions(plane);
        if !regions.is_empty() {
            debug!(
                "category {} ({}): {} regions",
                index,
                catalog.name_of(label)?,
                regions.len()
            );
        }

        boxes.extend(regions.iter().map(|region| {
            let (x_min, y_min, x_max, y_max) = region.half_open_extent();
            BoundingBox::new(label, x_min, y_min, x_max, y_max)
        }));
    }

    Ok(boxes)
}
