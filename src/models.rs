use std::fmt;

use image::{GrayImage, RgbImage};

/// Index of a lesion category inside a [`Catalog`](crate::Catalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Category(pub(crate) usize);

impl Category {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axis-aligned box in pixel coordinates of the image it was measured on.
///
/// A box carries no reference to that image; keep the pairing with
/// [`Annotated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub label: Category,
    pub x_min: i64,
    pub y_min: i64,
    pub x_max: i64,
    pub y_max: i64,
}

impl BoundingBox {
    pub fn new(label: Category, x_min: i64, y_min: i64, x_max: i64, y_max: i64) -> Self {
        Self {
            label,
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> i64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> i64 {
        self.y_max - self.y_min
    }
}

pub type BoxList = Vec<BoundingBox>;

/// How a file on disk should be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterKind {
    /// Three-channel RGB frame.
    Color,
    /// Single-channel 8-bit mask.
    Mask,
}

/// A decoded frame or mask.
#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    Color(RgbImage),
    Mask(GrayImage),
}

impl Raster {
    pub fn kind(&self) -> RasterKind {
        match self {
            Raster::Color(_) => RasterKind::Color,
            Raster::Mask(_) => RasterKind::Mask,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Raster::Color(img) => img.dimensions(),
            Raster::Mask(img) => img.dimensions(),
        }
    }

    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.dimensions().1
    }
}

/// A raster together with the boxes measured against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotated {
    pub raster: Raster,
    pub boxes: Option<BoxList>,
}

impl Annotated {
    pub fn new(raster: Raster) -> Self {
        Self {
            raster,
            boxes: None,
        }
    }

    pub fn with_boxes(mut self, boxes: BoxList) -> Self {
        self.boxes = Some(boxes);
        self
    }
}
