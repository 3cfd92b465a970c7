//! Aspect-aware resize to a canonical square.
//!
//! The long side is scaled so the short side lands on the canonical size,
//! then a square window is cut out of the result. For non-square input the
//! window starts a sixth of the long side in (it is not centred), and box
//! coordinates are only rescaled: the window offset is *not* subtracted from
//! them. Annotation sets already produced by this pipeline depend on that, so
//! remapped boxes are measured in the resized frame, not the cropped one.

pub mod area;

use image::{ImageBuffer, Pixel};
use log::debug;

use crate::error::{Error, Result};
use crate::models::{Annotated, BoundingBox, BoxList, Raster};

pub use area::resize_area;

/// Side length of the square every image is normalized to.
pub const CANONICAL_SIZE: u32 = 224;

/// The crop window starts at `resized_long_side / MARGIN_DIVISOR`.
pub const MARGIN_DIVISOR: u32 = 6;

/// Which side of the source image is longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Wide,
    Tall,
    Square,
}

/// A rectangle in resized-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Everything decided about one input size before touching pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub orientation: Orientation,
    /// Source `(width, height)`.
    pub source: (u32, u32),
    /// Size after the resize step, before cropping.
    pub target: (u32, u32),
    pub margin: u32,
    pub crop: CropWindow,
    /// The offset window did not fit and the top-left square was taken instead.
    pub fallback: bool,
}

impl ResizePlan {
    /// Rescale a box by the resize factors. The crop offset is not applied.
    pub fn remap_box(&self, bbox: &BoundingBox) -> BoundingBox {
        let (w, h) = self.source;
        let (tw, th) = self.target;
        let sx = tw as f64 / w as f64;
        let sy = th as f64 / h as f64;

        let scale = |v: i64, s: f64| (v as f64 * s) as i64;
        BoundingBox::new(
            bbox.label,
            scale(bbox.x_min, sx),
            scale(bbox.y_min, sy),
            scale(bbox.x_max, sx),
            scale(bbox.y_max, sy),
        )
    }
}

/// Maps arbitrary images, and the boxes drawn on them, to a fixed square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalResizer {
    size: u32,
}

impl CanonicalResizer {
    pub fn new() -> Self {
        Self {
            size: CANONICAL_SIZE,
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size.max(1);
        self
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn plan(&self, width: u32, height: u32) -> Result<ResizePlan> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage { width, height });
        }

        let s = self.size;
        let a1 = width as f64 / height as f64;
        let a2 = height as f64 / width as f64;

        let (orientation, target) = if a1 > a2 {
            (Orientation::Wide, (round_half_even(s as f64 * a1), s))
        } else if a1 < a2 {
            (Orientation::Tall, (s, round_half_even(s as f64 * a2)))
        } else {
            (Orientation::Square, (s, s))
        };

        let (margin, x, y) = match orientation {
            Orientation::Wide => {
                let m = target.0 / MARGIN_DIVISOR;
                (m, m, 0)
            }
            Orientation::Tall => {
                let m = target.1 / MARGIN_DIVISOR;
                (m, 0, m)
            }
            Orientation::Square => (0, 0, 0),
        };

        // Clip to the resized image the way a slice would.
        let window = CropWindow {
            x,
            y,
            width: s.min(target.0.saturating_sub(x)),
            height: s.min(target.1.saturating_sub(y)),
        };

        let fallback = window.width != s || window.height != s;
        let crop = if fallback {
            CropWindow {
                x: 0,
                y: 0,
                width: s,
                height: s,
            }
        } else {
            window
        };

        Ok(ResizePlan {
            orientation,
            source: (width, height),
            target,
            margin,
            crop,
            fallback,
        })
    }

    /// Resize and crop one image buffer.
    pub fn resize<P>(&self, img: &ImageBuffer<P, Vec<u8>>) -> Result<(ImageBuffer<P, Vec<u8>>, ResizePlan)>
    where
        P: Pixel<Subpixel = u8> + 'static,
    {
        let plan = self.plan(img.width(), img.height())?;
        let (tw, th) = plan.target;

        if plan.fallback {
            debug!(
                "{}x{} -> {}x{}: offset window {} does not fit, using top-left crop",
                plan.source.0, plan.source.1, tw, th, plan.margin
            );
        }

        let resized = resize_area(img, tw, th);
        let c = plan.crop;
        let cropped = image::imageops::crop_imm(&resized, c.x, c.y, c.width, c.height).to_image();
        Ok((cropped, plan))
    }

    pub fn resize_raster(&self, raster: &Raster) -> Result<(Raster, ResizePlan)> {
        match raster {
            Raster::Color(img) => {
                let (out, plan) = self.resize(img)?;
                Ok((Raster::Color(out), plan))
            }
            Raster::Mask(img) => {
                let (out, plan) = self.resize(img)?;
                Ok((Raster::Mask(out), plan))
            }
        }
    }

    pub fn remap_boxes(&self, plan: &ResizePlan, boxes: &[BoundingBox]) -> BoxList {
        boxes.iter().map(|b| plan.remap_box(b)).collect()
    }

    /// Resize a raster and carry its boxes along.
    pub fn apply(&self, annotated: &Annotated) -> Result<(Annotated, ResizePlan)> {
        let (raster, plan) = self.resize_raster(&annotated.raster)?;
        debug!(
            "{:?} {}x{} -> {}x{}, crop at ({}, {})",
            plan.orientation, plan.source.0, plan.source.1, plan.target.0, plan.target.1, plan.crop.x, plan.crop.y
        );

        let boxes = annotated
            .boxes
            .as_ref()
            .map(|boxes| self.remap_boxes(&plan, boxes));
        Ok((Annotated { raster, boxes }, plan))
    }
}

impl Default for CanonicalResizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Round to the nearest integer, ties to even.
fn round_half_even(v: f64) -> u32 {
    v.round_ties_even() as u32
}
