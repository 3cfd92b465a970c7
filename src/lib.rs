pub mod catalog;
pub mod codec;
pub mod dataset;
pub mod detection;
pub mod error;
pub mod models;
pub mod resize;

pub use catalog::{Catalog, LESION_CATEGORIES};
pub use codec::BoxCodec;
pub use dataset::{ExtractJob, FailurePolicy, FileOutcome, JobReport, ResizeJob};
pub use detection::{MaskStack, extract_boxes};
pub use error::{Error, Result};
pub use models::{Annotated, BoundingBox, BoxList, Category, Raster, RasterKind};
pub use resize::{CANONICAL_SIZE, CanonicalResizer, CropWindow, Orientation, ResizePlan};
