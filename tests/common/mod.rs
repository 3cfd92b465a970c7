#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from lesionprep for tests
pub use lesionprep::{
    Annotated, BoundingBox, BoxCodec, CanonicalResizer, Catalog, Error, FailurePolicy, FileOutcome,
    Orientation, Raster, RasterKind, ResizeJob,
};
