//! Directory-level jobs: list a source folder, push every file through the
//! resizer or the mask extractor, and write the results next to each other
//! under the same file names.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageReader};
use log::{debug, info, warn};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::Catalog;
use crate::codec::BoxCodec;
use crate::detection::{MaskStack, extract_boxes};
use crate::error::{Error, Result};
use crate::models::{Annotated, Raster, RasterKind};
use crate::resize::CanonicalResizer;

/// File extensions picked up when listing a directory.
pub const RASTER_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "tif", "tiff"];

pub const BOXES_EXTENSION: &str = "txt";

fn decode(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)
        .map_err(|e| Error::io(path, e))?
        .decode()
        .map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Decode `path` as an RGB frame or an 8-bit mask.
pub fn load_raster(path: &Path, kind: RasterKind) -> Result<Raster> {
    let img = decode(path)?;
    Ok(match kind {
        RasterKind::Color => Raster::Color(img.to_rgb8()),
        RasterKind::Mask => Raster::Mask(img.to_luma8()),
    })
}

/// Encode `raster` to `path`; the format follows the extension.
///
/// Colour buffers are RGB in memory and the encoder writes them in file
/// order, so the output keeps the colour order of the input file.
pub fn save_raster(raster: &Raster, path: &Path) -> Result<()> {
    let saved = match raster {
        Raster::Color(img) => img.save(path),
        Raster::Mask(img) => img.save(path),
    };
    saved.map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })
}

fn has_raster_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| RASTER_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Raster files directly inside `dir`, sorted by file name.
pub fn list_rasters(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.is_file() && has_raster_extension(&path) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Load every raster of `dir`, returning the images and their paths in the
/// same order.
pub fn load_set(dir: &Path, kind: RasterKind) -> Result<(Vec<Raster>, Vec<PathBuf>)> {
    load_paths(list_rasters(dir)?, kind)
}

/// Like [`load_set`], with the listing shuffled by `rng` before decoding.
pub fn load_shuffled_set<R: Rng + ?Sized>(
    dir: &Path,
    kind: RasterKind,
    rng: &mut R,
) -> Result<(Vec<Raster>, Vec<PathBuf>)> {
    let mut paths = list_rasters(dir)?;
    paths.shuffle(rng);
    load_paths(paths, kind)
}

fn load_paths(paths: Vec<PathBuf>, kind: RasterKind) -> Result<(Vec<Raster>, Vec<PathBuf>)> {
    let rasters = paths
        .iter()
        .map(|path| load_raster(path, kind))
        .collect::<Result<Vec<_>>>()?;
    Ok((rasters, paths))
}

/// Create a single directory level. Returns `false` if nothing was created,
/// including when `path` already exists.
pub fn create_dir(path: &Path) -> bool {
    fs::create_dir(path).is_ok()
}

/// Make sure `path` is a usable output directory.
pub fn ensure_output_dir(path: &Path) -> Result<()> {
    if create_dir(path) {
        debug!("created {}", path.display());
        Ok(())
    } else if path.is_dir() {
        Ok(())
    } else {
        Err(Error::DirectoryCreateFailure(path.to_path_buf()))
    }
}

/// Box file paired with `image_path`: same base name, `.txt`, in `boxes_dir`.
pub fn boxes_path_for(image_path: &Path, boxes_dir: &Path) -> PathBuf {
    let mut name = image_path.file_stem().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(BOXES_EXTENSION);
    boxes_dir.join(name)
}

/// What happens to the rest of a job when one file fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failing file and return its error.
    #[default]
    FailFast,
    /// Record the failure and carry on with the next file.
    CollectAll,
}

/// Result of processing one input.
#[derive(Debug)]
pub enum FileOutcome {
    Written {
        source: PathBuf,
        output: PathBuf,
        /// Number of boxes written alongside, if boxes were handled.
        boxes: Option<usize>,
        /// The resizer fell back to the top-left crop.
        fallback_crop: bool,
    },
    Failed {
        source: PathBuf,
        error: Error,
    },
}

impl FileOutcome {
    pub fn source(&self) -> &Path {
        match self {
            FileOutcome::Written { source, .. } | FileOutcome::Failed { source, .. } => source,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, FileOutcome::Written { .. })
    }
}

#[derive(Debug, Default)]
pub struct JobReport {
    pub outcomes: Vec<FileOutcome>,
}

impl JobReport {
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_written()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &Error)> {
        self.outcomes.iter().filter_map(|o| match o {
            FileOutcome::Failed { source, error } => Some((source.as_path(), error)),
            FileOutcome::Written { .. } => None,
        })
    }

    fn record(&mut self, policy: FailurePolicy, source: PathBuf, result: Result<FileOutcome>) -> Result<()> {
        match result {
            Ok(outcome) => {
                self.outcomes.push(outcome);
                Ok(())
            }
            Err(error) => match policy {
                FailurePolicy::FailFast => Err(error),
                FailurePolicy::CollectAll => {
                    warn!("{}: {}", source.display(), error);
                    self.outcomes.push(FileOutcome::Failed { source, error });
                    Ok(())
                }
            },
        }
    }
}

/// Source and destination folders for box files.
#[derive(Debug, Clone)]
pub struct BoxDirs {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Resize every raster of a folder (and optionally its box files) into
/// another folder.
#[derive(Debug, Clone)]
pub struct ResizeJob {
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
    pub kind: RasterKind,
    pub boxes: Option<BoxDirs>,
    pub resizer: CanonicalResizer,
    pub policy: FailurePolicy,
}

impl ResizeJob {
    pub fn new(source_dir: impl Into<PathBuf>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            destination_dir: destination_dir.into(),
            kind: RasterKind::Color,
            boxes: None,
            resizer: CanonicalResizer::new(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_kind(mut self, kind: RasterKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_boxes(mut self, source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        self.boxes = Some(BoxDirs {
            source: source.into(),
            destination: destination.into(),
        });
        self
    }

    pub fn with_resizer(mut self, resizer: CanonicalResizer) -> Self {
        self.resizer = resizer;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn run(&self, catalog: &Catalog) -> Result<JobReport> {
        ensure_output_dir(&self.destination_dir)?;
        if let Some(dirs) = &self.boxes {
            ensure_output_dir(&dirs.destination)?;
        }

        let codec = BoxCodec::new(catalog);
        let files = list_rasters(&self.source_dir)?;
        info!(
            "resizing {} files from {} to {}x{}",
            files.len(),
            self.source_dir.display(),
            self.resizer.size(),
            self.resizer.size()
        );

        let mut report = JobReport::default();
        for path in files {
            let result = self.process_file(&path, &codec);
            report.record(self.policy, path, result)?;
        }

        info!("{} written, {} failed", report.written(), report.failures().count());
        Ok(report)
    }

    fn process_file(&self, path: &Path, codec: &BoxCodec<'_>) -> Result<FileOutcome> {
        let name = path
            .file_name()
            .ok_or_else(|| Error::MissingFile(path.to_path_buf()))?;
        info!("{}", name.to_string_lossy());

        let boxes = self
            .boxes
            .as_ref()
            .map(|dirs| codec.decode_all(&boxes_path_for(path, &dirs.source)))
            .transpose()?;

        let mut annotated = Annotated::new(load_raster(path, self.kind)?);
        if let Some(boxes) = boxes {
            annotated = annotated.with_boxes(boxes);
        }

        let (resized, plan) = self.resizer.apply(&annotated)?;

        let output = self.destination_dir.join(name);
        save_raster(&resized.raster, &output)?;

        if let (Some(dirs), Some(boxes)) = (&self.boxes, &resized.boxes) {
            codec.encode_all(&boxes_path_for(path, &dirs.destination), boxes)?;
        }

        Ok(FileOutcome::Written {
            source: path.to_path_buf(),
            output,
            boxes: resized.boxes.as_ref().map(Vec::len),
            fallback_crop: plan.fallback,
        })
    }
}

/// Split a plane file stem `<image>_<category>` into its parts.
fn split_plane_stem<'c>(stem: &str, catalog: &'c Catalog) -> Option<(String, usize, &'c str)> {
    catalog.categories().find_map(|(category, name)| {
        stem.strip_suffix(name)
            .and_then(|rest| rest.strip_suffix('_'))
            .filter(|image| !image.is_empty())
            .map(|image| (image.to_string(), category.index(), name))
    })
}

/// Derive box files from per-category mask planes.
///
/// Plane files are named `<image>_<category>.<ext>`; one box file
/// `<image>.txt` is written per image. Categories with no plane on disk are
/// treated as empty.
#[derive(Debug, Clone)]
pub struct ExtractJob {
    pub mask_dir: PathBuf,
    pub destination_dir: PathBuf,
    pub policy: FailurePolicy,
}

impl ExtractJob {
    pub fn new(mask_dir: impl Into<PathBuf>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            mask_dir: mask_dir.into(),
            destination_dir: destination_dir.into(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn run(&self, catalog: &Catalog) -> Result<JobReport> {
        ensure_output_dir(&self.destination_dir)?;

        let mut groups: BTreeMap<String, Vec<Option<PathBuf>>> = BTreeMap::new();
        for path in list_rasters(&self.mask_dir)? {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            match split_plane_stem(stem, catalog) {
                Some((image, index, name)) => {
                    let planes = groups.entry(image).or_insert_with(|| vec![None; catalog.len()]);
                    if let Some(previous) = planes[index].replace(path.clone()) {
                        warn!(
                            "{} and {} both hold {} planes, using the latter",
                            previous.display(),
                            path.display(),
                            name
                        );
                    }
                }
                None => warn!("{}: no category suffix, skipped", path.display()),
            }
        }

        info!("extracting boxes for {} images from {}", groups.len(), self.mask_dir.display());

        let codec = BoxCodec::new(catalog);
        let mut report = JobReport::default();
        for (image, planes) in groups {
            let source = self.mask_dir.join(&image);
            let result = self.process_image(&image, &planes, catalog, &codec);
            report.record(self.policy, source, result)?;
        }

        info!("{} written, {} failed", report.written(), report.failures().count());
        Ok(report)
    }

    fn process_image(
        &self,
        image: &str,
        planes: &[Option<PathBuf>],
        catalog: &Catalog,
        codec: &BoxCodec<'_>,
    ) -> Result<FileOutcome> {
        info!("{}", image);

        let loaded = planes
            .iter()
            .map(|path| path.as_deref().map(|p| decode(p).map(|img| img.to_luma8())).transpose())
            .collect::<Result<Vec<Option<GrayImage>>>>()?;

        let (width, height) = loaded
            .iter()
            .flatten()
            .map(|p| p.dimensions())
            .next()
            .unwrap_or((0, 0));
        let planes = loaded
            .into_iter()
            .map(|p| p.unwrap_or_else(|| GrayImage::new(width, height)))
            .collect();

        let stack = MaskStack::new(planes, catalog)?;
        let boxes = extract_boxes(&stack, catalog)?;

        let output = self.destination_dir.join(format!("{image}.{BOXES_EXTENSION}"));
        codec.encode_all(&output, &boxes)?;

        Ok(FileOutcome::Written {
            source: self.mask_dir.join(image),
            output,
            boxes: Some(boxes.len()),
            fallback_crop: false,
        })
    }
}
