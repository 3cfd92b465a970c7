//! Box text files.
//!
//! One record per line: `x_min y_min x_max y_max category_name`, fields
//! separated by a single space. No header, no quoting.

use std::fs;
use std::path::Path;

use log::debug;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::models::{BoundingBox, BoxList};

/// Label value marking the first unused row of a padded annotation table.
pub const PADDING_LABEL: i64 = -1;

/// Reads and writes box records against a catalog.
#[derive(Debug, Clone, Copy)]
pub struct BoxCodec<'a> {
    catalog: &'a Catalog,
}

impl<'a> BoxCodec<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Parse one record. A trailing line terminator is ignored.
    pub fn decode(&self, line: &str) -> Result<BoundingBox> {
        let record = line.trim_end_matches(['\r', '\n']);

        let tokens: Vec<&str> = record.split(' ').collect();
        if tokens.len() != 5 {
            return Err(Error::malformed(
                record,
                format!("expected 5 fields, found {}", tokens.len()),
            ));
        }

        let mut coords = [0i64; 4];
        for (slot, token) in coords.iter_mut().zip(&tokens[..4]) {
            *slot = token
                .parse()
                .map_err(|e| Error::malformed(record, format!("bad coordinate {token:?}: {e}")))?;
        }

        let label = self.catalog.index_of(tokens[4])?;
        let [x_min, y_min, x_max, y_max] = coords;
        Ok(BoundingBox::new(label, x_min, y_min, x_max, y_max))
    }

    /// Read every non-empty line of `path`. The first bad record fails the
    /// whole file.
    pub fn decode_all(&self, path: &Path) -> Result<BoxList> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        let boxes = text
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| self.decode(line))
            .collect::<Result<BoxList>>()?;

        debug!("read {} boxes from {}", boxes.len(), path.display());
        Ok(boxes)
    }

    /// Format one record, newline included.
    pub fn encode(&self, bbox: &BoundingBox) -> Result<String> {
        let name = self.catalog.name_of(bbox.label)?;
        Ok(format!(
            "{} {} {} {} {}\n",
            bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max, name
        ))
    }

    /// Write `boxes` to `path` in list order, replacing any existing file.
    pub fn encode_all(&self, path: &Path, boxes: &[BoundingBox]) -> Result<()> {
        let mut text = String::new();
        for bbox in boxes {
            text.push_str(&self.encode(bbox)?);
        }
        fs::write(path, text).map_err(|e| Error::io(path, e))?;

        debug!("wrote {} boxes to {}", boxes.len(), path.display());
        Ok(())
    }

    /// Convert a padded `[label, x_min, y_min, x_max, y_max]` table into a
    /// box list. Reading stops at the first row labelled [`PADDING_LABEL`].
    pub fn from_padded_rows(&self, rows: &[[i64; 5]]) -> Result<BoxList> {
        rows.iter()
            .take_while(|row| row[0] != PADDING_LABEL)
            .map(|&[label, x_min, y_min, x_max, y_max]| {
                let label = self.catalog.category(label)?;
                Ok(BoundingBox::new(label, x_min, y_min, x_max, y_max))
            })
            .collect()
    }
}
