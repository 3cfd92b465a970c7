use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::models::Category;

/// Lesion categories in the order used by mask channels and box files.
pub const LESION_CATEGORIES: [&str; 5] = ["BE", "suspicious", "HGD", "cancer", "polyp"];

/// Ordered list of category names.
///
/// The position of a name is its label index everywhere: the mask plane it is
/// read from, the in-memory [`Category`], and the name written to box files.
/// Pass the same catalog to every component that resolves labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    names: Vec<String>,
}

impl Catalog {
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(Error::DuplicateCategory(name.clone()));
            }
        }

        Ok(Self { names })
    }

    /// Number of categories (and of mask planes per stack).
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Result<Category> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(Category)
            .ok_or_else(|| Error::UnknownCategory(name.to_string()))
    }

    pub fn name_of(&self, category: Category) -> Result<&str> {
        self.names
            .get(category.0)
            .map(String::as_str)
            .ok_or(Error::IndexOutOfRange {
                index: category.0 as i64,
                count: self.names.len(),
            })
    }

    /// Resolve a raw label index, e.g. one read from a padded annotation table.
    pub fn category(&self, index: i64) -> Result<Category> {
        if index >= 0 && (index as usize) < self.names.len() {
            Ok(Category(index as usize))
        } else {
            Err(Error::IndexOutOfRange {
                index,
                count: self.names.len(),
            })
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = (Category, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (Category(i), name.as_str()))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            names: LESION_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
