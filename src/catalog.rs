//! The catalog of recognised object-type names.
//!
//! Loaded once from two newline-delimited lists (interactable objects, then
//! receptacles) and never modified afterwards.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::CatalogConfig;

/// Recognised object-type names, interactable objects first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCatalog {
    names: Vec<String>,
}

impl ObjectCatalog {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Load the two lists named in `config`.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Self::load(&config.int_objects, &config.rec_objects)
    }

    /// Load and concatenate the interactable and receptacle lists.
    pub fn load(int_objects: impl AsRef<Path>, rec_objects: impl AsRef<Path>) -> Result<Self> {
        let mut names = read_name_list(int_objects.as_ref())?;
        names.extend(read_name_list(rec_objects.as_ref())?);
        tracing::info!(objects = names.len(), "Loaded object catalog");
        Ok(Self { names })
    }

    /// Whether `object_type` is a recognised name.
    pub fn contains(&self, object_type: &str) -> bool {
        self.names.iter().any(|n| n == object_type)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One name per line; surrounding whitespace and blank lines are dropped.
fn read_name_list(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read object list from {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn list_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_concatenates_both_lists_in_order() {
        let int_objects = list_file("Tomato\r\nApple\n\n  Mug  \n");
        let rec_objects = list_file("Microwave\nFridge\n");

        let catalog = ObjectCatalog::load(int_objects.path(), rec_objects.path()).unwrap();

        assert_eq!(
            catalog.names(),
            ["Tomato", "Apple", "Mug", "Microwave", "Fridge"]
        );
        assert!(catalog.contains("Microwave"));
        assert!(!catalog.contains("Bowl"));
    }

    #[test]
    fn missing_list_is_an_error() {
        let int_objects = list_file("Tomato\n");
        let err = ObjectCatalog::load(int_objects.path(), "/nonexistent/rec_objects.txt")
            .unwrap_err();
        assert!(err.to_string().contains("rec_objects.txt"));
    }
}
