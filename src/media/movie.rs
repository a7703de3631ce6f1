//! Movie records discovered on disk

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Disc structure a movie was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscType {
    Dvd,
    BluRay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub year: Option<u32>,
    /// All parts of the movie, sorted (e.g. `cd1`, `cd2`)
    pub files: Vec<PathBuf>,
    /// Configured root directory the movie was found under
    pub root: PathBuf,
    pub in_separate_folder: bool,
    pub disc_type: Option<DiscType>,
    pub changed: bool,
}

impl Movie {
    pub fn new(title: impl Into<String>, root: impl Into<PathBuf>, files: Vec<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            year: None,
            files,
            root: root.into(),
            in_separate_folder: false,
            disc_type: None,
            changed: false,
        }
    }
}
