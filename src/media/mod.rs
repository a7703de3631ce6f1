//! Library entities and their owning store

pub mod movie;
pub mod music;
pub mod store;
pub mod tv_show;

pub use movie::{DiscType, Movie};
pub use music::{Album, Artist};
pub use store::MediaStore;
pub use tv_show::{Episode, TvShow};

use crate::scrapers::InfoFields;

/// Entities that accept scrape results field by field
pub trait Mergeable {
    /// Merge the present values of `other` for every requested field.
    /// Sets the `changed` flag and returns `true` if any value changed.
    fn merge_from(&mut self, other: &Self, requested: &InfoFields) -> bool;
}
