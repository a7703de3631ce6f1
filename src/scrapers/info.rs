//! Requested metadata fields and the field merge policy

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ScraperError;

/// A metadata attribute that scrape results may overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoField {
    Title,
    Name,
    Overview,
    FirstAired,
    Rating,
    Director,
    Writer,
    Thumbnail,
    Certification,
    Genres,
    Network,
    Runtime,
    Artist,
    Label,
    ReleaseDate,
    Biography,
}

/// Set of fields a caller wants populated
pub type InfoFields = HashSet<InfoField>;

impl InfoField {
    pub const ALL: [InfoField; 16] = [
        InfoField::Title,
        InfoField::Name,
        InfoField::Overview,
        InfoField::FirstAired,
        InfoField::Rating,
        InfoField::Director,
        InfoField::Writer,
        InfoField::Thumbnail,
        InfoField::Certification,
        InfoField::Genres,
        InfoField::Network,
        InfoField::Runtime,
        InfoField::Artist,
        InfoField::Label,
        InfoField::ReleaseDate,
        InfoField::Biography,
    ];

    /// Every field, for callers that want a full scrape
    pub fn all() -> InfoFields {
        Self::ALL.into_iter().collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Name => "name",
            Self::Overview => "overview",
            Self::FirstAired => "first_aired",
            Self::Rating => "rating",
            Self::Director => "director",
            Self::Writer => "writer",
            Self::Thumbnail => "thumbnail",
            Self::Certification => "certification",
            Self::Genres => "genres",
            Self::Network => "network",
            Self::Runtime => "runtime",
            Self::Artist => "artist",
            Self::Label => "label",
            Self::ReleaseDate => "release_date",
            Self::Biography => "biography",
        }
    }
}

impl fmt::Display for InfoField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InfoField {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == wanted)
            .ok_or_else(|| ScraperError::config(format!("Unknown info field: '{}'", s)))
    }
}

/// Decide whether newly parsed data may overwrite `field` on `entity`.
///
/// A field is loaded iff it was requested. The entity is accepted so that a
/// policy looking at existing content can be added without touching callers;
/// the current policy ignores it and the last successful source wins.
pub fn should_load<E: ?Sized>(field: InfoField, requested: &InfoFields, _entity: &E) -> bool {
    requested.contains(&field)
}

/// Assign `value` to `slot` if it is present and differs. Returns whether
/// the slot changed.
pub(crate) fn assign<T: PartialEq + Clone>(slot: &mut Option<T>, value: &Option<T>) -> bool {
    match value {
        Some(v) if slot.as_ref() != Some(v) => {
            *slot = Some(v.clone());
            true
        }
        _ => false,
    }
}

/// Fill an identifier slot only when it is still empty
pub(crate) fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) -> bool {
    if slot.is_none() && value.is_some() {
        *slot = value.clone();
        true
    } else {
        false
    }
}

/// Merge the listed fields of `$other` into `$target`, gated by
/// [`should_load`]. Evaluates to `true` if any field changed.
macro_rules! merge_fields {
    ($target:expr, $other:expr, $requested:expr, { $($field:ident => $member:ident),* $(,)? }) => {{
        let mut changed = false;
        $(
            if $crate::scrapers::should_load($crate::scrapers::InfoField::$field, $requested, &*$target) {
                changed |= $crate::scrapers::info::assign(&mut $target.$member, &$other.$member);
            }
        )*
        changed
    }};
}

pub(crate) use merge_fields;
