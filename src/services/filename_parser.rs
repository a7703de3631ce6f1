//! Movie file and folder name parsing
//!
//! Derives title and year from names like `The.Matrix.1999.1080p.BluRay.mkv`
//! and recognises multi-part stacking markers (`cd1`, `part2`, `disc1`).

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[(\[]?\b(19\d{2}|20\d{2})\b[)\]]?").unwrap());
static RELEASE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(2160p|1080p|720p|576p|480p|4k|uhd|bluray|blu-ray|bdrip|brrip|web-?dl|webrip|hdtv|dvdrip|dvd|remux|x264|x265|h264|h265|hevc|xvid|divx|proper|repack|extended|unrated)\b",
    )
    .unwrap()
});
static STACK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[ _.\-]+(?:cd|dvd|part|pt|disc|disk)[ _.\-]*([0-9]+|[a-d])$").unwrap()
});
static SAMPLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|[\W_])sample([\W_]|$)").unwrap());
static BRACKETS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Title and year derived from a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMovie {
    pub title: String,
    pub year: Option<u32>,
}

/// Parse a file stem or folder name into title and year
pub fn parse_movie_name(name: &str) -> ParsedMovie {
    let cleaned = BRACKETS_RE.replace_all(name, " ");
    let cleaned = cleaned.replace(['.', '_'], " ");

    let mut title_end = cleaned.len();
    let mut year = None;

    // The last year wins so titles like "2001 A Space Odyssey 1968" keep their number
    let last_year = YEAR_RE
        .captures_iter(&cleaned)
        .filter(|c| c.get(0).is_some_and(|m| m.start() > 0))
        .last();
    if let Some(caps) = last_year {
        if let (Some(whole), Some(y)) = (caps.get(0), caps.get(1)) {
            year = y.as_str().parse().ok();
            title_end = whole.start();
        }
    }

    if let Some(tag) = RELEASE_TAG_RE.find(&cleaned[..title_end]) {
        if tag.start() > 0 {
            title_end = tag.start();
        }
    }

    let title = SPACE_RE.replace_all(&cleaned[..title_end], " ");
    let title = title.trim().trim_end_matches(['-', '(', '[']).trim().to_string();

    ParsedMovie {
        title: if title.is_empty() { name.trim().to_string() } else { title },
        year,
    }
}

/// Split a stacking marker off a file stem.
///
/// Returns the stem without the marker and the part label, if any.
pub fn strip_stacking_marker(stem: &str) -> (String, Option<String>) {
    match STACK_RE.captures(stem) {
        Some(caps) => {
            let base = stem[..caps.get(0).map_or(stem.len(), |m| m.start())].to_string();
            if base.trim().is_empty() {
                (stem.to_string(), None)
            } else {
                (base, caps.get(1).map(|p| p.as_str().to_lowercase()))
            }
        }
        None => (stem.to_string(), None),
    }
}

/// Sample clips shipped with releases are not movies
pub fn is_sample(path: &Path) -> bool {
    let stem_is_sample = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| SAMPLE_RE.is_match(s));
    let parent_is_sample = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case("sample") || n.eq_ignore_ascii_case("samples"));
    stem_is_sample || parent_is_sample
}
