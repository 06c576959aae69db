use std::collections::HashSet;

use crate::license::catalog::{Catalog, CatalogEntry};
use crate::models::License;

/// Minimum similarity for a catalog entry to be accepted as the match.
///
/// High enough to keep different license families apart, low enough to absorb
/// an added title line, a substituted version number or a reflowed paragraph.
pub const ACCEPT_THRESHOLD: f64 = 0.90;

/// Word n-gram width used for shingling.
const SHINGLE_WIDTH: usize = 3;

/// The best-scoring catalog entry for a text.
#[derive(Debug, Clone)]
pub struct Match<'a> {
    pub entry: &'a CatalogEntry,
    pub score: f64,
}

/// Classify a license artifact's text against the catalog.
///
/// Short declarations such as `"MIT"` or `"Apache License 2.0"` are looked up
/// by identifier or name first, and a bare family name such as `"BSD"` by
/// identifier prefix; anything else goes through fuzzy scoring.
pub fn classify(text: &str, catalog: &Catalog) -> License {
    let trimmed = text.trim();
    if !trimmed.contains('\n') {
        let entry = catalog
            .lookup(trimmed)
            .or_else(|| catalog.lookup_family(trimmed));
        if let Some(entry) = entry {
            return License::Named(entry.display_name());
        }
    }

    match best_match(text, catalog) {
        Some(m) => License::Named(m.entry.display_name()),
        None => License::NoMatch,
    }
}

/// Score `text` against every entry that has a reference text and return the
/// highest scorer at or above [`ACCEPT_THRESHOLD`]. Earlier entries win ties.
pub fn best_match<'a>(text: &str, catalog: &'a Catalog) -> Option<Match<'a>> {
    let input = Fingerprint::new(text);
    let mut best: Option<Match<'a>> = None;

    for entry in catalog.entries() {
        let Some(reference) = &entry.fingerprint else {
            continue;
        };
        let score = input.similarity(reference);
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(Match { entry, score });
        }
    }

    best.filter(|m| m.score >= ACCEPT_THRESHOLD)
}

/// Normalize raw license text for comparison.
///
/// Copyright and "all rights reserved" lines are dropped, punctuation is
/// folded to spaces, everything is lowercased and runs of whitespace
/// collapse to a single space.
pub fn normalize(text: &str) -> String {
    let kept: String = text
        .lines()
        .filter(|line| !is_copyright_line(line))
        .flat_map(|line| line.chars().chain(std::iter::once('\n')))
        .flat_map(|c| {
            let c = if c.is_alphanumeric() { c } else { ' ' };
            c.to_lowercase()
        })
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A notice line such as `Copyright (c) 2014 Jane Doe`. Body text that merely
/// starts with the word ("copyright notice and this permission notice") is kept.
fn is_copyright_line(line: &str) -> bool {
    let stripped = line
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '#' | '*' | '/' | '-' | '>'))
        .to_lowercase();

    if let Some(rest) = stripped.strip_prefix("copyright") {
        let rest = rest.trim_start();
        return rest.starts_with("(c)")
            || rest.starts_with('©')
            || rest.starts_with("<year>")
            || rest.starts_with(|c: char| c.is_ascii_digit());
    }

    stripped.starts_with("(c)")
        || stripped.starts_with('©')
        || stripped.starts_with("all rights reserved")
}

/// Word-shingle set of a normalized text.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    shingles: HashSet<String>,
}

impl Fingerprint {
    pub fn new(text: &str) -> Self {
        let normalized = normalize(text);
        let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
        let width = SHINGLE_WIDTH.min(words.len());

        let shingles = if width == 0 {
            HashSet::new()
        } else {
            words.windows(width).map(|w| w.join(" ")).collect()
        };

        Fingerprint { shingles }
    }

    /// Sørensen–Dice coefficient of the two shingle sets, in `0.0..=1.0`.
    pub fn similarity(&self, other: &Fingerprint) -> f64 {
        let total = self.shingles.len() + other.shingles.len();
        if total == 0 {
            return 0.0;
        }
        let shared = self.shingles.intersection(&other.shingles).count();
        (2 * shared) as f64 / total as f64
    }
}
