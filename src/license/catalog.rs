use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::license::matcher::Fingerprint;

const BUILTIN_INDEX: &str = include_str!("../../licenses/catalog.json");

const BUILTIN_TEXTS: &[(&str, &str)] = &[
    ("MIT.txt", include_str!("../../licenses/MIT.txt")),
    ("MIT-0.txt", include_str!("../../licenses/MIT-0.txt")),
    ("ISC.txt", include_str!("../../licenses/ISC.txt")),
    ("0BSD.txt", include_str!("../../licenses/0BSD.txt")),
    ("BSD-2-Clause.txt", include_str!("../../licenses/BSD-2-Clause.txt")),
    ("BSD-3-Clause.txt", include_str!("../../licenses/BSD-3-Clause.txt")),
    ("Apache-2.0.txt", include_str!("../../licenses/Apache-2.0.txt")),
    ("Zlib.txt", include_str!("../../licenses/Zlib.txt")),
    ("Unlicense.txt", include_str!("../../licenses/Unlicense.txt")),
    ("WTFPL.txt", include_str!("../../licenses/WTFPL.txt")),
    ("BSL-1.0.txt", include_str!("../../licenses/BSL-1.0.txt")),
];

/// One row of `catalog.json`.
#[derive(Debug, Deserialize)]
struct IndexEntry {
    id: String,
    name: String,
    url: String,
    /// File holding the reference text, relative to the catalog.
    #[serde(default)]
    text: Option<String>,
}

/// A known license: SPDX identifier, canonical name, and optionally its reference text.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub url: String,
    pub reference_text: Option<String>,
    pub(crate) fingerprint: Option<Fingerprint>,
}

impl CatalogEntry {
    /// Label shown for packages classified as this entry, e.g.
    /// `MIT License (https://spdx.org/licenses/MIT)`.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.url)
    }
}

/// Immutable table of reference licenses, in declaration order.
///
/// Declaration order matters: the matcher breaks score ties in favour of
/// the earlier entry.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_index(BUILTIN_INDEX, |file| {
            BUILTIN_TEXTS
                .iter()
                .find(|(name, _)| *name == file)
                .map(|(_, text)| text.to_string())
                .ok_or_else(|| anyhow!("built-in catalog has no reference text {}", file))
        })
    }

    /// Load a catalog from `<dir>/catalog.json` plus the text files it names.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let index_path = dir.join("catalog.json");
        let index = std::fs::read_to_string(&index_path)
            .with_context(|| format!("reading license catalog {}", index_path.display()))?;

        Self::from_index(&index, |file| {
            let path = dir.join(file);
            std::fs::read_to_string(&path)
                .with_context(|| format!("reading reference text {}", path.display()))
        })
    }

    pub(crate) fn from_index(index: &str, mut load_text: impl FnMut(&str) -> Result<String>) -> Result<Self> {
        let rows: Vec<IndexEntry> =
            serde_json::from_str(index).context("parsing license catalog index")?;
        if rows.is_empty() {
            bail!("license catalog is empty");
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(rows.len());

        for row in rows {
            if !seen.insert(row.id.to_lowercase()) {
                bail!("license catalog lists {} twice", row.id);
            }

            let reference_text = match &row.text {
                Some(file) => Some(load_text(file)?),
                None => None,
            };
            let fingerprint = reference_text.as_deref().map(Fingerprint::new);

            entries.push(CatalogEntry {
                id: row.id,
                name: row.name,
                url: row.url,
                reference_text,
                fingerprint,
            });
        }

        Ok(Catalog { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Find an entry by SPDX identifier or canonical name, ignoring case.
    pub fn lookup(&self, label: &str) -> Option<&CatalogEntry> {
        let label = label.trim();
        self.entries
            .iter()
            .find(|e| e.id.eq_ignore_ascii_case(label))
            .or_else(|| self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(label)))
    }

    /// First entry whose identifier extends a bare family name, e.g. `BSD`
    /// finds `BSD-2-Clause` and `Apache` finds `Apache-2.0`.
    pub fn lookup_family(&self, family: &str) -> Option<&CatalogEntry> {
        let family = family.trim();
        if family.is_empty() || family.contains(char::is_whitespace) {
            return None;
        }
        let prefix = format!("{}-", family.to_lowercase());
        self.entries
            .iter()
            .find(|e| e.id.to_lowercase().starts_with(&prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.entries().len() > 20);
        assert_eq!(catalog.entries()[0].id, "MIT");
    }

    #[test]
    fn test_builtin_texts_are_fingerprinted() {
        let catalog = Catalog::builtin().unwrap();
        let with_text: Vec<_> = catalog
            .entries()
            .iter()
            .filter(|e| e.reference_text.is_some())
            .collect();
        assert_eq!(with_text.len(), BUILTIN_TEXTS.len());
        assert!(with_text.iter().all(|e| e.fingerprint.is_some()));
    }

    #[test]
    fn test_display_name() {
        let catalog = Catalog::builtin().unwrap();
        let mit = catalog.lookup("MIT").unwrap();
        assert_eq!(mit.display_name(), "MIT License (https://spdx.org/licenses/MIT)");
    }

    #[test]
    fn test_lookup_ignores_case() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.lookup("apache-2.0").unwrap().id, "Apache-2.0");
        assert_eq!(catalog.lookup(" isc ").unwrap().id, "ISC");
        assert_eq!(catalog.lookup("the unlicense").unwrap().id, "Unlicense");
        assert!(catalog.lookup("CUSTOM-LICENSE-42").is_none());
    }

    #[test]
    fn test_lookup_family() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.lookup_family("BSD").unwrap().id, "BSD-2-Clause");
        assert_eq!(catalog.lookup_family("apache").unwrap().id, "Apache-2.0");
        assert_eq!(catalog.lookup_family("GPL").unwrap().id, "GPL-2.0");
        assert!(catalog.lookup_family("MPL-3").is_none());
        assert!(catalog.lookup_family("Custom License").is_none());
        assert!(catalog.lookup_family("").is_none());
    }

    #[test]
    fn test_from_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("catalog.json"),
            r#"[
  { "id": "Foo-1.0", "name": "Foo License", "url": "https://example.com/foo", "text": "foo.txt" },
  { "id": "Bar", "name": "Bar License", "url": "https://example.com/bar" }
]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("foo.txt"), "You may do anything with foo.").unwrap();

        let catalog = Catalog::from_dir(dir.path()).unwrap();
        assert_eq!(catalog.entries().len(), 2);
        assert_eq!(
            catalog.entries()[0].reference_text.as_deref(),
            Some("You may do anything with foo.")
        );
        assert!(catalog.entries()[1].reference_text.is_none());
    }

    #[test]
    fn test_from_dir_missing_text_is_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("catalog.json"),
            r#"[{ "id": "Foo", "name": "Foo", "url": "u", "text": "absent.txt" }]"#,
        )
        .unwrap();
        assert!(Catalog::from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_missing_index_is_fatal() {
        let dir = TempDir::new().unwrap();
        assert!(Catalog::from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_duplicate_and_empty_rejected() {
        let dup = r#"[
  { "id": "MIT", "name": "a", "url": "u" },
  { "id": "mit", "name": "b", "url": "u" }
]"#;
        assert!(Catalog::from_index(dup, |_| Ok(String::new())).is_err());
        assert!(Catalog::from_index("[]", |_| Ok(String::new())).is_err());
    }
}
