use std::path::PathBuf;

use serde_json::{Map, Value};

/// One resolved package instance in the dependency tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageNode {
    /// Package identifier as declared by its dependent (the manifest name for the root).
    pub name: String,
    /// Version from the package's own manifest; empty when the manifest omits it.
    pub version: String,
    /// Installed root of the package.
    pub location: PathBuf,
    /// Top-level manifest keys, kept as raw JSON so callers can tell strings from the rest.
    pub manifest_fields: Map<String, Value>,
    /// The artifact the license classification was read from.
    pub license_file: Option<PathBuf>,
    pub license: License,
    /// Children in manifest declaration order.
    pub deps: Vec<PackageNode>,
}

impl PackageNode {
    /// `name@version`, the key used for overrides and flat listings.
    pub fn name_version(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    /// No artifact at all, or an artifact nothing in the catalog matched.
    /// Overridden nodes carry a label without an artifact and are never missing.
    pub fn is_missing(&self) -> bool {
        !matches!(self.license, License::Named(_))
    }
}

/// Resolved license classification of a single node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum License {
    /// A catalog display label, a declared manifest label, or an override value.
    Named(String),
    /// An artifact was found but its text matched no catalog entry.
    NoMatch,
    /// No artifact was found.
    Unknown,
}

impl std::fmt::Display for License {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            License::Named(label) => write!(f, "{}", label),
            License::NoMatch => write!(f, "nomatch"),
            License::Unknown => write!(f, "unknown"),
        }
    }
}
