//! Per-package license resolution, driven by the dependency walk.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::analyzer::inspector::{self, Artifact, DeclaredLicense, Inspection};
use crate::analyzer::resolver::{self, Visited, Visitor};
use crate::analyzer::InspectError;
use crate::config::Overrides;
use crate::license::catalog::Catalog;
use crate::license::matcher;
use crate::models::{License, PackageNode};

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Also walk the root package's `devDependencies`.
    pub include_dev: bool,
}

/// Resolve the dependency tree under `root` and classify the license of every package.
///
/// Never fails: packages that cannot be inspected come back as `unknown`,
/// unmatched artifacts as `nomatch`, and uninstalled dependencies are left out.
pub fn resolve_licenses(
    root: &Path,
    catalog: &Catalog,
    overrides: &Overrides,
    options: ResolveOptions,
) -> PackageNode {
    let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let mut engine = Engine {
        catalog,
        overrides,
        options,
    };
    resolver::resolve(&root, &mut engine)
}

struct Engine<'a> {
    catalog: &'a Catalog,
    overrides: &'a Overrides,
    options: ResolveOptions,
}

impl Visitor for Engine<'_> {
    fn visit(&mut self, declared_name: Option<&str>, location: &Path) -> Visited {
        let inspection = match inspector::inspect(location) {
            Ok(inspection) => Some(inspection),
            Err(err @ InspectError::ManifestUnparsable { .. }) => {
                warn!(%err, "treating package as unknown");
                None
            }
            Err(err) => {
                debug!(%err, "treating package as unknown");
                None
            }
        };

        let name = declared_name
            .map(str::to_string)
            .or_else(|| inspection.as_ref().and_then(|i| i.manifest.name.clone()))
            .unwrap_or_else(|| dir_name(location));
        let version = inspection
            .as_ref()
            .map(|i| i.manifest.version.clone())
            .unwrap_or_default();

        let artifact = inspection.as_ref().and_then(|i| i.artifact.as_ref());
        let (license_file, license) = self.license_for(&name, &version, artifact);

        let mut dependencies = Vec::new();
        let mut manifest_fields = Default::default();
        if let Some(Inspection { manifest, .. }) = inspection {
            dependencies = manifest.dependencies;
            if declared_name.is_none() && self.options.include_dev {
                dependencies.extend(manifest.dev_dependencies);
            }
            manifest_fields = manifest.fields;
        }

        Visited {
            node: PackageNode {
                name,
                version,
                location: location.to_path_buf(),
                manifest_fields,
                license_file,
                license,
                deps: Vec::new(),
            },
            dependencies,
        }
    }
}

impl Engine<'_> {
    /// Override first, then artifact lookup and matching.
    fn license_for(
        &self,
        name: &str,
        version: &str,
        artifact: Option<&Artifact>,
    ) -> (Option<PathBuf>, License) {
        if let Some(label) = self.overrides.lookup(name, version) {
            debug!(package = %name, %label, "license overridden");
            return (None, License::Named(label.to_string()));
        }

        let Some(artifact) = artifact else {
            return (None, License::Unknown);
        };

        match classify_artifact(artifact, self.catalog) {
            Ok(license) => (Some(artifact.path().to_path_buf()), license),
            Err(err) => {
                warn!(%err, "treating package as unknown");
                (None, License::Unknown)
            }
        }
    }
}

fn classify_artifact(artifact: &Artifact, catalog: &Catalog) -> Result<License, InspectError> {
    let license = match artifact {
        Artifact::LicenseFile(path) => matcher::classify(&inspector::read_text(path)?, catalog),
        Artifact::Readme(path) => {
            let text = inspector::read_text(path)?;
            let section = inspector::license_section(&text).unwrap_or(text);
            matcher::classify(&section, catalog)
        }
        Artifact::ManifestField { declared, .. } => match declared {
            DeclaredLicense::Identifier(id) => matcher::classify(id, catalog),
            DeclaredLicense::Label(label) => License::Named(label.clone()),
        },
    };
    Ok(license)
}

fn dir_name(location: &Path) -> String {
    location
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| location.display().to_string())
}
