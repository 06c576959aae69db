//! On-disk package discovery.
//!
//! - [`inspector`] — reads a package's `package.json` and picks its license artifact.
//! - [`resolver`] — walks declared dependencies through `node_modules` directories
//!   and assembles the dependency tree.
//!
//! Every failure here is local to one package: callers log it and carry on.

use std::path::PathBuf;

use thiserror::Error;

pub mod inspector;
pub mod resolver;

/// Failures that affect a single package and never abort a traversal.
#[derive(Error, Debug)]
pub enum InspectError {
    #[error("no manifest at {0}")]
    ManifestMissing(PathBuf),

    #[error("cannot parse manifest {path}: {source}")]
    ManifestUnparsable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("dependency {name} of {from} is not installed")]
    DependencyUnresolved { name: String, from: PathBuf },

    #[error("cannot read license artifact {path}: {source}")]
    ArtifactUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
