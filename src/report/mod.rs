//! Renderers for a resolved dependency tree.
//!
//! - [`fields`] — the field registry: what each column shows and how it is colored.
//! - [`tree`] — nested view, one line per node.
//! - [`flat`] — one line (or JSON object) per distinct `name@version`.
//! - [`summary`] — license totals as a table.
//!
//! Nothing here touches the filesystem or global color state; every choice
//! arrives through [`RenderOptions`].

pub mod fields;
pub mod flat;
pub mod summary;
pub mod tree;

use anyhow::Result;

use crate::models::PackageNode;
use fields::{Field, Style};

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Tree,
    Flat,
    Json,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub mode: Mode,
    pub fields: Vec<Field>,
    /// Placed between the fields of one line.
    pub separator: String,
    /// Only show packages with no usable license.
    pub missing_only: bool,
    pub style: Style,
}

/// Render `root` as the text written to stdout.
pub fn render(root: &PackageNode, options: &RenderOptions) -> Result<String> {
    match options.mode {
        Mode::Tree => Ok(tree::render(root, options)),
        Mode::Flat => Ok(flat::render_lines(root, options)),
        Mode::Json => flat::render_json(root, options),
    }
}

/// Expand `\t`, `\n` and `\0` typed literally on the command line.
pub fn unescape_separator(raw: &str) -> String {
    raw.replace("\\t", "\t")
        .replace("\\n", "\n")
        .replace("\\0", "\0")
}

/// The cells of one node joined by the separator.
fn describe(node: &PackageNode, options: &RenderOptions) -> String {
    options
        .fields
        .iter()
        .map(|field| field.value(node, &options.style))
        .collect::<Vec<_>>()
        .join(&options.separator)
}
