use colored::{Color, Colorize};
use regex::Regex;
use serde_json::Value;

use crate::models::{License, PackageNode};

/// Default fields for the tree and `--flat` views.
pub const PRETTY_FIELDS: &str = "nameversion,license,simplelicensefile";
/// Default fields for `--tsv`.
pub const TSV_FIELDS: &str = "nameversion,license,licensefile";
/// Default fields for `--json`.
pub const JSON_FIELDS: &str = "name,version,license,licensefile,homepage,description,dependencies";

/// Rendered in place of a manifest field that is absent or not a string.
pub const UNKNOWN_FIELD: &str = "UNKNOWN";

/// A column the presentation layer can show for each package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Name,
    Version,
    NameVersion,
    License,
    LicenseFile,
    /// License file path with every `/node_modules/` shortened to ` ~ `.
    SimpleLicenseFile,
    /// Direct dependencies as comma-separated `name@version`.
    Dependencies,
    /// Any top-level `package.json` key.
    Manifest(String),
}

impl Field {
    pub fn parse(name: &str) -> Field {
        match name.trim() {
            "name" => Field::Name,
            "version" => Field::Version,
            "nameversion" => Field::NameVersion,
            "license" => Field::License,
            "licensefile" => Field::LicenseFile,
            "simplelicensefile" => Field::SimpleLicenseFile,
            "dependencies" => Field::Dependencies,
            other => Field::Manifest(other.to_string()),
        }
    }

    /// Parse a comma-separated field list, skipping empty entries.
    pub fn parse_list(list: &str) -> Vec<Field> {
        list.split(',')
            .filter(|f| !f.trim().is_empty())
            .map(Field::parse)
            .collect()
    }

    /// Object key used in JSON output. Both license-file variants share one key.
    pub fn key(&self) -> &str {
        match self {
            Field::Name => "name",
            Field::Version => "version",
            Field::NameVersion => "nameversion",
            Field::License => "license",
            Field::LicenseFile | Field::SimpleLicenseFile => "licensefile",
            Field::Dependencies => "dependencies",
            Field::Manifest(key) => key.as_str(),
        }
    }

    /// The cell for `node`, colored according to `style`.
    pub fn value(&self, node: &PackageNode, style: &Style) -> String {
        match self {
            Field::Name => node.name.clone(),
            Field::Version => node.version.clone(),
            Field::NameVersion => node.name_version(),
            Field::License => license_cell(node, style),
            Field::LicenseFile => license_file_cell(node, false, style),
            Field::SimpleLicenseFile => license_file_cell(node, true, style),
            Field::Dependencies => node
                .deps
                .iter()
                .map(PackageNode::name_version)
                .collect::<Vec<_>>()
                .join(","),
            Field::Manifest(key) => match node.manifest_fields.get(key) {
                Some(Value::String(s)) => s.clone(),
                _ => UNKNOWN_FIELD.to_string(),
            },
        }
    }
}

/// Coloring passed explicitly to every renderer.
#[derive(Debug, Clone, Default)]
pub struct Style {
    pub color: bool,
    /// Licenses matching this are shown in magenta instead of green.
    pub highlight: Option<Regex>,
}

impl Style {
    fn paint(&self, text: String, color: Color) -> String {
        if self.color {
            text.as_str().color(color).to_string()
        } else {
            text
        }
    }
}

fn license_cell(node: &PackageNode, style: &Style) -> String {
    match &node.license {
        License::Unknown => style.paint("unknown".to_string(), Color::Red),
        License::NoMatch => style.paint("unmatched".to_string(), Color::Yellow),
        License::Named(label) => {
            let highlighted = style.highlight.as_ref().is_some_and(|re| re.is_match(label));
            let color = if highlighted { Color::Magenta } else { Color::Green };
            style.paint(label.clone(), color)
        }
    }
}

fn license_file_cell(node: &PackageNode, simple: bool, style: &Style) -> String {
    let Some(path) = &node.license_file else {
        return match node.license {
            License::Named(_) => "overridden".to_string(),
            _ => style.paint("no license found".to_string(), Color::Red),
        };
    };

    let mut shown = path.display().to_string();
    if simple {
        shown = shown.replace("/node_modules/", " ~ ");
    }
    if node.license == License::NoMatch {
        style.paint(shown, Color::Yellow)
    } else {
        shown
    }
}
