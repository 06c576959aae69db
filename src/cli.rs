use std::path::PathBuf;

use clap::Parser;

use crate::report::fields::{Field, JSON_FIELDS, PRETTY_FIELDS, TSV_FIELDS};
use crate::report::Mode;

#[derive(Parser, Debug)]
#[command(
    name = "licensecheck",
    about = "Show the license of every package in an installed node_modules tree",
    version
)]
pub struct Cli {
    /// Package directory to check
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Only show packages without a recognized license
    #[arg(short, long)]
    pub missing_only: bool,

    /// Highlight licenses matching this regular expression
    #[arg(short = 'H', long, value_name = "REGEX")]
    pub highlight: Option<String>,

    /// One line per distinct name@version instead of a tree
    #[arg(short, long, conflicts_with_all = ["tsv", "json"])]
    pub flat: bool,

    /// Tab-separated flat output
    #[arg(long, conflicts_with = "json")]
    pub tsv: bool,

    /// JSON array output
    #[arg(long)]
    pub json: bool,

    /// Comma-separated fields to show [default depends on the output mode]
    #[arg(long, value_name = "LIST")]
    pub fields: Option<String>,

    /// Separator between fields; \t, \n and \0 are expanded
    #[arg(short = 'd', long, default_value = " ── ")]
    pub separator: String,

    /// License overrides file [default: ./licenses.json, fallback ~/.config/licensecheck/licenses.json]
    #[arg(long, value_name = "FILE")]
    pub overrides: Option<PathBuf>,

    /// Directory with an alternative license catalog (catalog.json and texts)
    #[arg(long, value_name = "DIR")]
    pub catalog: Option<PathBuf>,

    /// Include the root package's devDependencies
    #[arg(long)]
    pub dev: bool,

    /// Print a table of license totals to stderr
    #[arg(long)]
    pub summary: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.json {
            Mode::Json
        } else if self.flat || self.tsv {
            Mode::Flat
        } else {
            Mode::Tree
        }
    }

    /// Requested fields, or the defaults for the output mode.
    pub fn fields(&self) -> Vec<Field> {
        let default = if self.json {
            JSON_FIELDS
        } else if self.tsv {
            TSV_FIELDS
        } else {
            PRETTY_FIELDS
        };
        Field::parse_list(self.fields.as_deref().unwrap_or(default))
    }

    /// `--tsv` always separates by tab.
    pub fn raw_separator(&self) -> &str {
        if self.tsv {
            "\t"
        } else {
            &self.separator
        }
    }

    /// JSON and TSV are meant for other programs and are never colored.
    pub fn color(&self) -> bool {
        !self.no_color && !self.json && !self.tsv
    }
}
