use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

/// Default override file name, looked up in the working directory.
pub const OVERRIDES_FILE: &str = "licenses.json";

/// Forced license labels keyed by `"name"` or `"name@version"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    labels: HashMap<String, String>,
}

impl Overrides {
    pub fn new(labels: HashMap<String, String>) -> Self {
        Overrides { labels }
    }

    /// The forced label for a package, trying `name@version` before bare `name`.
    pub fn lookup(&self, name: &str, version: &str) -> Option<&str> {
        self.labels
            .get(&format!("{}@{}", name, version))
            .or_else(|| self.labels.get(name))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Load the override table, searching in order:
///
/// 1. `explicit` — path passed via `--overrides`
/// 2. `<cwd>/licenses.json`
/// 3. `~/.config/licensecheck/licenses.json`
/// 4. An empty table
pub fn load_overrides(cwd: &Path, explicit: Option<&Path>) -> Result<Overrides> {
    if let Some(path) = explicit {
        return read_overrides(path);
    }

    let local = cwd.join(OVERRIDES_FILE);
    if local.exists() {
        return read_overrides(&local);
    }

    if let Some(home) = dirs::home_dir() {
        let home_file = home
            .join(".config")
            .join("licensecheck")
            .join(OVERRIDES_FILE);
        if home_file.exists() {
            return read_overrides(&home_file);
        }
    }

    Ok(Overrides::default())
}

fn read_overrides(path: &Path) -> Result<Overrides> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading overrides {}", path.display()))?;
    parse_overrides(&content).with_context(|| format!("parsing overrides {}", path.display()))
}

/// Parse a JSON object of string labels; `//` and `/* */` comments are allowed.
pub fn parse_overrides(content: &str) -> Result<Overrides> {
    let stripped = strip_json_comments(content);
    if stripped.trim().is_empty() {
        return Ok(Overrides::default());
    }
    let labels: HashMap<String, String> = serde_json::from_str(&stripped)?;
    Ok(Overrides::new(labels))
}

/// Remove `//` line comments and `/* */` block comments outside string literals.
///
/// Newlines inside comments are kept so parse errors still point at the right line.
pub fn strip_json_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    prev = skipped;
                }
            }
            _ => out.push(c),
        }
    }

    out
}
