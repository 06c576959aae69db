use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::InspectError;

/// File name of a package manifest.
pub const MANIFEST: &str = "package.json";

/// Name stems of dedicated license files, in precedence order.
const LICENSE_STEMS: &[&str] = &["license", "licence", "copying", "unlicense"];

/// Extensions that mark a `license*` file as source code rather than a license.
const CODE_EXTENSIONS: &[&str] = &["js", "cjs", "mjs", "ts", "json"];

/// The parts of `package.json` the tree walk and the classifier need.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub name: Option<String>,
    pub version: String,
    /// Every top-level key, in file order.
    pub fields: Map<String, Value>,
    /// `dependencies` keys in declaration order.
    pub dependencies: Vec<String>,
    /// `devDependencies` keys in declaration order.
    pub dev_dependencies: Vec<String>,
}

impl Manifest {
    /// Read `<location>/package.json`.
    pub fn read(location: &Path) -> Result<Self, InspectError> {
        let path = location.join(MANIFEST);
        let content = std::fs::read_to_string(&path)
            .map_err(|_| InspectError::ManifestMissing(path.clone()))?;
        Self::parse(&path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, InspectError> {
        let unparsable = |source: serde_json::Error| InspectError::ManifestUnparsable {
            path: path.to_path_buf(),
            source,
        };

        let json: Value = serde_json::from_str(content).map_err(unparsable)?;
        let fields = match json {
            Value::Object(map) => map,
            other => {
                return Err(unparsable(serde::de::Error::custom(format!(
                    "expected a JSON object, found {}",
                    kind_of(&other)
                ))))
            }
        };

        let name = fields
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let version = fields
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(Manifest {
            name,
            version,
            dependencies: dependency_names(&fields, "dependencies"),
            dev_dependencies: dependency_names(&fields, "devDependencies"),
            fields,
        })
    }

    /// The license declared by the manifest itself, if any.
    ///
    /// Handles `"license": "MIT"`, `"license": {"type", "url"}` and the
    /// legacy `"licenses": [{"type", "url"}, ...]` array.
    pub fn declared_license(&self) -> Option<DeclaredLicense> {
        match self.fields.get("license") {
            Some(Value::String(id)) if !id.trim().is_empty() => {
                return Some(DeclaredLicense::Identifier(id.trim().to_string()));
            }
            Some(Value::Object(obj)) => {
                if let Some(label) = typed_label(obj) {
                    return Some(DeclaredLicense::Label(label));
                }
            }
            _ => {}
        }

        let entries: Vec<&Value> = match self.fields.get("licenses")? {
            Value::Array(items) => items.iter().collect(),
            single => vec![single],
        };

        if let [Value::String(id)] = entries.as_slice() {
            if !id.trim().is_empty() {
                return Some(DeclaredLicense::Identifier(id.trim().to_string()));
            }
        }

        let labels: Vec<String> = entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::Object(obj) => typed_label(obj),
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .collect();

        if labels.is_empty() {
            None
        } else {
            Some(DeclaredLicense::Label(labels.join(", ")))
        }
    }
}

fn dependency_names(fields: &Map<String, Value>, section: &str) -> Vec<String> {
    fields
        .get(section)
        .and_then(|v| v.as_object())
        .map(|deps| deps.keys().cloned().collect())
        .unwrap_or_default()
}

/// `"MIT (http://...)"` from `{"type": "MIT", "url": "http://..."}`.
fn typed_label(obj: &Map<String, Value>) -> Option<String> {
    let kind = obj.get("type").and_then(|v| v.as_str())?.trim();
    if kind.is_empty() {
        return None;
    }
    match obj.get("url").and_then(|v| v.as_str()) {
        Some(url) if !url.trim().is_empty() => Some(format!("{} ({})", kind, url.trim())),
        _ => Some(kind.to_string()),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A license stated in the manifest rather than in a separate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredLicense {
    /// A bare string, normally an SPDX identifier; classified against the catalog.
    Identifier(String),
    /// A `type (url)` label from an object form; reported verbatim.
    Label(String),
}

/// The artifact chosen as the source of a package's license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    LicenseFile(PathBuf),
    ManifestField {
        path: PathBuf,
        declared: DeclaredLicense,
    },
    Readme(PathBuf),
}

impl Artifact {
    pub fn path(&self) -> &Path {
        match self {
            Artifact::LicenseFile(path) | Artifact::Readme(path) => path,
            Artifact::ManifestField { path, .. } => path,
        }
    }
}

/// Manifest data plus the chosen license artifact of one installed package.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub manifest: Manifest,
    pub artifact: Option<Artifact>,
}

/// Read the manifest at `location` and locate its license artifact.
pub fn inspect(location: &Path) -> Result<Inspection, InspectError> {
    let manifest = Manifest::read(location)?;
    let artifact = find_artifact(location, &manifest);
    Ok(Inspection { manifest, artifact })
}

/// Pick the license artifact of the package at `location`.
///
/// Precedence: a dedicated license file (`LICENSE`, `LICENCE`, `COPYING`,
/// `UNLICENSE`, with any extension or `-suffix`), then the manifest's own
/// license field, then a README. A README is therefore only used when it is
/// the sole artifact present.
pub fn find_artifact(location: &Path, manifest: &Manifest) -> Option<Artifact> {
    let files = list_files(location);

    let mut license_files: Vec<(usize, &String)> = files
        .iter()
        .filter_map(|name| license_rank(name).map(|rank| (rank, name)))
        .collect();
    license_files.sort();
    if let Some((_, name)) = license_files.first() {
        return Some(Artifact::LicenseFile(location.join(name)));
    }

    if let Some(declared) = manifest.declared_license() {
        return Some(Artifact::ManifestField {
            path: location.join(MANIFEST),
            declared,
        });
    }

    files
        .iter()
        .find(|name| name.to_lowercase().starts_with("readme"))
        .map(|name| Artifact::Readme(location.join(name)))
}

/// Regular files directly under `dir`, sorted by name.
fn list_files(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %dir.display(), %err, "cannot list package directory");
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}

fn license_rank(file_name: &str) -> Option<usize> {
    let lower = file_name.to_lowercase();

    if let Some((_, ext)) = lower.rsplit_once('.') {
        if CODE_EXTENSIONS.contains(&ext) {
            return None;
        }
    }

    LICENSE_STEMS.iter().position(|stem| match lower.strip_prefix(stem) {
        Some(rest) => rest.is_empty() || rest.starts_with(['.', '-', '_']),
        None => false,
    })
}

/// Read an artifact file, tolerating invalid UTF-8.
pub fn read_text(path: &Path) -> Result<String, InspectError> {
    std::fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|source| InspectError::ArtifactUnreadable {
            path: path.to_path_buf(),
            source,
        })
}

/// ATX heading: `## Title`, optionally closed by trailing `#`s.
static ATX_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(#{1,6})\s+(.*?)[\s#]*$").expect("valid ATX heading pattern"));
/// Setext underline: `===` for level 1, `---` for level 2.
static SETEXT_UNDERLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(=+|-{2,})\s*$").expect("valid setext underline pattern"));

/// Extract the body of a Markdown section whose heading mentions the license.
///
/// The section runs until the next heading of the same or a higher level.
/// Both ATX (`## License`) and setext (`License` over `-------`) headings count.
pub fn license_section(markdown: &str) -> Option<String> {
    let lines: Vec<&str> = markdown.lines().collect();

    let mut i = 0;
    while i < lines.len() {
        let Some((level, title, body_start)) = heading_at(&lines, i) else {
            i += 1;
            continue;
        };

        let lower = title.to_lowercase();
        if !(lower.contains("license") || lower.contains("licence")) {
            i = body_start;
            continue;
        }

        let mut end = body_start;
        while end < lines.len() {
            match heading_at(&lines, end) {
                Some((next_level, _, _)) if next_level <= level => break,
                _ => end += 1,
            }
        }

        let body = lines[body_start.min(lines.len())..end].join("\n");
        return Some(body.trim().to_string()).filter(|b| !b.is_empty());
    }

    None
}

/// `(level, title, index of the first body line)` if line `i` starts a heading.
fn heading_at<'a>(lines: &[&'a str], i: usize) -> Option<(usize, &'a str, usize)> {
    let line = lines[i];
    if let Some(caps) = ATX_HEADING.captures(line) {
        let title = caps.get(2).map_or("", |m| m.as_str());
        return Some((caps[1].len(), title, i + 1));
    }

    let next = lines.get(i + 1)?;
    let caps = SETEXT_UNDERLINE.captures(next)?;
    if line.trim().is_empty() {
        return None;
    }
    let level = if caps[1].starts_with('=') { 1 } else { 2 };
    Some((level, line.trim(), i + 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn manifest(json: &str) -> Manifest {
        Manifest::parse(Path::new("package.json"), json).unwrap()
    }

    #[test]
    fn test_parse_manifest() {
        let m = manifest(
            r#"{
  "name": "mocha",
  "version": "1.17.1",
  "homepage": "http://visionmedia.github.io/mocha",
  "dependencies": { "commander": "2.0.0", "growl": "1.7.x", "debug": "*" },
  "devDependencies": { "should": ">= 2.0.x" }
}"#,
        );
        assert_eq!(m.name.as_deref(), Some("mocha"));
        assert_eq!(m.version, "1.17.1");
        assert_eq!(m.dependencies, vec!["commander", "growl", "debug"]);
        assert_eq!(m.dev_dependencies, vec!["should"]);
        assert!(m.fields.contains_key("homepage"));
    }

    #[test]
    fn test_missing_and_unparsable_manifest() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Manifest::read(dir.path()),
            Err(InspectError::ManifestMissing(_))
        ));

        write(dir.path(), MANIFEST, "{ not json");
        assert!(matches!(
            Manifest::read(dir.path()),
            Err(InspectError::ManifestUnparsable { .. })
        ));

        write(dir.path(), MANIFEST, "[1, 2]");
        assert!(matches!(
            Manifest::read(dir.path()),
            Err(InspectError::ManifestUnparsable { .. })
        ));
    }

    #[test]
    fn test_declared_license_forms() {
        assert_eq!(
            manifest(r#"{"license": "MIT"}"#).declared_license(),
            Some(DeclaredLicense::Identifier("MIT".to_string()))
        );
        assert_eq!(
            manifest(r#"{"license": {"type": "BSD", "url": "http://github.com/kpdecker/jsdiff/blob/master/LICENSE"}}"#)
                .declared_license(),
            Some(DeclaredLicense::Label(
                "BSD (http://github.com/kpdecker/jsdiff/blob/master/LICENSE)".to_string()
            ))
        );
        assert_eq!(
            manifest(r#"{"licenses": [{"type": "MIT", "url": "http://www.opensource.org/licenses/mit-license.php"}]}"#)
                .declared_license(),
            Some(DeclaredLicense::Label(
                "MIT (http://www.opensource.org/licenses/mit-license.php)".to_string()
            ))
        );
        assert_eq!(
            manifest(r#"{"licenses": [{"type": "MIT"}, {"type": "GPL"}]}"#).declared_license(),
            Some(DeclaredLicense::Label("MIT, GPL".to_string()))
        );
        assert_eq!(
            manifest(r#"{"licenses": ["ISC"]}"#).declared_license(),
            Some(DeclaredLicense::Identifier("ISC".to_string()))
        );
        assert_eq!(manifest(r#"{"license": ""}"#).declared_license(), None);
        assert_eq!(manifest(r#"{"license": 42}"#).declared_license(), None);
        assert_eq!(manifest(r#"{"name": "x"}"#).declared_license(), None);
    }

    #[test]
    fn test_license_file_wins() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), MANIFEST, r#"{"name": "dashdash", "license": "MIT"}"#);
        write(dir.path(), "LICENSE.txt", "license text");
        write(dir.path(), "README.md", "# dashdash");

        let found = inspect(dir.path()).unwrap();
        assert_eq!(
            found.artifact,
            Some(Artifact::LicenseFile(dir.path().join("LICENSE.txt")))
        );
    }

    #[test]
    fn test_license_file_precedence_and_case() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "copying", "");
        write(dir.path(), "Licence.md", "");
        write(dir.path(), "license.js", "");
        let artifact = find_artifact(dir.path(), &Manifest::default()).unwrap();
        assert_eq!(artifact.path(), dir.path().join("Licence.md"));

        write(dir.path(), "LICENSE-MIT", "");
        let artifact = find_artifact(dir.path(), &Manifest::default()).unwrap();
        assert_eq!(artifact.path(), dir.path().join("LICENSE-MIT"));
    }

    #[test]
    fn test_license_directory_is_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("LICENSE")).unwrap();
        assert_eq!(find_artifact(dir.path(), &Manifest::default()), None);
    }

    #[test]
    fn test_manifest_field_before_readme() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), MANIFEST, r#"{"name": "chalk", "license": "MIT"}"#);
        write(dir.path(), "readme.md", "## License\n\nMIT © Sindre Sorhus");

        let found = inspect(dir.path()).unwrap();
        assert_eq!(
            found.artifact,
            Some(Artifact::ManifestField {
                path: dir.path().join(MANIFEST),
                declared: DeclaredLicense::Identifier("MIT".to_string()),
            })
        );
    }

    #[test]
    fn test_readme_when_only_artifact() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), MANIFEST, r#"{"name": "commander"}"#);
        write(dir.path(), "Readme.md", "# commander");

        let found = inspect(dir.path()).unwrap();
        assert_eq!(
            found.artifact,
            Some(Artifact::Readme(dir.path().join("Readme.md")))
        );
    }

    #[test]
    fn test_no_artifact() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), MANIFEST, r#"{"name": "mocha", "license": ["odd"]}"#);
        write(dir.path(), "index.js", "");
        assert_eq!(inspect(dir.path()).unwrap().artifact, None);
    }

    #[test]
    fn test_license_section_atx() {
        let readme = "# commander\n\nSome docs.\n\n## License\n\n(The MIT License)\n\nPermission is hereby granted.\n\n### Notes\n\nstill license\n\n## Links\n\nelsewhere\n";
        assert_eq!(
            license_section(readme).unwrap(),
            "(The MIT License)\n\nPermission is hereby granted.\n\n### Notes\n\nstill license"
        );
    }

    #[test]
    fn test_license_section_setext() {
        let readme = "growl\n=====\n\nUsage\n-----\n\nnotify()\n\nLicence\n-------\n\nMIT\n";
        assert_eq!(license_section(readme).unwrap(), "MIT");
    }

    #[test]
    fn test_license_section_absent() {
        assert_eq!(license_section("# tool\n\nNo legal words here.\n"), None);
        assert_eq!(license_section("## License\n"), None);
    }

    #[test]
    fn test_read_text_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_text(&dir.path().join("LICENSE")),
            Err(InspectError::ArtifactUnreadable { .. })
        ));
    }
}
