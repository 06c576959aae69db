use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::{Map, Value};

use super::{describe, RenderOptions};
use crate::models::PackageNode;

/// Every distinct `name@version` in the tree, sorted by that key.
///
/// The first occurrence in pre-order wins. With `missing_only`, packages
/// that have a license are left out.
pub fn collect<'a>(root: &'a PackageNode, missing_only: bool) -> BTreeMap<String, &'a PackageNode> {
    let mut seen = BTreeMap::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if !missing_only || node.is_missing() {
            seen.entry(node.name_version()).or_insert(node);
        }
        stack.extend(node.deps.iter().rev());
    }
    seen
}

/// One line per package, fields joined by the separator.
pub fn render_lines(root: &PackageNode, options: &RenderOptions) -> String {
    collect(root, options.missing_only)
        .values()
        .map(|node| describe(node, options))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A pretty-printed JSON array with one object per package.
pub fn render_json(root: &PackageNode, options: &RenderOptions) -> Result<String> {
    let rows: Vec<Value> = collect(root, options.missing_only)
        .values()
        .map(|node| {
            let mut row = Map::new();
            for field in &options.fields {
                row.insert(
                    field.key().to_string(),
                    Value::String(field.value(node, &options.style)),
                );
            }
            Value::Object(row)
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::License;
    use crate::report::fields::{Field, Style};
    use crate::report::testing::{mit, node};
    use crate::report::Mode;

    fn sample() -> PackageNode {
        let mut older = node("shared", "1.0.0", mit(), vec![]);
        older.license_file = Some("/first/LICENSE".into());
        let mut repeat = node("shared", "1.0.0", License::NoMatch, vec![]);
        repeat.license_file = Some("/second/LICENSE".into());
        node(
            "app",
            "1.0.0",
            mit(),
            vec![
                node("zed", "0.1.0", License::Unknown, vec![older]),
                node("alpha", "2.0.0", mit(), vec![repeat]),
            ],
        )
    }

    fn options(mode: Mode, fields: &str, missing_only: bool) -> RenderOptions {
        RenderOptions {
            mode,
            fields: Field::parse_list(fields),
            separator: "\t".to_string(),
            missing_only,
            style: Style::default(),
        }
    }

    #[test]
    fn test_sorted_and_first_occurrence_wins() {
        let out = render_lines(&sample(), &options(Mode::Flat, "nameversion,licensefile", false));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "alpha@2.0.0\t/app/node_modules/alpha/LICENSE",
                "app@1.0.0\t/app/node_modules/app/LICENSE",
                "shared@1.0.0\t/first/LICENSE",
                "zed@0.1.0\tno license found",
            ]
        );
    }

    #[test]
    fn test_missing_only() {
        let out = render_lines(&sample(), &options(Mode::Flat, "nameversion,license", true));
        // the first shared@1.0.0 is licensed; the later unmatched copy is the one kept
        assert_eq!(out, "shared@1.0.0\tunmatched\nzed@0.1.0\tunknown");
    }

    #[test]
    fn test_json_rows() {
        let out = render_json(&sample(), &options(Mode::Json, "name,version,license,homepage", false)).unwrap();
        let rows: Vec<Value> = serde_json::from_str(&out).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0]["name"], "alpha");
        assert_eq!(rows[0]["license"], "MIT");
        assert_eq!(rows[0]["homepage"], "UNKNOWN");
        assert_eq!(rows[3]["license"], "unknown");
    }

    #[test]
    fn test_empty_when_nothing_missing() {
        let clean = node("app", "1.0.0", mit(), vec![]);
        assert_eq!(render_lines(&clean, &options(Mode::Flat, "name", true)), "");
        assert_eq!(render_json(&clean, &options(Mode::Json, "name", true)).unwrap(), "[]");
    }
}
