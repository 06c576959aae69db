use super::{describe, RenderOptions};
use crate::models::PackageNode;

struct Item {
    label: String,
    children: Vec<Item>,
}

/// Nested view drawn with `├─`, `└─` and `│` connectors.
///
/// With `missing_only`, a subtree is dropped when neither its root nor any
/// direct dependency of it is missing a license.
pub fn render(root: &PackageNode, options: &RenderOptions) -> String {
    let mut lines = Vec::new();
    if let Some(item) = build(root, options) {
        draw(&item, "", true, &mut lines);
    }
    lines.join("\n")
}

fn build(node: &PackageNode, options: &RenderOptions) -> Option<Item> {
    if options.missing_only && !node.is_missing() && !node.deps.iter().any(PackageNode::is_missing) {
        return None;
    }
    Some(Item {
        label: describe(node, options),
        children: node.deps.iter().filter_map(|d| build(d, options)).collect(),
    })
}

fn draw(item: &Item, prefix: &str, last: bool, lines: &mut Vec<String>) {
    let connector = if last { "└─ " } else { "├─ " };
    lines.push(format!("{}{}{}", prefix, connector, item.label));

    let child_prefix = format!("{}{}", prefix, if last { "   " } else { "│  " });
    let count = item.children.len();
    for (i, child) in item.children.iter().enumerate() {
        draw(child, &child_prefix, i + 1 == count, lines);
    }
}
