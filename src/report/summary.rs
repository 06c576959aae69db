use std::collections::HashMap;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use super::fields::Style;
use super::flat;
use crate::models::{License, PackageNode};

/// License totals over distinct `name@version` packages, most common first.
pub fn tally(root: &PackageNode) -> Vec<(License, usize)> {
    let mut counts: HashMap<&License, usize> = HashMap::new();
    for node in flat::collect(root, false).values() {
        *counts.entry(&node.license).or_default() += 1;
    }

    let mut rows: Vec<(License, usize)> = counts
        .into_iter()
        .map(|(license, count)| (license.clone(), count))
        .collect();
    rows.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| a.0.to_string().cmp(&b.0.to_string()))
    });
    rows
}

/// The tally as a table for stderr. Styling follows `style.color` alone; the
/// caller decides it from the stream the table is written to.
pub fn render(root: &PackageNode, style: &Style) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Packages").add_attribute(Attribute::Bold),
        ]);
    if style.color {
        table.enforce_styling();
    } else {
        table.force_no_tty();
    }

    for (license, count) in tally(root) {
        let color = match license {
            License::Named(_) => Color::Green,
            License::NoMatch => Color::Yellow,
            License::Unknown => Color::Red,
        };
        table.add_row(vec![
            Cell::new(license.to_string()).fg(color),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}
