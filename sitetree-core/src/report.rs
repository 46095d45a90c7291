// Output rendering for crawled graphs

use crate::breadcrumb::Breadcrumbs;
use crate::error::Result;
use crate::graph::Graph;
use crate::{build_tree_graph, build_treemap};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Treemap,
    TreeGraph,
    Csv,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "treemap" => Some(ReportFormat::Treemap),
            "treegraph" => Some(ReportFormat::TreeGraph),
            "csv" => Some(ReportFormat::Csv),
            _ => None,
        }
    }
}

pub const CSV_HEADER: [&str; 4] = ["Page ID", "Full Name", "Label", "URL"];

/// Render `graph` in the requested format.
pub fn generate_report(graph: &mut Graph, format: ReportFormat, max_depth: usize) -> Result<String> {
    let report = match format {
        ReportFormat::Treemap => serde_json::to_string_pretty(&build_treemap(graph, max_depth)?)?,
        ReportFormat::TreeGraph => serde_json::to_string_pretty(&build_tree_graph(graph, max_depth)?)?,
        ReportFormat::Csv => generate_csv_report(graph, &Breadcrumbs::treemap()),
    };
    Ok(report)
}

/// One CSV row per page, in breadcrumb order, root excluded.
pub fn generate_csv_report(graph: &mut Graph, breadcrumbs: &Breadcrumbs) -> String {
    let visited = breadcrumbs.resolve(graph);

    let mut csv = String::new();
    push_csv_row(&mut csv, &CSV_HEADER);

    for id in visited {
        let record = &graph.node(id).record;
        push_csv_row(
            &mut csv,
            &[
                record.id.as_str(),
                record.full_name().unwrap_or_default(),
                record.label.as_str(),
                record.url.as_str(),
            ],
        );
    }

    csv
}

fn push_csv_row(csv: &mut String, fields: &[&str]) {
    let row: Vec<String> = fields.iter().map(|field| escape_csv_field(field)).collect();
    csv.push_str(&row.join(","));
    csv.push('\n');
}

/// Quote a field when it holds a delimiter, quote or line break.
pub fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn save_report(content: &str, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
