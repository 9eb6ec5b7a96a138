use crate::error::{Error, Result};
use crate::models::{DependencySpec, OutputFormat, ProjectConfig};
use serde::{Serialize, Serializer};

/// Serialized shape of the dependency listing
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct DependencyListing {
    pub dependencies: Vec<String>,

    /// Groups in manifest order, serialized as a map
    #[serde(serialize_with = "ordered_map")]
    pub optional_dependencies: Vec<(String, Vec<String>)>,
}

fn ordered_map<S: Serializer>(
    groups: &[(String, Vec<String>)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(groups.iter().map(|(name, deps)| (name, deps)))
}

impl DependencyListing {
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            dependencies: config
                .dependencies
                .iter()
                .map(DependencySpec::to_requirement_string)
                .collect(),
            optional_dependencies: config
                .optional_dependencies
                .iter()
                .map(|group| {
                    (
                        group.name.clone(),
                        group
                            .dependencies
                            .iter()
                            .map(DependencySpec::to_requirement_string)
                            .collect(),
                    )
                })
                .collect(),
        }
    }
}

/// Renders the dependencies of a manifest in the requested format
pub fn render_dependencies(config: &ProjectConfig, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_tables(config)),
        OutputFormat::Json => serde_json::to_string_pretty(&DependencyListing::from_config(config))
            .map_err(|e| Error::Serialization(e.to_string())),
        OutputFormat::Yaml => serde_yml::to_string(&DependencyListing::from_config(config))
            .map_err(|e| Error::Serialization(e.to_string())),
    }
}

const HEADERS: [&str; 4] = ["Package", "Version", "Extras", "Markers"];

fn render_tables(config: &ProjectConfig) -> String {
    let mut sections = Vec::new();

    if !config.dependencies.is_empty() {
        sections.push(render_table("Main Dependencies", &config.dependencies));
    }

    for group in &config.optional_dependencies {
        if !group.dependencies.is_empty() {
            let title = format!("{} Dependencies", title_case(&group.name));
            sections.push(render_table(&title, &group.dependencies));
        }
    }

    if sections.is_empty() {
        return "No dependencies found\n".to_string();
    }

    sections.join("\n")
}

fn render_table(title: &str, dependencies: &[DependencySpec]) -> String {
    let rows: Vec<[String; 4]> = dependencies.iter().map(table_row).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = format!("{}\n", title);
    out.push_str(&format_row(&HEADERS.map(str::to_string), &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("{}\n", rule.join("  ")));
    for row in &rows {
        out.push_str(&format_row(row, &widths));
    }
    out
}

fn table_row(dep: &DependencySpec) -> [String; 4] {
    let version = if let Some(url) = &dep.url {
        format!("@ {}", url)
    } else if let Some(path) = &dep.path {
        format!("@ {}", path)
    } else if dep.version_specs.is_empty() {
        "latest".to_string()
    } else {
        dep.version_specs.join(", ")
    };

    [
        dep.name.clone(),
        version,
        dep.extras.join(", "),
        dep.markers.clone().unwrap_or_default(),
    ]
}

fn format_row(cells: &[String; 4], widths: &[usize; 4]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    format!("{}\n", padded.join("  ").trim_end())
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
